//! 事件桥接 - 宿主回传的事件处理调用
//!
//! 渲染时 `on*` 属性被改写成 `CallHostHandler('<组件 ID>', '<处理函数>', this, event)`，
//! 宿主侧把这次调用序列化成 [`HandlerCall`] 交回环境分发。

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// 一次事件处理调用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerCall {
    /// 属性所属组件的 ID
    pub component: Uuid,
    /// 属性值，即处理函数名
    pub handler: String,
    /// 触发事件的元素
    #[serde(default)]
    pub target: JsonValue,
    /// 事件对象
    #[serde(default)]
    pub event: JsonValue,
}

impl HandlerCall {
    pub fn new(component: Uuid, handler: &str) -> Self {
        Self {
            component,
            handler: handler.to_string(),
            target: JsonValue::Null,
            event: JsonValue::Null,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 事件对象中的字段
    pub fn event_field(&self, name: &str) -> Option<&JsonValue> {
        self.event.get(name)
    }

    /// 目标元素上的 value，输入类事件常用
    pub fn target_value(&self) -> Option<&str> {
        self.target.get("value").and_then(JsonValue::as_str)
    }
}
