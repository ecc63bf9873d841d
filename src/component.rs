//! 组件基础定义
//!
//! 组件实现 [`Component`]，并通过 serde 暴露字段：模板执行时读取字段，
//! 属性绑定时写回字段。环境内部只经由 [`ComponentRef`] 持有组件。

use crate::binder;
use crate::error::{Error, Result};
use crate::event::HandlerCall;
use crate::parser::template::Helpers;
use crate::tag::AttrMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::cell::RefCell;
use std::rc::Rc;

/// 组件
pub trait Component: 'static {
    /// 返回 HTML5 模板，模板数据为组件自身的字段
    fn render(&self) -> String;

    /// 组件自带的模板助手，`json` 和 `time` 不能被覆盖
    fn helpers(&self) -> Helpers {
        Helpers::new()
    }

    /// 处理宿主回传的事件，未处理返回 false
    fn on_event(&mut self, handler: &str, call: &HandlerCall) -> bool {
        let _ = (handler, call);
        false
    }
}

/// 环境使用的对象安全接口，所有可序列化的组件自动实现
pub trait DynComponent {
    fn render_template(&self) -> String;
    fn template_helpers(&self) -> Helpers;
    fn type_name(&self) -> &'static str;
    /// 字段序列化结果
    fn fields(&self) -> Result<JsonValue>;
    fn bind_attrs(&mut self, attrs: &AttrMap) -> Result<()>;
    fn handle_event(&mut self, handler: &str, call: &HandlerCall) -> bool;
}

impl<T> DynComponent for T
where
    T: Component + Serialize + DeserializeOwned,
{
    fn render_template(&self) -> String {
        Component::render(self)
    }

    fn template_helpers(&self) -> Helpers {
        Component::helpers(self)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn fields(&self) -> Result<JsonValue> {
        Ok(serde_json::to_value(self)?)
    }

    fn bind_attrs(&mut self, attrs: &AttrMap) -> Result<()> {
        binder::bind(self, attrs)
    }

    fn handle_event(&mut self, handler: &str, call: &HandlerCall) -> bool {
        Component::on_event(self, handler, call)
    }
}

/// 共享的组件句柄，分配地址即组件身份
pub type ComponentRef = Rc<RefCell<dyn DynComponent>>;

/// 包装成可挂载的句柄
pub fn shared<C>(c: C) -> Rc<RefCell<C>>
where
    C: Component + Serialize + DeserializeOwned,
{
    Rc::new(RefCell::new(c))
}

/// 组件身份
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct InstanceKey(usize);

impl InstanceKey {
    pub(crate) fn of(c: &ComponentRef) -> Self {
        Self(Rc::as_ptr(c) as *const () as usize)
    }
}

/// 无字段组件的占位字段
///
/// ```ignore
/// #[derive(Default, Serialize, Deserialize)]
/// struct Hello {
///     _placeholder: Placeholder,
/// }
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placeholder;

/// 组件必须序列化为非空对象
pub fn ensure_valid(c: &dyn DynComponent) -> Result<()> {
    let invalid = |reason: String| Error::InvalidComponent {
        type_name: c.type_name().to_string(),
        reason,
    };

    match c.fields() {
        Ok(JsonValue::Object(map)) if !map.is_empty() => Ok(()),
        Ok(JsonValue::Object(_)) => Err(invalid(
            "struct has no field, add a Placeholder field".to_string(),
        )),
        Ok(other) => Err(invalid(format!("{} is not a struct", kind_name(&other)))),
        Err(e) => Err(invalid(e.to_string())),
    }
}

fn kind_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "sequence",
        JsonValue::Object(_) => "struct",
    }
}
