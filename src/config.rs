//! 环境配置

use crate::error::Result;
use crate::registry::Registry;
use serde::Deserialize;

/// 环境配置，所有字段都有默认值
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvConfig {
    /// 每个输出元素上携带节点 ID 的属性名
    #[serde(default = "default_id_attr")]
    pub id_attr: String,
    /// `on*` 属性改写后调用的宿主函数
    #[serde(default = "default_bridge_fn")]
    pub bridge_fn: String,
    #[serde(default = "default_indent")]
    pub indent: String,
    /// 该命名空间下的组件按裸名注册
    #[serde(default = "default_namespace")]
    pub default_namespace: String,
    /// 组件最大嵌套层数
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// 单个模板内元素最大嵌套层数
    #[serde(default = "default_max_element_depth")]
    pub max_element_depth: usize,
}

fn default_id_attr() -> String { "data-mini-id".to_string() }
fn default_bridge_fn() -> String { "CallHostHandler".to_string() }
fn default_indent() -> String { "  ".to_string() }
fn default_namespace() -> String { crate::registry::DEFAULT_NAMESPACE.to_string() }
fn default_max_depth() -> usize { 64 }
fn default_max_element_depth() -> usize { crate::parser::DEFAULT_MAX_ELEMENT_DEPTH }

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            id_attr: default_id_attr(),
            bridge_fn: default_bridge_fn(),
            indent: default_indent(),
            default_namespace: default_namespace(),
            max_depth: default_max_depth(),
            max_element_depth: default_max_element_depth(),
        }
    }
}

impl EnvConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 按配置的默认命名空间创建空注册表
    pub fn registry(&self) -> Registry {
        Registry::with_default_namespace(&self.default_namespace)
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            id_attr: self.id_attr.clone(),
            bridge_fn: self.bridge_fn.clone(),
            indent: self.indent.clone(),
        }
    }
}

/// 渲染器用到的配置
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub id_attr: String,
    pub bridge_fn: String,
    pub indent: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        EnvConfig::default().render_config()
    }
}
