//! Mini Markup - HTML5 组件挂载引擎
//!
//! 组件的 `render` 返回 HTML5 模板，模板执行后解码成标签树；
//! 非标准标签名视为对其它已注册组件的引用，递归创建、挂载后拼接成一棵树，
//! 最终序列化回 HTML 并把事件桥接给宿主。

mod binder;
mod component;
mod config;
mod env;
mod error;
mod registry;
mod tag;

pub use binder::bind;
pub use component::{ensure_valid, shared, Component, ComponentRef, DynComponent, Placeholder};
pub use config::{EnvConfig, RenderConfig};
pub use env::Environment;
pub use error::{Error, Result};
pub use registry::{normalize_name, raw_type_name, Registry, COMPONENTS, DEFAULT_NAMESPACE};
pub use tag::{is_standard_element, is_void_element, AttrMap, Tag, TagKind};

// 事件桥接
pub mod event;

// 解码器与模板引擎
pub mod parser;

// HTML 渲染器
pub mod renderer;

pub use event::HandlerCall;
pub use parser::{decode, decode_reader, TagDecoder};
pub use renderer::render;

// 单元测试
#[cfg(test)]
mod tests;
