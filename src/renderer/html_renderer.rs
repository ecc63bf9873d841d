//! HTML 渲染器 - 把挂载后的标签树序列化成 HTML
//!
//! 组件引用节点被替换成该组件的根节点，嵌套组件被展开成一份文档。
//! `on*` 属性改写成宿主可调用的桥接表达式，每个元素带上自身 ID。

use crate::config::RenderConfig;
use crate::env::Environment;
use crate::error::{Error, Result};
use crate::tag::Tag;
use serde::Serialize;
use uuid::Uuid;

/// 事件属性前缀
const EVENT_PREFIX: &str = "on";

/// 内容不转义的元素
const RAW_TEXT_PARENTS: [&str; 2] = ["script", "style"];

/// 渲染时收集到的事件绑定，宿主据此在对应元素上注册监听
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBinding {
    pub compo_id: Uuid,
    pub tag_id: Uuid,
    pub event_type: String,
    pub handler: String,
}

pub struct TagRenderer<'a> {
    env: &'a Environment,
    config: RenderConfig,
    event_bindings: Vec<EventBinding>,
}

impl<'a> TagRenderer<'a> {
    pub fn new(env: &'a Environment) -> Self {
        Self {
            env,
            config: env.config().render_config(),
            event_bindings: Vec::new(),
        }
    }

    pub fn with_config(env: &'a Environment, config: RenderConfig) -> Self {
        Self {
            env,
            config,
            event_bindings: Vec::new(),
        }
    }

    /// 渲染标签树
    pub fn render(&mut self, tag: &Tag) -> Result<String> {
        self.event_bindings.clear();
        let mut out = String::new();
        self.print(tag, &mut out, 0, false)?;
        Ok(out)
    }

    /// 上次渲染收集到的事件绑定
    pub fn event_bindings(&self) -> &[EventBinding] {
        &self.event_bindings
    }

    fn print(&mut self, t: &Tag, out: &mut String, indent: usize, raw_text: bool) -> Result<()> {
        if t.is_text() {
            self.print_indent(out, indent);
            if raw_text {
                out.push_str(&t.text);
            } else {
                out.push_str(&escape_text(&t.text));
            }
            return Ok(());
        }

        if t.is_component() {
            return self.print_component(t, out, indent);
        }

        if t.is_empty() {
            return Ok(());
        }

        self.print_indent(out, indent);
        out.push('<');
        out.push_str(&t.name);
        self.print_attributes(t, out);
        out.push('>');

        if t.is_void_elem() {
            return Ok(());
        }

        if t.children.is_empty() {
            self.print_close(t, out);
            return Ok(());
        }

        let raw_children = RAW_TEXT_PARENTS.contains(&t.name.as_str());
        for child in &t.children {
            out.push('\n');
            self.print(child, out, indent + 1, raw_children)?;
        }

        out.push('\n');
        self.print_indent(out, indent);
        self.print_close(t, out);
        Ok(())
    }

    fn print_component(&mut self, t: &Tag, out: &mut String, indent: usize) -> Result<()> {
        let env = self.env;
        let unresolved = |source: Error| Error::UnresolvedComponent {
            name: t.name.clone(),
            source: Box::new(source),
        };

        let c = env.component(t.id).map_err(unresolved)?;
        let root = env
            .root(&c)
            .ok_or_else(|| unresolved(Error::NotMounted { id: t.id }))?;
        self.print(root, out, indent, false)
    }

    fn print_attributes(&mut self, t: &Tag, out: &mut String) {
        for (name, value) in &t.attrs {
            // ID 属性只由渲染器写入
            if *name == self.config.id_attr {
                continue;
            }

            out.push(' ');
            out.push_str(name);

            if value.is_empty() {
                continue;
            }

            if let Some(event_type) = name.strip_prefix(EVENT_PREFIX) {
                out.push_str("=\"");
                out.push_str(&self.config.bridge_fn);
                out.push_str("('");
                out.push_str(&t.compo_id.to_string());
                out.push_str("', '");
                out.push_str(&escape_attr(&escape_js(value)));
                out.push_str("', this, event)\"");

                self.event_bindings.push(EventBinding {
                    compo_id: t.compo_id,
                    tag_id: t.id,
                    event_type: event_type.to_string(),
                    handler: value.clone(),
                });
                continue;
            }

            out.push_str("=\"");
            out.push_str(&escape_attr(value));
            out.push('"');
        }

        out.push(' ');
        out.push_str(&self.config.id_attr);
        out.push_str("=\"");
        out.push_str(&t.id.to_string());
        out.push('"');
    }

    fn print_close(&self, t: &Tag, out: &mut String) {
        out.push_str("</");
        out.push_str(&t.name);
        out.push('>');
    }

    fn print_indent(&self, out: &mut String, indent: usize) {
        for _ in 0..indent {
            out.push_str(&self.config.indent);
        }
    }
}

/// 渲染标签树，必须提供环境
pub fn render(tag: &Tag, env: Option<&Environment>) -> Result<String> {
    let env = env.ok_or(Error::MissingEnvironment)?;
    TagRenderer::new(env).render(tag)
}

impl Tag {
    /// 本节点的 HTML5 表示
    pub fn html(&self, env: Option<&Environment>) -> Result<String> {
        render(self, env)
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "&quot;")
}

fn escape_js(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}
