//! 标签树节点
//!
//! 节点分三类：空节点、文本节点、元素/组件引用。
//! 名字不在 HTML5 标准元素表里的节点视为组件引用。

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

/// 属性表，保持解析顺序
pub type AttrMap = IndexMap<String, String>;

/// 节点分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Empty,
    Text,
    Element,
    Component,
}

/// 标签节点
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tag {
    pub id: Uuid,
    pub compo_id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub attrs: AttrMap,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Tag>,
}

impl Tag {
    pub fn new_element(name: &str) -> Self {
        Self {
            name: name.to_lowercase(),
            ..Default::default()
        }
    }

    pub fn new_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Default::default()
        }
    }

    /// 名字和文本都为空
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.text.is_empty()
    }

    pub fn is_text(&self) -> bool {
        self.name.is_empty() && !self.text.is_empty()
    }

    /// 非标准 HTML5 标签名即组件引用
    pub fn is_component(&self) -> bool {
        !self.name.is_empty() && !is_standard_element(&self.name)
    }

    /// 见 https://html.spec.whatwg.org/#void-elements
    pub fn is_void_elem(&self) -> bool {
        VOID_ELEMENTS.contains(self.name.as_str())
    }

    pub fn kind(&self) -> TagKind {
        if self.is_empty() {
            TagKind::Empty
        } else if self.is_text() {
            TagKind::Text
        } else if self.is_component() {
            TagKind::Component
        } else {
            TagKind::Element
        }
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(|s| s.as_str())
    }

    /// 先序遍历
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a Tag)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }
}

pub fn is_standard_element(name: &str) -> bool {
    STANDARD_ELEMENTS.contains(name)
}

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(name)
}

static VOID_ELEMENTS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta",
        "param", "source", "track", "wbr",
    ]
    .into_iter()
    .collect()
});

static STANDARD_ELEMENTS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // 文档结构
        "html", "head", "body", "title", "base", "link", "meta", "style", "script", "noscript",
        "template", "slot",
        // 分区
        "article", "aside", "footer", "header", "hgroup", "main", "nav", "section", "address",
        "h1", "h2", "h3", "h4", "h5", "h6",
        // 分组
        "blockquote", "dd", "div", "dl", "dt", "figcaption", "figure", "hr", "li", "menu", "ol",
        "p", "pre", "ul", "search",
        // 文本语义
        "a", "abbr", "b", "bdi", "bdo", "br", "cite", "code", "data", "dfn", "em", "i", "kbd",
        "mark", "q", "rp", "rt", "ruby", "s", "samp", "small", "span", "strong", "sub", "sup",
        "time", "u", "var", "wbr", "del", "ins",
        // 嵌入内容
        "area", "audio", "canvas", "embed", "iframe", "img", "map", "math", "object", "param",
        "picture", "portal", "source", "svg", "track", "video",
        // 表格
        "caption", "col", "colgroup", "table", "tbody", "td", "tfoot", "th", "thead", "tr",
        // 表单
        "button", "datalist", "fieldset", "form", "input", "keygen", "label", "legend", "meter",
        "optgroup", "option", "output", "progress", "select", "textarea",
        // 交互
        "details", "dialog", "summary",
        // 已废弃但仍被解析器识别
        "acronym", "applet", "basefont", "big", "blink", "center", "dir", "font", "frame",
        "frameset", "image", "isindex", "listing", "marquee", "menuitem", "nobr", "noembed",
        "noframes", "plaintext", "rb", "rtc", "spacer", "strike", "tt", "xmp",
    ]
    .into_iter()
    .collect()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(Tag::default().kind(), TagKind::Empty);
        assert_eq!(Tag::new_text("hello").kind(), TagKind::Text);
        assert_eq!(Tag::new_element("div").kind(), TagKind::Element);
        assert_eq!(Tag::new_element("main.hello").kind(), TagKind::Component);
        assert_eq!(Tag::new_element("MyCard").kind(), TagKind::Component);
    }

    #[test]
    fn test_void_elements() {
        assert!(Tag::new_element("br").is_void_elem());
        assert!(Tag::new_element("input").is_void_elem());
        assert!(!Tag::new_element("div").is_void_elem());
        assert!(!Tag::new_element("hello").is_void_elem());
    }

    #[test]
    fn test_empty_is_neither_text_nor_component() {
        let tag = Tag::default();
        assert!(tag.is_empty());
        assert!(!tag.is_text());
        assert!(!tag.is_component());
    }

    #[test]
    fn test_walk_is_preorder() {
        let mut root = Tag::new_element("div");
        let mut h1 = Tag::new_element("h1");
        h1.children.push(Tag::new_text("title"));
        root.children.push(h1);
        root.children.push(Tag::new_element("p"));

        let mut names = Vec::new();
        root.walk(&mut |t| names.push(if t.is_text() { t.text.clone() } else { t.name.clone() }));
        assert_eq!(names, vec!["div", "h1", "title", "p"]);
    }
}
