//! 渲染器单元测试
//! 测试 HTML 输出、节点 ID 和事件桥接

use crate::component::{shared, Component, ComponentRef, Placeholder};
use crate::config::RenderConfig;
use crate::env::Environment;
use crate::error::Error;
use crate::parser::decoder::decode;
use crate::registry::Registry;
use crate::renderer::{render, TagRenderer};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Default, Serialize, Deserialize)]
struct Page {
    _placeholder: Placeholder,
}

impl Component for Page {
    fn render(&self) -> String {
        r#"
<div class="page">
    <h1>Title</h1>
    <renderer_tests.item>
</div>
        "#
        .to_string()
    }
}

#[derive(Default, Serialize, Deserialize)]
struct Item {
    _placeholder: Placeholder,
}

impl Component for Item {
    fn render(&self) -> String {
        "<p>Item</p>".to_string()
    }
}

#[derive(Default, Serialize, Deserialize)]
struct Form {
    text: String,
}

impl Component for Form {
    fn render(&self) -> String {
        r#"
<form onsubmit="Submit">
    <input type="text" required oninput="Change">
    <span title="say &quot;hi&quot;">{{text}}</span>
    <script>if (a < b && c) { go(); }</script>
</form>
        "#
        .to_string()
    }
}

fn new_env() -> Environment {
    let mut registry = Registry::new();
    registry.register::<Page>();
    registry.register::<Item>();
    Environment::new(registry)
}

/// 统计 HTML 中出现的开始标签数
fn count_elements(html: &str) -> usize {
    html.match_indices('<')
        .filter(|(i, _)| {
            html[i + 1..]
                .chars()
                .next()
                .map_or(false, |c| c.is_ascii_alphabetic())
        })
        .count()
}

#[test]
fn test_render_without_env() {
    let tag = decode("<div></div>").unwrap();
    assert!(matches!(render(&tag, None), Err(Error::MissingEnvironment)));
    assert!(matches!(tag.html(None), Err(Error::MissingEnvironment)));
}

#[test]
fn test_render_nested_component() {
    let mut env = new_env();
    let page: ComponentRef = shared(Page::default());
    let root = env.mount(page.clone()).unwrap();

    let item = env.component(root.children[1].id).unwrap();
    let item_root = env.root(&item).unwrap().clone();

    let expected = format!(
        r#"<div class="page" data-mini-id="{}">
  <h1 data-mini-id="{}">
    Title
  </h1>
  <p data-mini-id="{}">
    Item
  </p>
</div>"#,
        root.id, root.children[0].id, item_root.id
    );
    assert_eq!(env.html(&page).unwrap(), expected);
    assert_eq!(root.html(Some(&env)).unwrap(), expected);
}

#[test]
fn test_render_every_element_has_one_id() {
    let mut env = new_env();
    let page: ComponentRef = shared(Page::default());
    env.mount(page.clone()).unwrap();

    let html = env.html(&page).unwrap();
    assert_eq!(html.matches("data-mini-id=").count(), count_elements(&html));
    assert_eq!(count_elements(&html), 3);
}

#[test]
fn test_render_attributes_and_events() {
    let mut env = new_env();
    let form: ComponentRef = shared(Form {
        text: "a < b".to_string(),
    });
    let root = env.mount(form.clone()).unwrap();
    let html = env.html(&form).unwrap();

    let compo_id = root.compo_id;
    assert!(html.contains(&format!(
        r#"<form onsubmit="CallHostHandler('{}', 'Submit', this, event)" data-mini-id="{}">"#,
        compo_id, root.id
    )));
    assert!(html.contains(&format!(
        r#"<input type="text" required oninput="CallHostHandler('{}', 'Change', this, event)" data-mini-id="{}">"#,
        compo_id, root.children[0].id
    )));
    assert!(!html.contains("</input>"));
    assert!(html.contains(r#"title="say &quot;hi&quot;""#));
    assert!(html.contains("a &lt; b"));
    assert!(html.contains("if (a < b && c) { go(); }"));
}

#[test]
fn test_render_collects_event_bindings() {
    let mut env = new_env();
    let form: ComponentRef = shared(Form::default());
    let root = env.mount(form).unwrap();

    let mut renderer = TagRenderer::new(&env);
    renderer.render(&root).unwrap();
    let bindings = renderer.event_bindings();

    assert_eq!(bindings.len(), 2);
    assert_eq!(bindings[0].event_type, "submit");
    assert_eq!(bindings[0].handler, "Submit");
    assert_eq!(bindings[0].tag_id, root.id);
    assert_eq!(bindings[1].event_type, "input");
    assert_eq!(bindings[1].tag_id, root.children[0].id);
    assert!(bindings.iter().all(|b| b.compo_id == root.compo_id));
}

#[test]
fn test_render_with_config() {
    let mut env = new_env();
    let root = env.mount(shared(Item::default())).unwrap();

    let config = RenderConfig {
        id_attr: "data-go-id".to_string(),
        bridge_fn: "Bridge".to_string(),
        indent: "\t".to_string(),
    };
    let html = TagRenderer::with_config(&env, config).render(&root).unwrap();
    assert_eq!(html, format!("<p data-go-id=\"{}\">\n\tItem\n</p>", root.id));
}

#[test]
fn test_render_unresolved_component() {
    let env = new_env();
    let tag = decode("<div><renderer_tests.item></div>").unwrap();
    match render(&tag, Some(&env)) {
        Err(Error::UnresolvedComponent { name, .. }) => assert_eq!(name, "renderer_tests.item"),
        other => panic!("expected unresolved component, got {:?}", other),
    }
}

#[test]
fn test_render_after_dismount() {
    let mut env = new_env();
    let page: ComponentRef = shared(Page::default());
    let root = env.mount(page.clone()).unwrap();
    env.dismount(&page);

    assert!(matches!(env.html(&page), Err(Error::Unmounted { .. })));
    assert!(matches!(
        root.html(Some(&env)),
        Err(Error::UnresolvedComponent { .. })
    ));
}

#[test]
fn test_render_overrides_template_id_attr() {
    #[derive(Default, Serialize, Deserialize)]
    struct Tagged {
        _placeholder: Placeholder,
    }

    impl Component for Tagged {
        fn render(&self) -> String {
            r#"<div data-mini-id="x" class="box"><span data-mini-id="y">hi</span></div>"#.to_string()
        }
    }

    let mut env = new_env();
    let tagged: ComponentRef = shared(Tagged::default());
    let root = env.mount(tagged.clone()).unwrap();
    let html = env.html(&tagged).unwrap();

    assert_eq!(html.matches("data-mini-id=").count(), 2);
    assert!(!html.contains(r#"data-mini-id="x""#));
    assert!(!html.contains(r#"data-mini-id="y""#));
    assert!(html.starts_with(&format!(
        r#"<div class="box" data-mini-id="{}">"#,
        root.id
    )));
    assert!(html.contains(&format!(r#"<span data-mini-id="{}">"#, root.children[0].id)));
}

#[test]
fn test_event_bindings_serialize_for_host() {
    let mut env = new_env();
    let root = env.mount(shared(Form::default())).unwrap();

    let mut renderer = TagRenderer::new(&env);
    renderer.render(&root).unwrap();
    let value = serde_json::to_value(renderer.event_bindings()).unwrap();

    assert_eq!(
        value[0],
        json!({
            "compoId": root.compo_id.to_string(),
            "tagId": root.id.to_string(),
            "eventType": "submit",
            "handler": "Submit",
        })
    );
    assert_eq!(value[1]["eventType"], "input");
}

#[test]
fn test_event_bindings_reset_between_renders() {
    let mut env = new_env();
    let form = env.mount(shared(Form::default())).unwrap();
    let item = env.mount(shared(Item::default())).unwrap();

    let mut renderer = TagRenderer::new(&env);
    renderer.render(&form).unwrap();
    assert_eq!(renderer.event_bindings().len(), 2);
    renderer.render(&item).unwrap();
    assert!(renderer.event_bindings().is_empty());
}
