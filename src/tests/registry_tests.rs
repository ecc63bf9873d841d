//! 组件注册表单元测试

use crate::component::{Component, Placeholder};
use crate::error::Error;
use crate::registry::{normalize_name, raw_type_name, Registry};
use serde::{Deserialize, Serialize};

#[derive(Default, Serialize, Deserialize)]
struct FooBar {
    _placeholder: Placeholder,
}

impl Component for FooBar {
    fn render(&self) -> String {
        "<p>foo</p>".to_string()
    }
}

#[derive(Default, Serialize, Deserialize)]
struct Other {
    label: String,
}

impl Component for Other {
    fn render(&self) -> String {
        "<p>{{label}}</p>".to_string()
    }
}

#[test]
fn test_normalize_name() {
    assert_eq!(normalize_name("main.FooBar"), "foobar");
    assert_eq!(normalize_name("lib.FooBar"), "lib.foobar");
    assert_eq!(normalize_name("FooBar"), "foobar");
    assert_eq!(normalize_name("MAIN.Hello"), "hello");
}

#[test]
fn test_normalize_name_custom_namespace() {
    let registry = Registry::with_default_namespace("App");
    assert_eq!(registry.normalize_name("app.Card"), "card");
    assert_eq!(registry.normalize_name("main.Card"), "main.card");
}

#[test]
fn test_raw_type_name() {
    assert_eq!(raw_type_name::<FooBar>(), "registry_tests.FooBar");
    assert_eq!(raw_type_name::<Vec<u8>>(), "vec.Vec");
}

#[test]
fn test_register_and_build() {
    let mut registry = Registry::new();
    assert!(registry.is_empty());
    assert!(!registry.register::<FooBar>());
    assert!(registry.contains("registry_tests.foobar"));

    let c = registry.build("registry_tests.foobar").unwrap();
    assert!(c.borrow().type_name().ends_with("FooBar"));
    assert_eq!(c.borrow().render_template(), "<p>foo</p>");
}

#[test]
fn test_build_returns_fresh_instances() {
    let mut registry = Registry::new();
    registry.register_as::<Other>("main.Other");
    let a = registry.build("other").unwrap();
    let b = registry.build("other").unwrap();
    assert!(!std::rc::Rc::ptr_eq(&a, &b));
}

#[test]
fn test_register_override() {
    let mut registry = Registry::new();
    assert!(!registry.register_as::<FooBar>("main.Widget"));
    assert!(registry.register_as::<Other>("Widget"));
    assert_eq!(registry.len(), 1);

    let c = registry.build("widget").unwrap();
    assert!(c.borrow().type_name().ends_with("Other"));
}

#[test]
fn test_build_not_registered() {
    let registry = Registry::new();
    match registry.build("nope") {
        Err(Error::NotRegistered { name }) => assert_eq!(name, "nope"),
        Err(other) => panic!("expected not registered, got {:?}", other),
        Ok(_) => panic!("expected not registered"),
    }
}

#[test]
fn test_names_sorted() {
    let mut registry = Registry::new();
    registry.register_as::<Other>("lib.Zed");
    registry.register_as::<FooBar>("Alpha");
    assert_eq!(registry.names(), vec!["alpha", "lib.zed"]);
}
