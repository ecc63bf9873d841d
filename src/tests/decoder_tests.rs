//! 解码器单元测试

use crate::error::Error;
use crate::parser::decoder::{decode, decode_reader, TagDecoder, DEFAULT_MAX_ELEMENT_DEPTH};

#[test]
fn test_decode() {
    let html = r#"
<div>
    <h1>hello</h1>
    <br>
    <input type="text" required>
    <FooComponent Bar="42">
</div>
    "#;

    let root = decode(html).unwrap();
    assert_eq!(root.name, "div");
    assert_eq!(root.children.len(), 4);

    let h1 = &root.children[0];
    assert_eq!(h1.name, "h1");
    assert_eq!(h1.children.len(), 1);
    assert!(h1.children[0].is_text());
    assert_eq!(h1.children[0].text, "hello");

    let br = &root.children[1];
    assert_eq!(br.name, "br");
    assert!(br.is_void_elem());
    assert!(br.children.is_empty());

    let input = &root.children[2];
    assert_eq!(input.name, "input");
    assert!(input.children.is_empty());
    assert_eq!(input.attrs.len(), 2);
    assert_eq!(input.get_attr("type"), Some("text"));
    assert_eq!(input.get_attr("required"), Some(""));

    let foo = &root.children[3];
    assert_eq!(foo.name, "foocomponent");
    assert!(foo.is_component());
    assert_eq!(foo.get_attr("bar"), Some("42"));
}

#[test]
fn test_decode_without_component_has_three_children() {
    let root = decode(r#"<div><h1>hello</h1><br><input type="text" required></div>"#).unwrap();
    assert_eq!(root.children.len(), 3);
}

#[test]
fn test_decode_self_closing_tag_error() {
    let html = r#"
<p>
    <div/>
</p>
"#;
    match decode(html) {
        Err(Error::Syntax { tag }) => assert_eq!(tag, "div"),
        other => panic!("expected syntax error, got {:?}", other),
    }
}

#[test]
fn test_decode_deep_self_closing_tag_aborts() {
    let html = "<div><ul><li><span><input/></span></li></ul></div>";
    assert!(matches!(decode(html), Err(Error::Syntax { .. })));
}

#[test]
fn test_decode_empty_html() {
    assert!(matches!(decode(""), Err(Error::EmptyDocument)));
    assert!(matches!(decode("   \n\t "), Err(Error::EmptyDocument)));
    assert!(matches!(decode("<!-- only a comment -->"), Err(Error::EmptyDocument)));
}

#[test]
fn test_decode_non_closing_html() {
    let root = decode("<body><div>").unwrap();
    assert_eq!(root.name, "body");
    assert_eq!(root.children.len(), 1);
    assert_eq!(root.children[0].name, "div");
}

#[test]
fn test_decode_unclosed_keeps_trailing_text() {
    let root = decode("<p><b>bold").unwrap();
    assert_eq!(root.children[0].name, "b");
    assert_eq!(root.children[0].children[0].text, "bold");
}

#[test]
fn test_decode_text_root() {
    let root = decode("  hello world  ").unwrap();
    assert!(root.is_text());
    assert_eq!(root.text, "hello world");
}

#[test]
fn test_decode_trims_text_and_skips_blank() {
    let root = decode("<p>\n    some text\n    <span>x</span>\n</p>").unwrap();
    assert_eq!(root.children.len(), 2);
    assert_eq!(root.children[0].text, "some text");
    assert_eq!(root.children[1].name, "span");
}

#[test]
fn test_decode_names_are_lowercased() {
    let root = decode(r#"<DIV Class="a" onClick="Toggle"></DIV>"#).unwrap();
    assert_eq!(root.name, "div");
    assert_eq!(root.get_attr("class"), Some("a"));
    assert_eq!(root.get_attr("onclick"), Some("Toggle"));
}

#[test]
fn test_decode_attributes_keep_order() {
    let root = decode(r#"<a href="/x" id="link" title="go"></a>"#).unwrap();
    let keys: Vec<&str> = root.attrs.keys().map(|k| k.as_str()).collect();
    assert_eq!(keys, vec!["href", "id", "title"]);
}

#[test]
fn test_decode_component_end_tag_does_not_close_parent() {
    let root = decode("<div><main.hello></main.hello><p>after</p></div>").unwrap();
    assert_eq!(root.children.len(), 2);
    assert_eq!(root.children[0].name, "main.hello");
    assert_eq!(root.children[1].name, "p");
}

#[test]
fn test_decode_skips_comments_and_doctype() {
    let root = decode("<!DOCTYPE html>\n<html><!-- c --><body></body></html>").unwrap();
    assert_eq!(root.name, "html");
    assert_eq!(root.children.len(), 1);
    assert_eq!(root.children[0].name, "body");
}

#[test]
fn test_decode_entities() {
    let root = decode(r#"<p title="a &quot;b&quot;">x &amp; y</p>"#).unwrap();
    assert_eq!(root.get_attr("title"), Some("a \"b\""));
    assert_eq!(root.children[0].text, "x & y");
}

#[test]
fn test_decode_only_first_root() {
    let root = decode("<h1>a</h1><h2>b</h2>").unwrap();
    assert_eq!(root.name, "h1");
}

#[test]
fn test_decode_reader() {
    let root = decode_reader("<ul><li>1</li><li>2</li></ul>".as_bytes()).unwrap();
    assert_eq!(root.children.len(), 2);
}

#[test]
fn test_decode_element_depth_limit() {
    let html = "<div><ul><li><span><b>deep</b></span></li></ul></div>";
    assert!(TagDecoder::new(html).with_max_depth(4).decode().is_ok());

    match TagDecoder::new(html).with_max_depth(3).decode() {
        Err(Error::TooDeep { name, max_depth }) => {
            assert_eq!(name, "b");
            assert_eq!(max_depth, 3);
        }
        other => panic!("expected too deep, got {:?}", other),
    }
}

#[test]
fn test_decode_deeply_nested_markup_fails_cleanly() {
    let depth = DEFAULT_MAX_ELEMENT_DEPTH + 100;
    let html = format!("{}{}", "<div>".repeat(depth), "</div>".repeat(depth));
    assert!(matches!(decode(&html), Err(Error::TooDeep { .. })));

    let shallow = format!("{}x{}", "<div>".repeat(100), "</div>".repeat(100));
    assert!(decode(&shallow).is_ok());
}
