//! HTML 渲染器

pub mod html_renderer;

pub use html_renderer::{render, EventBinding, TagRenderer};
