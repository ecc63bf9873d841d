//! 标记解码器与模板引擎

pub mod decoder;
pub mod template;
pub mod tokenizer;

pub use decoder::{decode, decode_reader, TagDecoder, DEFAULT_MAX_ELEMENT_DEPTH};
pub use template::{Helper, Helpers, TemplateEngine, TemplateError};
pub use tokenizer::{Token, Tokenizer};
