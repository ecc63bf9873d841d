//! 标签解码器 - 把标记文本递归下降解析成 Tag 树

use super::tokenizer::{Token, Tokenizer};
use crate::error::{Error, Result};
use crate::tag::{is_standard_element, is_void_element, Tag};
use log::trace;
use std::io::Read;

/// 默认的元素最大嵌套层数
pub const DEFAULT_MAX_ELEMENT_DEPTH: usize = 512;

/// 解码器
///
/// 每层元素嵌套对应一层递归，超过 `max_depth` 报 [`Error::TooDeep`]。
pub struct TagDecoder {
    tokenizer: Tokenizer,
    max_depth: usize,
}

impl TagDecoder {
    pub fn new(input: &str) -> Self {
        Self {
            tokenizer: Tokenizer::new(input),
            max_depth: DEFAULT_MAX_ELEMENT_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// 解码出第一个根节点
    ///
    /// 输入结束时仍未闭合的标签视为全部闭合；自闭合标签一律报错。
    pub fn decode(&mut self) -> Result<Tag> {
        let mut root = Tag::default();
        self.decode_node(&mut root, 0)?;

        if root.is_empty() {
            return Err(Error::EmptyDocument);
        }
        Ok(root)
    }

    /// 解码一个节点，返回输入是否还有剩余
    ///
    /// 结束标签会留下一个空节点，作为父节点的闭合信号。
    fn decode_node(&mut self, t: &mut Tag, depth: usize) -> Result<bool> {
        loop {
            match self.tokenizer.next_token() {
                None => return Ok(false),
                Some(Token::StartTag { name, attrs }) => return self.decode_tag(t, name, attrs, depth),
                Some(Token::Text(text)) => {
                    let text = text.trim();
                    if text.is_empty() {
                        continue;
                    }
                    t.text = text.to_string();
                    return Ok(true);
                }
                Some(Token::SelfClosingTag { name, .. }) => return Err(Error::Syntax { tag: name }),
                Some(Token::EndTag { name }) => {
                    // 空元素和组件引用没有开启作用域，它们的结束标签不闭合任何节点
                    if is_void_element(&name) || !is_standard_element(&name) {
                        continue;
                    }
                    return Ok(true);
                }
                Some(Token::Comment(_)) | Some(Token::Doctype(_)) => continue,
            }
        }
    }

    fn decode_tag(
        &mut self,
        t: &mut Tag,
        name: String,
        attrs: Vec<(String, String)>,
        depth: usize,
    ) -> Result<bool> {
        if depth > self.max_depth {
            return Err(Error::TooDeep {
                name,
                max_depth: self.max_depth,
            });
        }
        t.name = name;
        t.attrs = attrs.into_iter().collect();
        trace!("decoded <{}> with {} attributes", t.name, t.attrs.len());

        if t.is_component() || t.is_void_elem() {
            return Ok(true);
        }

        loop {
            let mut child = Tag::default();
            let more = self.decode_node(&mut child, depth + 1)?;
            if child.is_empty() {
                return Ok(more);
            }
            t.children.push(child);
            if !more {
                return Ok(false);
            }
        }
    }
}

/// 解码一段标记文本
pub fn decode(input: &str) -> Result<Tag> {
    TagDecoder::new(input).decode()
}

/// 从字节流解码
pub fn decode_reader<R: Read>(mut reader: R) -> Result<Tag> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;
    decode(&input)
}
