//! HTML5 词法分析器
//!
//! 把标记文本切成开始标签、结束标签、自闭合标签、文本、注释、DOCTYPE 六类词法单元。

/// 词法单元
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    StartTag { name: String, attrs: Vec<(String, String)> },
    EndTag { name: String },
    SelfClosingTag { name: String, attrs: Vec<(String, String)> },
    Text(String),
    Comment(String),
    Doctype(String),
}

/// 内容按原始文本处理的元素
const RAW_TEXT_ELEMENTS: [&str; 4] = ["script", "style", "textarea", "title"];

/// 原始文本里仍需解码字符引用的元素
const ESCAPABLE_RAW_TEXT_ELEMENTS: [&str; 2] = ["textarea", "title"];

pub struct Tokenizer {
    input: Vec<char>,
    pos: usize,
    raw_text_end: Option<String>,
}

impl Tokenizer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
            raw_text_end: None,
        }
    }

    /// 取下一个词法单元，输入结束返回 None
    pub fn next_token(&mut self) -> Option<Token> {
        if let Some(name) = self.raw_text_end.take() {
            let text = self.read_raw_text(&name);
            if !text.is_empty() {
                if ESCAPABLE_RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                    return Some(Token::Text(unescape(&text)));
                }
                return Some(Token::Text(text));
            }
        }

        if self.is_eof() {
            return None;
        }

        if self.starts_with("<!--") {
            return Some(self.read_comment());
        }
        if self.starts_with("<!") || self.starts_with("<?") {
            return Some(self.read_doctype());
        }
        if self.starts_with("</") && self.peek(2).is_ascii_alphabetic() {
            return Some(self.read_end_tag());
        }
        if self.current_char() == '<' && self.peek(1).is_ascii_alphabetic() {
            return self.read_start_tag();
        }

        Some(self.read_text())
    }

    fn read_start_tag(&mut self) -> Option<Token> {
        self.advance(); // skip '<'
        let name = self.read_tag_name();
        let mut attrs: Vec<(String, String)> = Vec::new();

        loop {
            self.skip_whitespace();
            if self.is_eof() {
                // 标签未闭合就到了输入末尾，按 HTML5 规则丢弃
                return None;
            }
            if self.current_char() == '>' {
                self.advance();
                break;
            }
            if self.starts_with("/>") {
                self.advance();
                self.advance();
                return Some(Token::SelfClosingTag { name, attrs });
            }
            if self.current_char() == '/' {
                self.advance();
                continue;
            }

            let (key, value) = self.read_attribute();
            if !attrs.iter().any(|(k, _)| *k == key) {
                attrs.push((key, value));
            }
        }

        if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            self.raw_text_end = Some(name.clone());
        }
        Some(Token::StartTag { name, attrs })
    }

    fn read_end_tag(&mut self) -> Token {
        self.advance();
        self.advance(); // skip "</"
        let name = self.read_tag_name();
        while !self.is_eof() && self.current_char() != '>' {
            self.advance();
        }
        if !self.is_eof() {
            self.advance();
        }
        Token::EndTag { name }
    }

    fn read_tag_name(&mut self) -> String {
        let mut name = String::new();
        while !self.is_eof() {
            let c = self.current_char();
            if c.is_whitespace() || c == '>' || c == '/' {
                break;
            }
            name.extend(c.to_lowercase());
            self.advance();
        }
        name
    }

    fn read_attribute(&mut self) -> (String, String) {
        let mut name = String::new();
        // 属性名首字符可以是 '='
        name.extend(self.current_char().to_lowercase());
        self.advance();
        while !self.is_eof() {
            let c = self.current_char();
            if c.is_whitespace() || c == '=' || c == '>' || c == '/' {
                break;
            }
            name.extend(c.to_lowercase());
            self.advance();
        }

        self.skip_whitespace();
        if self.current_char() != '=' {
            return (name, String::new());
        }
        self.advance(); // skip '='
        self.skip_whitespace();

        (name, unescape(&self.read_attribute_value()))
    }

    fn read_attribute_value(&mut self) -> String {
        let quote = self.current_char();
        let mut value = String::new();

        if quote != '"' && quote != '\'' {
            // 无引号值
            while !self.is_eof() {
                let c = self.current_char();
                if c.is_whitespace() || c == '>' {
                    break;
                }
                value.push(c);
                self.advance();
            }
            return value;
        }

        self.advance(); // skip opening quote
        while !self.is_eof() && self.current_char() != quote {
            value.push(self.current_char());
            self.advance();
        }
        if !self.is_eof() {
            self.advance(); // skip closing quote
        }
        value
    }

    fn read_text(&mut self) -> Token {
        let mut text = String::new();
        // 第一个字符一定属于文本，可能是落单的 '<'
        text.push(self.current_char());
        self.advance();

        while !self.is_eof() {
            let c = self.current_char();
            if c == '<' && self.begins_markup() {
                break;
            }
            text.push(c);
            self.advance();
        }
        Token::Text(unescape(&text))
    }

    fn read_raw_text(&mut self, name: &str) -> String {
        let end = format!("</{}", name);
        let mut text = String::new();
        while !self.is_eof() && !self.starts_with_ignore_case(&end) {
            text.push(self.current_char());
            self.advance();
        }
        text
    }

    fn read_comment(&mut self) -> Token {
        for _ in 0..4 {
            self.advance();
        }
        let mut text = String::new();
        while !self.is_eof() && !self.starts_with("-->") {
            text.push(self.current_char());
            self.advance();
        }
        for _ in 0..3 {
            if !self.is_eof() {
                self.advance();
            }
        }
        Token::Comment(text)
    }

    fn read_doctype(&mut self) -> Token {
        self.advance();
        self.advance(); // skip "<!" or "<?"
        let mut text = String::new();
        while !self.is_eof() && self.current_char() != '>' {
            text.push(self.current_char());
            self.advance();
        }
        if !self.is_eof() {
            self.advance();
        }
        Token::Doctype(text.trim().to_string())
    }

    /// 当前 '<' 是否开启一个标签、注释或声明
    fn begins_markup(&self) -> bool {
        let next = self.peek(1);
        next.is_ascii_alphabetic()
            || next == '!'
            || next == '?'
            || (next == '/' && self.peek(2).is_ascii_alphabetic())
    }

    fn current_char(&self) -> char {
        self.peek(0)
    }

    fn peek(&self, offset: usize) -> char {
        self.input.get(self.pos + offset).copied().unwrap_or('\0')
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_eof() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        s.chars().enumerate().all(|(i, c)| self.peek(i) == c)
    }

    fn starts_with_ignore_case(&self, s: &str) -> bool {
        s.chars()
            .enumerate()
            .all(|(i, c)| self.peek(i).eq_ignore_ascii_case(&c))
    }
}

impl Iterator for Tokenizer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}

/// 解码字符引用，无法识别的原样保留
pub fn unescape(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest.find(';').and_then(|semi| {
            let entity = &rest[1..semi];
            decode_entity(entity).map(|c| (c, semi + 1))
        });
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let code = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                entity.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}
