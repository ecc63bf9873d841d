//! 模板引擎 - 处理数据绑定和条件渲染
//!
//! 语法：
//! - `{{ expr }}` 插值，输出经过 HTML 转义
//! - `{{if expr}} … {{else}} … {{end}}`
//! - `{{range expr}} … {{end}}`，循环体内可用 `item` 和 `index`；`{{range expr as name}}` 改名
//! - `json(v)`、`time(v, layout)` 为保留助手函数，组件自带的同名助手会被覆盖

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt::Write;
use thiserror::Error;

/// 助手函数
pub type Helper = fn(&[JsonValue]) -> Result<JsonValue, String>;

/// 助手函数表
pub type Helpers = HashMap<String, Helper>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("unclosed action at byte {0}")]
    Unclosed(usize),

    #[error("unexpected {{{{{0}}}}}")]
    Unexpected(String),

    #[error("missing {{{{end}}}} for {{{{{0}}}}}")]
    MissingEnd(String),

    #[error("can't evaluate {0}")]
    UnknownPath(String),

    #[error("function {0} not defined")]
    UnknownHelper(String),

    #[error("error calling {name}: {message}")]
    Helper { name: String, message: String },

    #[error("bad expression {0:?}")]
    BadExpr(String),
}

/// 模板节点
#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Expr(String),
    If {
        cond: String,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
    Range {
        expr: String,
        item: String,
        body: Vec<Node>,
    },
}

/// 解析中尚未闭合的块
enum Block {
    Root(Vec<Node>),
    If {
        cond: String,
        then: Vec<Node>,
        otherwise: Vec<Node>,
        in_else: bool,
    },
    Range {
        expr: String,
        item: String,
        body: Vec<Node>,
    },
}

impl Block {
    fn push(&mut self, node: Node) {
        match self {
            Block::Root(nodes) => nodes.push(node),
            Block::If { then, otherwise, in_else, .. } => {
                if *in_else {
                    otherwise.push(node)
                } else {
                    then.push(node)
                }
            }
            Block::Range { body, .. } => body.push(node),
        }
    }

    fn describe(&self) -> String {
        match self {
            Block::Root(_) => String::new(),
            Block::If { cond, .. } => format!("if {}", cond),
            Block::Range { expr, .. } => format!("range {}", expr),
        }
    }
}

/// 模板引擎
pub struct TemplateEngine {
    helpers: Helpers,
}

impl TemplateEngine {
    pub fn new() -> Self {
        Self::with_helpers(Helpers::new())
    }

    /// 合并组件自带助手，保留助手优先
    pub fn with_helpers(mut helpers: Helpers) -> Self {
        for (name, helper) in reserved_helpers() {
            helpers.insert(name.to_string(), helper);
        }
        Self { helpers }
    }

    /// 用 data 执行模板
    pub fn execute(&self, template: &str, data: &JsonValue) -> Result<String, TemplateError> {
        let nodes = parse(template)?;
        let mut out = String::with_capacity(template.len());
        self.render_nodes(&nodes, data, &mut out)?;
        Ok(out)
    }

    fn render_nodes(&self, nodes: &[Node], data: &JsonValue, out: &mut String) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Expr(expr) => {
                    let value = self.evaluate(expr, data)?;
                    out.push_str(&escape_html(&json_to_string(&value)));
                }
                Node::If { cond, then, otherwise } => {
                    if is_truthy(&self.evaluate(cond, data)?) {
                        self.render_nodes(then, data, out)?;
                    } else {
                        self.render_nodes(otherwise, data, out)?;
                    }
                }
                Node::Range { expr, item, body } => {
                    self.render_range(expr, item, body, data, out)?;
                }
            }
        }
        Ok(())
    }

    fn render_range(
        &self,
        expr: &str,
        item_name: &str,
        body: &[Node],
        data: &JsonValue,
        out: &mut String,
    ) -> Result<(), TemplateError> {
        let items: Vec<(JsonValue, JsonValue)> = match self.evaluate(expr, data)? {
            JsonValue::Null => return Ok(()),
            JsonValue::Array(arr) => arr
                .into_iter()
                .enumerate()
                .map(|(index, item)| (JsonValue::Number(index.into()), item))
                .collect(),
            JsonValue::Object(map) => map
                .into_iter()
                .map(|(key, item)| (JsonValue::String(key), item))
                .collect(),
            _ => return Err(TemplateError::BadExpr(format!("range {}", expr))),
        };

        for (index, item) in items {
            // 创建循环上下文
            let mut loop_data = data.clone();
            if let Some(obj) = loop_data.as_object_mut() {
                obj.insert(item_name.to_string(), item);
                obj.insert("index".to_string(), index);
            }
            self.render_nodes(body, &loop_data, out)?;
        }
        Ok(())
    }

    /// 计算表达式
    fn evaluate(&self, expr: &str, data: &JsonValue) -> Result<JsonValue, TemplateError> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Err(TemplateError::BadExpr(expr.to_string()));
        }

        // 三元表达式: condition ? true_val : false_val
        if let Some(q_pos) = find_top_level(expr, "?") {
            let branches = &expr[q_pos + 1..];
            let c_pos = find_top_level(branches, ":")
                .ok_or_else(|| TemplateError::BadExpr(expr.to_string()))?;
            let condition = self.evaluate(&expr[..q_pos], data)?;
            return if is_truthy(&condition) {
                self.evaluate(&branches[..c_pos], data)
            } else {
                self.evaluate(&branches[c_pos + 1..], data)
            };
        }

        // 比较运算
        if let Some((pos, op)) = find_operator(expr) {
            let left = self.evaluate(&expr[..pos], data)?;
            let right = self.evaluate(&expr[pos + op.len()..], data)?;
            return Ok(JsonValue::Bool(compare(op, &left, &right)));
        }

        // 否定
        if let Some(inner) = expr.strip_prefix('!') {
            return Ok(JsonValue::Bool(!is_truthy(&self.evaluate(inner, data)?)));
        }

        if let Some(inner) = strip_parens(expr) {
            return self.evaluate(inner, data);
        }

        // 字符串字面量
        if expr.len() >= 2
            && ((expr.starts_with('\'') && expr.ends_with('\''))
                || (expr.starts_with('"') && expr.ends_with('"')))
        {
            return Ok(JsonValue::String(expr[1..expr.len() - 1].to_string()));
        }

        // 数字字面量
        if expr.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
            return parse_number(expr).ok_or_else(|| TemplateError::BadExpr(expr.to_string()));
        }

        match expr {
            "true" => return Ok(JsonValue::Bool(true)),
            "false" => return Ok(JsonValue::Bool(false)),
            "null" => return Ok(JsonValue::Null),
            _ => {}
        }

        if let Some((name, args)) = split_call(expr) {
            return self.call(name, args, data);
        }

        get_value(expr, data)
    }

    fn call(&self, name: &str, args: &str, data: &JsonValue) -> Result<JsonValue, TemplateError> {
        let helper = self
            .helpers
            .get(name)
            .ok_or_else(|| TemplateError::UnknownHelper(name.to_string()))?;

        let mut values = Vec::new();
        if !args.trim().is_empty() {
            for arg in split_top_level(args, ',') {
                values.push(self.evaluate(arg, data)?);
            }
        }

        helper(&values).map_err(|message| TemplateError::Helper {
            name: name.to_string(),
            message,
        })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn parse(template: &str) -> Result<Vec<Node>, TemplateError> {
    let mut stack = vec![Block::Root(Vec::new())];
    let mut rest = template;
    let mut offset = 0;

    while let Some(open) = rest.find("{{") {
        if open > 0 {
            push_node(&mut stack, Node::Text(rest[..open].to_string()));
        }

        let after = &rest[open + 2..];
        let close = after
            .find("}}")
            .ok_or(TemplateError::Unclosed(offset + open))?;
        handle_action(&mut stack, after[..close].trim())?;

        let consumed = open + 2 + close + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }
    if !rest.is_empty() {
        push_node(&mut stack, Node::Text(rest.to_string()));
    }

    if stack.len() > 1 {
        let top = stack.pop().map(|b| b.describe()).unwrap_or_default();
        return Err(TemplateError::MissingEnd(top));
    }
    match stack.pop() {
        Some(Block::Root(nodes)) => Ok(nodes),
        _ => Ok(Vec::new()),
    }
}

fn push_node(stack: &mut [Block], node: Node) {
    if let Some(top) = stack.last_mut() {
        top.push(node);
    }
}

fn handle_action(stack: &mut Vec<Block>, action: &str) -> Result<(), TemplateError> {
    match action {
        "end" => {
            let node = match stack.pop() {
                Some(Block::If { cond, then, otherwise, .. }) => Node::If { cond, then, otherwise },
                Some(Block::Range { expr, item, body }) => Node::Range { expr, item, body },
                Some(root @ Block::Root(_)) => {
                    stack.push(root);
                    return Err(TemplateError::Unexpected("end".to_string()));
                }
                None => return Err(TemplateError::Unexpected("end".to_string())),
            };
            push_node(stack, node);
        }
        "else" => match stack.last_mut() {
            Some(Block::If { in_else, .. }) if !*in_else => *in_else = true,
            _ => return Err(TemplateError::Unexpected("else".to_string())),
        },
        _ => {
            if let Some(cond) = action.strip_prefix("if ") {
                stack.push(Block::If {
                    cond: cond.trim().to_string(),
                    then: Vec::new(),
                    otherwise: Vec::new(),
                    in_else: false,
                });
            } else if let Some(clause) = action.strip_prefix("range ") {
                let (expr, item) = match clause.rsplit_once(" as ") {
                    Some((expr, item)) => (expr.trim(), item.trim()),
                    None => (clause.trim(), "item"),
                };
                stack.push(Block::Range {
                    expr: expr.to_string(),
                    item: item.to_string(),
                    body: Vec::new(),
                });
            } else {
                push_node(stack, Node::Expr(action.to_string()));
            }
        }
    }
    Ok(())
}

/// 在引号和括号之外查找 pat
fn find_top_level(expr: &str, pat: &str) -> Option<usize> {
    scan_top_level(expr, |rest| rest.starts_with(pat).then_some(()))
        .map(|(pos, _)| pos)
}

const COMPARISON_OPS: [&str; 8] = ["===", "!==", "==", "!=", ">=", "<=", ">", "<"];

fn find_operator(expr: &str) -> Option<(usize, &'static str)> {
    scan_top_level(expr, |rest| {
        COMPARISON_OPS.iter().copied().find(|op| rest.starts_with(op))
    })
}

fn scan_top_level<T>(expr: &str, mut matcher: impl FnMut(&str) -> Option<T>) -> Option<(usize, T)> {
    let mut quote: Option<char> = None;
    let mut depth = 0usize;

    for (i, c) in expr.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => {
                if let Some(found) = matcher(&expr[i..]) {
                    return Some((i, found));
                }
            }
            _ => {}
        }
    }
    None
}

fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = s;
    while let Some(pos) = find_top_level(rest, &sep.to_string()) {
        parts.push(&rest[..pos]);
        rest = &rest[pos + sep.len_utf8()..];
    }
    parts.push(rest);
    parts
}

/// 整个表达式被一对括号包住时返回括号内部
fn strip_parens(expr: &str) -> Option<&str> {
    let inner = expr.strip_prefix('(')?.strip_suffix(')')?;
    // "(a) == (b)" 这类不算
    let mut depth = 0i32;
    for c in inner.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            _ => {}
        }
    }
    Some(inner)
}

/// 拆出助手调用 name(args)
fn split_call(expr: &str) -> Option<(&str, &str)> {
    let open = expr.find('(')?;
    let name = &expr[..open];
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    let args = strip_parens(&expr[open..])?;
    Some((name, args))
}

fn parse_number(expr: &str) -> Option<JsonValue> {
    if let Ok(n) = expr.parse::<i64>() {
        return Some(JsonValue::Number(n.into()));
    }
    let f = expr.parse::<f64>().ok()?;
    serde_json::Number::from_f64(f).map(JsonValue::Number)
}

/// 获取数据值
fn get_value(path: &str, data: &JsonValue) -> Result<JsonValue, TemplateError> {
    let unknown = || TemplateError::UnknownPath(path.to_string());
    let trimmed = path.strip_prefix('.').unwrap_or(path);
    if trimmed.is_empty() {
        return Ok(data.clone());
    }

    let mut current = data;
    for part in trimmed.split('.') {
        // 处理数组索引 item[0][1]
        let (name, mut indexes) = match part.find('[') {
            Some(bracket_pos) => (&part[..bracket_pos], &part[bracket_pos..]),
            None => (part, ""),
        };
        if !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '$') {
            return Err(TemplateError::BadExpr(path.to_string()));
        }

        if current.is_null() {
            return Ok(JsonValue::Null);
        }
        if !name.is_empty() {
            current = current.get(name).ok_or_else(unknown)?;
        }

        while let Some(stripped) = indexes.strip_prefix('[') {
            let close = stripped.find(']').ok_or_else(unknown)?;
            let index: usize = stripped[..close].trim().parse().map_err(|_| unknown())?;
            if current.is_null() {
                return Ok(JsonValue::Null);
            }
            current = current.get(index).ok_or_else(unknown)?;
            indexes = &stripped[close + 1..];
        }
        if !indexes.is_empty() {
            return Err(unknown());
        }
    }

    Ok(current.clone())
}

fn compare(op: &str, left: &JsonValue, right: &JsonValue) -> bool {
    match op {
        "===" | "==" => values_equal(left, right),
        "!==" | "!=" => !values_equal(left, right),
        ">" => as_number(left) > as_number(right),
        "<" => as_number(left) < as_number(right),
        ">=" => as_number(left) >= as_number(right),
        "<=" => as_number(left) <= as_number(right),
        _ => false,
    }
}

fn values_equal(left: &JsonValue, right: &JsonValue) -> bool {
    match (left, right) {
        (JsonValue::Number(l), JsonValue::Number(r)) => l.as_f64() == r.as_f64(),
        _ => json_to_string(left) == json_to_string(right),
    }
}

fn as_number(value: &JsonValue) -> f64 {
    match value {
        JsonValue::Number(n) => n.as_f64().unwrap_or(0.0),
        JsonValue::String(s) => s.trim().parse().unwrap_or(0.0),
        JsonValue::Bool(b) => f64::from(u8::from(*b)),
        _ => 0.0,
    }
}

fn json_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Null => String::new(),
        _ => value.to_string(),
    }
}

fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().unwrap_or(0.0) != 0.0,
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(a) => !a.is_empty(),
        JsonValue::Object(_) => true,
    }
}

/// 插值输出转义
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn reserved_helpers() -> [(&'static str, Helper); 2] {
    [("json", json_helper as Helper), ("time", time_helper as Helper)]
}

fn json_helper(args: &[JsonValue]) -> Result<JsonValue, String> {
    let [value] = args else {
        return Err(format!("expected 1 argument, got {}", args.len()));
    };
    serde_json::to_string(value)
        .map(JsonValue::String)
        .map_err(|e| e.to_string())
}

fn time_helper(args: &[JsonValue]) -> Result<JsonValue, String> {
    let [value, layout] = args else {
        return Err(format!("expected 2 arguments, got {}", args.len()));
    };
    let layout = layout.as_str().ok_or("layout must be a string")?;
    let time = parse_time(value)?;

    let mut out = String::new();
    write!(out, "{}", time.format(layout)).map_err(|_| format!("invalid layout {:?}", layout))?;
    Ok(JsonValue::String(out))
}

/// 接受 RFC 3339 字符串、unix 秒数或序列化后的 SystemTime
fn parse_time(value: &JsonValue) -> Result<DateTime<FixedOffset>, String> {
    let from_unix = |secs: i64, nanos: u32| {
        Utc.timestamp_opt(secs, nanos)
            .single()
            .map(|t| t.fixed_offset())
            .ok_or_else(|| format!("timestamp {} out of range", secs))
    };

    match value {
        JsonValue::String(s) => DateTime::parse_from_rfc3339(s).map_err(|e| format!("{}: {}", s, e)),
        JsonValue::Number(n) => {
            let secs = n.as_i64().ok_or_else(|| format!("{} is not a unix timestamp", n))?;
            from_unix(secs, 0)
        }
        JsonValue::Object(map) => {
            let secs = map.get("secs_since_epoch").and_then(JsonValue::as_i64);
            let nanos = map.get("nanos_since_epoch").and_then(JsonValue::as_u64);
            match (secs, nanos) {
                (Some(secs), Some(nanos)) => from_unix(secs, nanos as u32),
                _ => Err(format!("{} is not a time value", value)),
            }
        }
        _ => Err(format!("{} is not a time value", value)),
    }
}
