//! 属性绑定 - 把标签属性写入组件字段
//!
//! 字段按序列化后的 JSON 类型决定转换方式：
//! bool 解析布尔字面量，整数/浮点解析数字，字符串原样复制，其余按 JSON 解析。
//! 缺省的 bool 字段一律置为 false，其它缺省字段保持不变。
//! 以 `_` 开头的字段视为私有，不参与绑定。
//! `#[serde(skip)]` 的字段不在 JSON 里，写回时原地保留。

use crate::error::{Error, Result};
use crate::tag::AttrMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Number, Value as JsonValue};
use std::collections::HashMap;

/// 绑定属性，任一字段失败则整个组件保持原样
pub fn bind<C>(c: &mut C, attrs: &AttrMap) -> Result<()>
where
    C: Serialize + DeserializeOwned,
{
    let type_name = std::any::type_name::<C>();
    let mut fields = match serde_json::to_value(&*c)? {
        JsonValue::Object(map) if !map.is_empty() => map,
        _ => {
            return Err(Error::InvalidComponent {
                type_name: type_name.to_string(),
                reason: "not a struct with fields".to_string(),
            })
        }
    };

    // 属性名大小写不敏感
    let lowered: HashMap<String, (&str, &str)> = attrs
        .iter()
        .map(|(k, v)| (k.to_lowercase(), (k.as_str(), v.as_str())))
        .collect();

    let names: Vec<String> = fields.keys().cloned().collect();
    for field in names {
        if field.starts_with('_') {
            continue;
        }
        let current = &fields[&field];

        let Some(&(attr, raw)) = lowered.get(&field.to_lowercase()) else {
            if current.is_boolean() {
                fields.insert(field, JsonValue::Bool(false));
            }
            continue;
        };

        let value_error = |message: String| Error::Value {
            field: field.clone(),
            type_name: type_name.to_string(),
            attr: attr.to_string(),
            value: raw.to_string(),
            message,
        };

        let value = coerce(current, raw).map_err(value_error)?;
        fields.insert(field.clone(), value);

        // 逐字段反序列化校验，溢出、负数写入无符号字段等在这里报错
        if let Err(e) = serde_json::from_value::<C>(JsonValue::Object(fields.clone())) {
            return Err(value_error(e.to_string()));
        }
    }

    // 只写回序列化出来的字段，跳过的字段保持原值
    C::deserialize_in_place(JsonValue::Object(fields), c)?;
    Ok(())
}

fn coerce(current: &JsonValue, raw: &str) -> std::result::Result<JsonValue, String> {
    match current {
        JsonValue::Bool(_) => parse_bool(raw).map(JsonValue::Bool),
        JsonValue::Number(n) if n.is_f64() => {
            let f: f64 = raw.trim().parse().map_err(|e| format!("{}", e))?;
            Number::from_f64(f)
                .map(JsonValue::Number)
                .ok_or_else(|| format!("{} is not a finite number", raw))
        }
        JsonValue::Number(_) => parse_integer(raw).map(JsonValue::Number),
        JsonValue::String(_) => Ok(JsonValue::String(raw.to_string())),
        _ => serde_json::from_str(raw).map_err(|e| e.to_string()),
    }
}

/// 空值视为 true，即 HTML 的布尔属性写法
fn parse_bool(raw: &str) -> std::result::Result<bool, String> {
    match raw {
        "" | "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(format!("invalid boolean {:?}", raw)),
    }
}

fn parse_integer(raw: &str) -> std::result::Result<Number, String> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return Ok(n.into());
    }
    raw.parse::<u64>()
        .map(Number::from)
        .map_err(|e| format!("invalid integer {:?}: {}", raw, e))
}
