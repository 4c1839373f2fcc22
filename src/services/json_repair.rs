//! 响应整理 - 业务能力层
//!
//! 后端在 JSON 模式下仍可能返回带 Markdown 代码块的文本，
//! 这里负责把它整理成可解析的 JSON，并抽取检索来源。

use serde_json::{Map, Value};
use tracing::warn;

use crate::clients::BackendResponse;

/// 去掉 ```json 代码块标记，只保留最外层的 `{...}`
pub fn clean_json(text: &str) -> String {
    if text.trim().is_empty() {
        return "{}".to_string();
    }

    let cleaned = text.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(start), Some(end)) if start < end => cleaned[start..=end].to_string(),
        _ => cleaned.to_string(),
    }
}

/// 整理并解析 JSON，失败时返回空对象
///
/// 调用方必须能处理空对象：缺失字段一律按回退值处理。
pub fn normalize_json(text: &str) -> Value {
    let cleaned = clean_json(text);
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(value @ Value::Object(_)) => value,
        Ok(other) => {
            warn!("JSON 顶层不是对象 ({}), 使用空对象", type_name(&other));
            Value::Object(Map::new())
        }
        Err(e) => {
            warn!("无法解析后端 JSON: {}，使用空对象", e);
            Value::Object(Map::new())
        }
    }
}

/// 抽取检索来源 URL（去重，保持首次出现顺序）
pub fn extract_urls(response: &BackendResponse) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for uri in response
        .citations
        .iter()
        .filter_map(|c| c.uri.as_deref())
        .map(str::trim)
        .filter(|u| !u.is_empty())
    {
        if !urls.iter().any(|u| u == uri) {
            urls.push(uri.to_string());
        }
    }
    urls
}

/// 读取非空字符串字段
pub fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// 读取字符串数组字段，忽略非字符串和空白项
pub fn string_list_field(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
