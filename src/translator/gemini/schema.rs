//! JSON Schema 清理与 Gemini Schema 方言转换
//!
//! Gemini 只接受 JSON Schema 的一个子集，收到 `$schema` 或
//! `additionalProperties` 字段会直接返回 400，因此先递归清理，
//! 再转换为类型化的 [`GeminiSchema`]。

use crate::models::gemini::{GeminiSchema, GeminiSchemaType};
use serde_json::{Map, Value};

/// 递归移除 Gemini 不支持的 JSON Schema 字段
///
/// 只删除 `$schema` 和 `additionalProperties` 两个键；递归进入对象值
/// 以及数组中的对象元素，数组里的标量元素原样保留。幂等：
/// `sanitize_schema(sanitize_schema(x)) == sanitize_schema(x)`。
pub fn sanitize_schema(schema: &Map<String, Value>) -> Map<String, Value> {
    let mut cleaned = Map::new();

    for (key, value) in schema {
        if key == "$schema" || key == "additionalProperties" {
            continue;
        }

        let sanitized = match value {
            Value::Object(object) => Value::Object(sanitize_schema(object)),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| match item {
                        Value::Object(object) => Value::Object(sanitize_schema(object)),
                        other => other.clone(),
                    })
                    .collect(),
            ),
            other => other.clone(),
        };
        cleaned.insert(key.clone(), sanitized);
    }

    cleaned
}

/// 将 JSON Schema 节点转换为 Gemini Schema 方言
///
/// `type` 大小写不敏感地映射到六种类型之一，无法识别时留空而不报错；
/// `enum` 只保留字符串元素；`items`/`properties` 递归转换；
/// `required` 复制为字符串列表。
pub fn convert_schema(schema: &Map<String, Value>) -> GeminiSchema {
    let mut result = GeminiSchema::default();

    if let Some(type_str) = schema.get("type").and_then(Value::as_str) {
        result.schema_type = match type_str.to_ascii_lowercase().as_str() {
            "string" => Some(GeminiSchemaType::String),
            "number" => Some(GeminiSchemaType::Number),
            "integer" => Some(GeminiSchemaType::Integer),
            "boolean" => Some(GeminiSchemaType::Boolean),
            "array" => Some(GeminiSchemaType::Array),
            "object" => Some(GeminiSchemaType::Object),
            _ => None,
        };
    }

    if let Some(description) = schema.get("description").and_then(Value::as_str) {
        result.description = Some(description.to_string());
    }

    if let Some(enum_values) = schema.get("enum").and_then(Value::as_array) {
        result.enum_values = Some(
            enum_values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        );
    }

    if let Some(items) = schema.get("items").and_then(Value::as_object) {
        result.items = Some(Box::new(convert_schema(items)));
    }

    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        result.properties = Some(
            properties
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .as_object()
                        .map(|object| (name.clone(), convert_schema(object)))
                })
                .collect(),
        );
    }

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        result.required = Some(
            required
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        );
    }

    result
}


// ============================================================================
// 属性测试
// ============================================================================
