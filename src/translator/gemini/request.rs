//! Anthropic 消息/工具 → Gemini 请求转换
//!
//! 角色映射：`assistant` → `model`，`user` 不变。tool_result block 通过
//! 全量扫描建立的 id → 工具名映射关联到对应的 tool_use（关联必须覆盖
//! 整个对话，而不仅是之前的轮次）。

use crate::models::anthropic::{AnthropicMessage, AnthropicTool, ContentBlock, Role, SystemPrompt};
use crate::models::gemini::{
    FunctionDeclaration, GeminiBlob, GeminiContent, GeminiFunctionCall, GeminiFunctionResponse,
    GeminiPart, GeminiTool, ROLE_MODEL, ROLE_USER,
};
use crate::translator::error::TranslateError;
use crate::translator::gemini::schema::{convert_schema, sanitize_schema};
use serde_json::Value;
use std::collections::HashMap;

/// 将 Anthropic 消息列表转换为 Gemini contents
///
/// - 空文本 block 不产生 part，整条消息无 part 时从输出中丢弃
/// - 图片负载保持 base64 文本原样传递（原始 HTTP 路径）
/// - tool_use 携带的 thought signature 原样放入对应 part
/// - tool_result 引用未知 tool_use_id 时返回 [`TranslateError::UnknownToolUseId`]
pub fn to_gemini_contents(
    messages: &[AnthropicMessage],
) -> Result<Vec<GeminiContent>, TranslateError> {
    // 第一遍：建立 tool_use id → 工具名映射，供 tool_result 反查
    let mut tool_map: HashMap<&str, &str> = HashMap::new();
    for message in messages {
        for block in &message.content {
            if let ContentBlock::ToolUse { id, name, .. } = block {
                if !id.is_empty() && !name.is_empty() {
                    tool_map.insert(id, name);
                }
            }
        }
    }

    // 第二遍：逐条消息转换
    let mut contents = Vec::new();
    for message in messages {
        let role = match message.role {
            Role::Assistant => ROLE_MODEL,
            Role::User => ROLE_USER,
        };

        let mut parts = Vec::new();
        for block in &message.content {
            if let Some(part) = convert_content_block(block, &tool_map)? {
                parts.push(part);
            }
        }

        if !parts.is_empty() {
            contents.push(GeminiContent {
                role: role.to_string(),
                parts,
            });
        }
    }

    Ok(contents)
}

/// 转换单个 content block；无法映射的类型返回 `None`（静默跳过）
fn convert_content_block(
    block: &ContentBlock,
    tool_map: &HashMap<&str, &str>,
) -> Result<Option<GeminiPart>, TranslateError> {
    match block {
        ContentBlock::Text { text } if !text.is_empty() => Ok(Some(GeminiPart {
            text: Some(text.clone()),
            ..Default::default()
        })),
        ContentBlock::Text { .. } => Ok(None),

        ContentBlock::Image { source } if !source.data.is_empty() => Ok(Some(GeminiPart {
            inline_data: Some(GeminiBlob {
                mime_type: source.media_type.clone(),
                data: source.data.clone(),
            }),
            ..Default::default()
        })),
        ContentBlock::Image { .. } => Ok(None),

        ContentBlock::ToolUse {
            name,
            input,
            thought_signature,
            ..
        } if !name.is_empty() => Ok(Some(GeminiPart {
            function_call: Some(GeminiFunctionCall {
                name: name.clone(),
                args: input.clone(),
            }),
            thought_signature: thought_signature
                .as_ref()
                .filter(|signature| !signature.is_empty())
                .cloned(),
            ..Default::default()
        })),
        ContentBlock::ToolUse { .. } => Ok(None),

        ContentBlock::ToolResult {
            tool_use_id,
            content,
            text,
        } if !tool_use_id.is_empty() => {
            let tool_name = tool_map
                .get(tool_use_id.as_str())
                .ok_or_else(|| TranslateError::UnknownToolUseId(tool_use_id.clone()))?;

            // content 优先于遗留的 text 字段
            let result = match (content, text) {
                (Some(content), _) => content.clone(),
                (None, Some(text)) if !text.is_empty() => Value::String(text.clone()),
                _ => Value::Null,
            };

            Ok(Some(GeminiPart {
                function_response: Some(GeminiFunctionResponse {
                    name: tool_name.to_string(),
                    response: serde_json::json!({ "result": result }),
                }),
                ..Default::default()
            }))
        }
        ContentBlock::ToolResult { .. } => Ok(None),

        ContentBlock::Unknown(_) => Ok(None),
    }
}

/// 将 Anthropic 工具定义转换为 Gemini 工具
///
/// 每个 input_schema 先清理（[`sanitize_schema`]）再转换为 Gemini
/// Schema 方言。空列表返回 `None`。
pub fn to_gemini_tools(tools: &[AnthropicTool]) -> Option<Vec<GeminiTool>> {
    if tools.is_empty() {
        return None;
    }

    let function_declarations = tools
        .iter()
        .map(|tool| {
            let cleaned = sanitize_schema(&tool.input_schema);
            FunctionDeclaration {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: Some(convert_schema(&cleaned)),
            }
        })
        .collect();

    Some(vec![GeminiTool {
        function_declarations,
    }])
}

/// 将 system prompt 归一化为 Gemini systemInstruction
pub fn system_instruction(system: &SystemPrompt) -> Option<GeminiContent> {
    let text = system.as_text();
    if text.is_empty() {
        return None;
    }

    Some(GeminiContent {
        role: String::new(),
        parts: vec![GeminiPart {
            text: Some(text),
            ..Default::default()
        }],
    })
}
