//! Gemini generateContent 响应 → Anthropic 响应转换
//!
//! 只消费首个候选。function_call part 生成的 tool_use block 总是铸发
//! 新的 `toolu_` id，不复用后端返回的任何标识。

use crate::models::anthropic::{AnthropicResponse, AnthropicUsage, ContentBlock, Role};
use crate::models::gemini::GenerateContentResponse;
use uuid::Uuid;

/// 将 Gemini 响应转换为 Anthropic Messages 响应
///
/// 无候选或候选无内容时返回空 content。任何非空 finish reason 都映射为
/// `end_turn`；缺失 usage 统计时记为 0。
pub fn to_anthropic_response(response: &GenerateContentResponse, model: &str) -> AnthropicResponse {
    let mut content = Vec::new();
    let mut stop_reason = None;

    if let Some(candidate) = response.candidates.first() {
        if let Some(candidate_content) = &candidate.content {
            for part in &candidate_content.parts {
                match (&part.text, &part.function_call) {
                    (Some(text), _) if !text.is_empty() => {
                        content.push(ContentBlock::Text { text: text.clone() });
                    }
                    (_, Some(call)) => {
                        content.push(ContentBlock::ToolUse {
                            id: format!("toolu_{}", Uuid::new_v4().simple()),
                            name: call.name.clone(),
                            input: call.args.clone(),
                            thought_signature: part
                                .thought_signature
                                .as_ref()
                                .filter(|signature| !signature.is_empty())
                                .cloned(),
                        });
                    }
                    _ => {}
                }
            }
        }

        if candidate
            .finish_reason
            .as_ref()
            .is_some_and(|reason| !reason.is_empty())
        {
            stop_reason = Some("end_turn".to_string());
        }
    }

    let usage = response
        .usage_metadata
        .map(|metadata| AnthropicUsage {
            input_tokens: metadata.prompt_token_count,
            output_tokens: metadata.candidates_token_count,
        })
        .unwrap_or_default();

    AnthropicResponse {
        id: format!("msg_{}", Uuid::new_v4()),
        response_type: "message".to_string(),
        role: Role::Assistant,
        content,
        model: model.to_string(),
        stop_reason,
        usage,
    }
}
