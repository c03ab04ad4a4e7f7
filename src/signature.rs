//! Thought signature 缓存
//!
//! Gemini 在 function_call part 上返回不透明的 thoughtSignature，后续
//! 轮次把同一工具调用发回时必须原样携带。客户端重放对话时通常会丢掉
//! 这个字段，因此按 tool_use id 缓存并在入站请求中补注。
//!
//! 条目与进程同生命周期，不做淘汰。

use crate::models::anthropic::{AnthropicRequest, AnthropicResponse, ContentBlock};
use dashmap::DashMap;

/// tool_use id → thought signature 映射
#[derive(Debug, Default)]
pub struct ThoughtSignatureCache {
    entries: DashMap<String, String>,
}

impl ThoughtSignatureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录出站响应中每个带签名的 tool_use block
    ///
    /// 同一 id 重复出现时以最新签名覆盖。
    pub fn cache_response(&self, response: &AnthropicResponse) {
        for block in &response.content {
            if let ContentBlock::ToolUse {
                id,
                thought_signature: Some(signature),
                ..
            } = block
            {
                if !id.is_empty() && !signature.is_empty() {
                    self.entries.insert(id.clone(), signature.clone());
                }
            }
        }
    }

    /// 为入站请求中缺失签名的 tool_use block 补注缓存的签名
    ///
    /// 客户端已携带的非空签名保持不动；缓存未命中则 block 原样通过。
    pub fn inject_request(&self, request: &mut AnthropicRequest) {
        for message in &mut request.messages {
            for block in &mut message.content {
                if let ContentBlock::ToolUse {
                    id,
                    thought_signature,
                    ..
                } = block
                {
                    let missing = thought_signature
                        .as_ref()
                        .map_or(true, |signature| signature.is_empty());
                    if missing {
                        if let Some(cached) = self.entries.get(id.as_str()) {
                            *thought_signature = Some(cached.clone());
                        }
                    }
                }
            }
        }
    }

    pub fn get(&self, tool_use_id: &str) -> Option<String> {
        self.entries
            .get(tool_use_id)
            .map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
