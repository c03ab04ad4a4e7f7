//! Anthropic ⇄ Gemini 转换

pub mod request;
pub mod response;
pub mod schema;
