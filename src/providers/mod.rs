//! Gemini 后端访问层
//!
//! 两条传输路径实现同一个 [`traits::GeminiBackend`] 接口：
//! - [`gemini_http`]：原始 HTTP 路径，完整保留 thoughtSignature 等字段
//! - [`native`]：SDK 风格路径，类型面更窄（无 signature 槽位），作为降级

pub mod gemini_http;
pub mod native;
pub mod traits;

pub use gemini_http::GeminiHttpClient;
pub use native::NativeGeminiClient;
pub use traits::{GeminiBackend, ProviderError};
