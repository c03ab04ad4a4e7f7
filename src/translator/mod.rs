//! 协议转换层
//!
//! 处理 Anthropic Messages 前端协议与 Gemini generateContent 后端协议
//! 之间的请求和响应格式转换。所有转换都是纯函数，不做任何 I/O。
//!
//! # 架构设计
//!
//! ```text
//! translator/
//! ├── error.rs                # 转换错误类型
//! └── gemini/
//!     ├── schema.rs           # JSON Schema 清理 + Gemini Schema 方言转换
//!     ├── request.rs          # Anthropic 消息/工具 → Gemini contents/tools
//!     └── response.rs         # Gemini 响应 → Anthropic 响应
//! ```

pub mod error;
pub mod gemini;

pub use error::TranslateError;
pub use gemini::request::{system_instruction, to_gemini_contents, to_gemini_tools};
pub use gemini::response::to_anthropic_response;
pub use gemini::schema::{convert_schema, sanitize_schema};
