//! geminicast - Anthropic → Gemini 协议代理
//!
//! 接收 Anthropic Messages API 格式的请求，转换为 Gemini generateContent
//! 格式后转发到 Google Gemini API，再将响应转换回 Anthropic 格式。
//!
//! # 架构设计
//!
//! ```text
//! src/
//! ├── models/                 # 两侧协议的数据模型
//! │   ├── anthropic.rs        # Anthropic Messages API 类型
//! │   └── gemini.rs           # Gemini generateContent 类型
//! ├── translator/             # 纯转换逻辑（无 I/O）
//! │   └── gemini/
//! │       ├── request.rs      # Anthropic 消息 → Gemini contents/tools
//! │       ├── schema.rs       # JSON Schema 清理与转换
//! │       └── response.rs     # Gemini 响应 → Anthropic 响应
//! ├── signature.rs            # Thought signature 关联缓存
//! ├── providers/              # Gemini 后端调用（两条路径）
//! │   ├── native.rs           # SDK 风格客户端（不支持 thought signature）
//! │   └── gemini_http.rs      # 原始 HTTP 客户端（保留 thought signature）
//! └── server/                 # HTTP 服务（axum）
//! ```

pub mod config;
pub mod models;
pub mod providers;
pub mod server;
pub mod signature;
pub mod translator;
