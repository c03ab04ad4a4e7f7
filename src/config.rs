//! 进程配置
//!
//! 由 CLI 层（clap）填充，核心逻辑只读取此结构。

/// Gemini API 默认 Base URL
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// 代理进程配置
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Gemini API Key（必填）
    pub api_key: String,
    /// Base URL 覆盖（默认使用官方地址）
    pub base_url: Option<String>,
    /// HTTP 监听端口
    pub port: u16,
    /// 详细日志
    pub verbose: bool,
    /// 调试日志（记录原始请求/响应负载）
    pub debug: bool,
}

impl ProxyConfig {
    /// 解析后的 Base URL
    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string())
    }
}
