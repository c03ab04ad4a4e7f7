//! geminicast 入口
//!
//! 启动 Anthropic Messages 兼容代理，转发到 Gemini generateContent。

use anyhow::{Context, Result};
use clap::Parser;
use geminicast::config::ProxyConfig;
use geminicast::server::{router, AppState};
use std::net::SocketAddr;
use tokio::net::TcpListener;

#[derive(Debug, Parser)]
#[command(name = "geminicast", about = "Anthropic-to-Gemini API proxy", version)]
struct Cli {
    /// 监听端口
    #[arg(long, short, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// 输出详细日志
    #[arg(long, short, env = "VERBOSE")]
    verbose: bool,

    /// 记录原始请求/响应载荷（含用户内容，谨慎开启）
    #[arg(long, env = "DEBUG")]
    debug: bool,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// 覆盖 Gemini API base URL
    #[arg(long, env = "GEMINI_BASE_URL")]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug || cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = ProxyConfig {
        api_key: cli.api_key,
        base_url: cli.base_url,
        port: cli.port,
        verbose: cli.verbose,
        debug: cli.debug,
    };

    let state = AppState::from_config(&config);
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, base_url = %config.base_url(), "geminicast listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install ctrl-c handler");
        return;
    }
    tracing::info!("shutdown signal received");
}
