//! HTTP 服务层
//!
//! 对外暴露 Anthropic Messages 兼容面。`POST /v1/messages` 的处理流程：
//!
//! 1. 手工解析请求体（格式错误返回 400，而不是 axum 默认的 422）
//! 2. 从签名缓存补注 tool_use block 缺失的 thoughtSignature
//! 3. 翻译为 Gemini generateContent 请求
//! 4. 选择传输路径：带工具且原始 HTTP 客户端可用时走原始路径
//!    （保真），否则降级到 SDK 风格路径
//! 5. 翻译响应并缓存新产生的 thought signature

use crate::config::ProxyConfig;
use crate::models::anthropic::AnthropicRequest;
use crate::models::gemini::{GenerateContentRequest, GenerationConfig};
use crate::providers::{GeminiBackend, GeminiHttpClient, NativeGeminiClient};
use crate::signature::ThoughtSignatureCache;
use crate::translator::{
    system_instruction, to_anthropic_response, to_gemini_contents, to_gemini_tools,
};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// 共享应用状态
#[derive(Clone)]
pub struct AppState {
    /// SDK 风格客户端（总是可用，作为降级路径）
    native: Arc<NativeGeminiClient>,
    /// 原始 HTTP 客户端（配置了凭证才有）
    raw_http: Option<Arc<GeminiHttpClient>>,
    /// thought signature 缓存，进程生命周期
    signatures: Arc<ThoughtSignatureCache>,
    /// 是否输出原始载荷调试日志
    debug: bool,
}

impl AppState {
    /// 仅 SDK 路径（无原始 HTTP 凭证，签名在上游侧丢失）
    pub fn new(api_key: String) -> Self {
        Self {
            native: Arc::new(NativeGeminiClient::new(api_key)),
            raw_http: None,
            signatures: Arc::new(ThoughtSignatureCache::new()),
            debug: false,
        }
    }

    /// 双路径：带工具的请求走原始 HTTP，保留 thoughtSignature
    pub fn with_api_key(api_key: String) -> Self {
        Self {
            raw_http: Some(Arc::new(GeminiHttpClient::new(api_key.clone()))),
            ..Self::new(api_key)
        }
    }

    pub fn from_config(config: &ProxyConfig) -> Self {
        let base_url = config.base_url();
        Self {
            native: Arc::new(NativeGeminiClient::with_base_url(
                config.api_key.clone(),
                base_url.clone(),
            )),
            raw_http: Some(Arc::new(GeminiHttpClient::with_base_url(
                config.api_key.clone(),
                base_url,
            ))),
            signatures: Arc::new(ThoughtSignatureCache::new()),
            debug: config.debug,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[cfg(test)]
    fn with_backends(
        native: NativeGeminiClient,
        raw_http: Option<GeminiHttpClient>,
    ) -> Self {
        Self {
            native: Arc::new(native),
            raw_http: raw_http.map(Arc::new),
            signatures: Arc::new(ThoughtSignatureCache::new()),
            debug: false,
        }
    }
}

/// 构建应用路由
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/messages", post(handle_messages))
        .route("/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

/// Anthropic 风格错误响应体
fn error_response(status: StatusCode, error_type: &str, message: String) -> Response {
    let body = json!({
        "type": "error",
        "error": {"type": error_type, "message": message},
    });
    (status, Json(body)).into_response()
}

async fn handle_messages(State(state): State<AppState>, body: Bytes) -> Response {
    // axum 的 Json 提取器对语义错误返回 422，这里统一为 400
    let mut request: AnthropicRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            tracing::warn!(error = %err, "rejecting malformed request body");
            return error_response(
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                format!("invalid request body: {err}"),
            );
        }
    };

    state.signatures.inject_request(&mut request);

    let contents = match to_gemini_contents(&request.messages) {
        Ok(contents) => contents,
        Err(err) => {
            tracing::error!(error = %err, "request translation failed");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "api_error",
                err.to_string(),
            );
        }
    };

    let tools = request
        .tools
        .as_deref()
        .and_then(to_gemini_tools);

    let generation_config = if request.max_tokens.is_some() || request.temperature.is_some() {
        Some(GenerationConfig {
            max_output_tokens: request.max_tokens,
            temperature: request.temperature,
        })
    } else {
        None
    };

    let gemini_request = GenerateContentRequest {
        contents,
        tools,
        system_instruction: request.system.as_ref().and_then(system_instruction),
        generation_config,
    };

    if state.debug {
        tracing::debug!(
            payload = %serde_json::to_string(&gemini_request).unwrap_or_default(),
            "outbound gemini request"
        );
    }

    // 路径选择：带工具且原始 HTTP 可用时保真优先，否则降级
    let has_tools = gemini_request.tools.is_some();
    let backend: &dyn GeminiBackend = match (&state.raw_http, has_tools) {
        (Some(raw), true) => {
            tracing::debug!("using raw HTTP path");
            raw.as_ref()
        }
        _ => {
            tracing::debug!(has_tools, "using native path");
            state.native.as_ref()
        }
    };

    let gemini_response = match backend.generate_content(&request.model, &gemini_request).await {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(error = %err, model = %request.model, "gemini call failed");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "api_error",
                err.to_string(),
            );
        }
    };

    if state.debug {
        tracing::debug!(
            payload = %serde_json::to_string(&gemini_response).unwrap_or_default(),
            "inbound gemini response"
        );
    }

    let response = to_anthropic_response(&gemini_response, &request.model);
    state.signatures.cache_response(&response);

    tracing::info!(
        model = %request.model,
        blocks = response.content.len(),
        input_tokens = response.usage.input_tokens,
        output_tokens = response.usage.output_tokens,
        "request completed"
    );

    (StatusCode::OK, Json(response)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use wiremock::matchers::{body_partial_json, header as wm_header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn dual_path_state(base_url: &str) -> AppState {
        AppState::with_backends(
            NativeGeminiClient::with_base_url("test-key".to_string(), base_url.to_string()),
            Some(GeminiHttpClient::with_base_url(
                "test-key".to_string(),
                base_url.to_string(),
            )),
        )
    }

    fn post_messages(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/v1/messages")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn text_ok_template() -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hello!"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 3, "candidatesTokenCount": 2, "totalTokenCount": 5}
        }))
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(dual_path_state("http://unused.invalid"));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_json_returns_400() {
        let app = router(dual_path_state("http://unused.invalid"));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/messages")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["type"], "error");
        assert_eq!(body["error"]["type"], "invalid_request_error");
    }

    #[tokio::test]
    async fn test_happy_path_text_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-pro:generateContent"))
            .respond_with(text_ok_template())
            .expect(1)
            .mount(&server)
            .await;

        let app = router(dual_path_state(&server.uri()));
        let response = app
            .oneshot(post_messages(serde_json::json!({
                "model": "gemini-2.5-pro",
                "messages": [{"role": "user", "content": "Hi"}]
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["type"], "message");
        assert_eq!(body["role"], "assistant");
        assert_eq!(body["content"][0]["text"], "Hello!");
        assert_eq!(body["stop_reason"], "end_turn");
        assert_eq!(body["usage"]["input_tokens"], 3);
        assert_eq!(body["usage"]["output_tokens"], 2);
    }

    #[tokio::test]
    async fn test_unknown_tool_use_id_returns_500_naming_id() {
        let app = router(dual_path_state("http://unused.invalid"));
        let response = app
            .oneshot(post_messages(serde_json::json!({
                "model": "gemini-2.5-pro",
                "messages": [{
                    "role": "user",
                    "content": [{"type": "tool_result", "tool_use_id": "toolu_ghost", "content": "x"}]
                }]
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(
            body["error"]["message"],
            "tool_result references unknown tool_use_id: toolu_ghost"
        );
    }

    #[tokio::test]
    async fn test_tool_request_takes_raw_http_path() {
        let server = MockServer::start().await;
        // 原始路径用 ?key= 认证；命中即证明走了原始 HTTP
        Mock::given(method("POST"))
            .and(query_param("key", "test-key"))
            .respond_with(text_ok_template())
            .expect(1)
            .mount(&server)
            .await;

        let app = router(dual_path_state(&server.uri()));
        let response = app
            .oneshot(post_messages(serde_json::json!({
                "model": "gemini-2.5-pro",
                "messages": [{"role": "user", "content": "weather?"}],
                "tools": [{
                    "name": "get_weather",
                    "input_schema": {"type": "object", "properties": {}}
                }]
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_toolless_request_takes_native_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(wm_header("x-goog-api-key", "test-key"))
            .respond_with(text_ok_template())
            .expect(1)
            .mount(&server)
            .await;

        let app = router(dual_path_state(&server.uri()));
        let response = app
            .oneshot(post_messages(serde_json::json!({
                "model": "gemini-2.5-pro",
                "messages": [{"role": "user", "content": "Hi"}]
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_raw_client_degrades_to_native() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(wm_header("x-goog-api-key", "test-key"))
            .respond_with(text_ok_template())
            .expect(1)
            .mount(&server)
            .await;

        let state = AppState::with_backends(
            NativeGeminiClient::with_base_url("test-key".to_string(), server.uri()),
            None,
        );
        let response = router(state)
            .oneshot(post_messages(serde_json::json!({
                "model": "gemini-2.5-pro",
                "messages": [{"role": "user", "content": "weather?"}],
                "tools": [{
                    "name": "get_weather",
                    "input_schema": {"type": "object", "properties": {}}
                }]
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upstream_error_returns_500() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let app = router(dual_path_state(&server.uri()));
        let response = app
            .oneshot(post_messages(serde_json::json!({
                "model": "gemini-2.5-pro",
                "messages": [{"role": "user", "content": "Hi"}]
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("quota exceeded"));
    }

    /// 两轮对话：第一轮响应带 thoughtSignature，第二轮客户端重放时
    /// 不带签名，代理应从缓存补回并在出站请求中携带。
    #[tokio::test]
    async fn test_signature_cached_then_injected_across_turns() {
        let server = MockServer::start().await;

        // 第一轮：上游返回带签名的 function call
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{"parts": [{"text": "weather?"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{
                        "functionCall": {"name": "get_weather", "args": {"location": "SF"}},
                        "thoughtSignature": "sig_secret"
                    }]},
                    "finishReason": "STOP"
                }]
            })))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;

        let app = router(dual_path_state(&server.uri()));

        let tools = serde_json::json!([{
            "name": "get_weather",
            "input_schema": {"type": "object", "properties": {"location": {"type": "string"}}}
        }]);

        let first = app
            .clone()
            .oneshot(post_messages(serde_json::json!({
                "model": "gemini-2.5-pro",
                "messages": [{"role": "user", "content": "weather?"}],
                "tools": tools
            })))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let first_body = json_body(first).await;
        let tool_use_id = first_body["content"][0]["id"].as_str().unwrap().to_string();
        assert!(tool_use_id.starts_with("toolu_"));

        // 第二轮：出站请求必须重新携带缓存的签名
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "contents": [
                    {"parts": [{"text": "weather?"}]},
                    {"parts": [{"thoughtSignature": "sig_secret"}]},
                    {"parts": [{"functionResponse": {
                        "name": "get_weather",
                        "response": {"result": "72 and sunny"}
                    }}]}
                ]
            })))
            .respond_with(text_ok_template())
            .expect(1)
            .mount(&server)
            .await;

        let second = app
            .oneshot(post_messages(serde_json::json!({
                "model": "gemini-2.5-pro",
                "messages": [
                    {"role": "user", "content": "weather?"},
                    {"role": "assistant", "content": [{
                        "type": "tool_use",
                        "id": tool_use_id,
                        "name": "get_weather",
                        "input": {"location": "SF"}
                    }]},
                    {"role": "user", "content": [{
                        "type": "tool_result",
                        "tool_use_id": tool_use_id,
                        "content": "72 and sunny"
                    }]}
                ],
                "tools": tools
            })))
            .await
            .unwrap();

        assert_eq!(second.status(), StatusCode::OK);
    }
}
