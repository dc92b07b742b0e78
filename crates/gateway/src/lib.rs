//! HTTP API for the persona chat backend.
//!
//! Routes:
//! - `POST /chat`: `{"message": …}` in, `{"response": …}` out, session by cookie
//! - `GET /health`: liveness and version
//!
//! Built on Axum; CORS is limited to the configured front-end origins.

pub mod bootstrap;
pub mod session;

use axum::extract::DefaultBodyLimit;
use axum::extract::rejection::JsonRejection;
use axum::http::header::{CONTENT_TYPE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, Method};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info, warn};

use persona_agent::ChatOrchestrator;
use persona_config::AppConfig;
use persona_core::error::Error;
use persona_core::session::SessionId;

pub use bootstrap::build_orchestrator;
pub use session::SessionCookie;

/// Request bodies above this size are rejected.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub orchestrator: ChatOrchestrator,
    pub cookie: SessionCookie,
    pub allowed_origins: Vec<String>,
    pub trace_requests: bool,
}

impl GatewayState {
    pub fn new(orchestrator: ChatOrchestrator, config: &AppConfig) -> Self {
        Self {
            orchestrator,
            cookie: SessionCookie::new(&config.session.cookie_name, config.session.secure_cookie),
            allowed_origins: config.gateway.allowed_origins(),
            trace_requests: config.gateway.trace_requests,
        }
    }
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
///
/// Layers: 1 MB body limit, CORS for the configured origins, and HTTP trace
/// logging when enabled.
pub fn build_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.allowed_origins);
    let trace = state.trace_requests;

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors);

    if trace {
        router.layer(tower_http::trace::TraceLayer::new_for_http())
    } else {
        router
    }
}

/// CORS for the front-end origins. Credentials are allowed so the session
/// cookie travels with cross-origin requests.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let orchestrator = build_orchestrator(&config).await?;
    let state = Arc::new(GatewayState::new(orchestrator, &config));
    if state.allowed_origins.is_empty() {
        warn!("No DEVELOPMENT_URL or PRODUCTION_URL set; cross-origin requests will be refused");
    }
    let app = build_router(state);

    info!(
        addr = %addr,
        environment = %config.gateway.environment,
        base_url = config.gateway.base_url().unwrap_or("-"),
        "Gateway starting"
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Serialize, Deserialize)]
struct ChatResponse {
    response: String,
}

#[derive(Serialize, Deserialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

/// Body of every 500; the cause only goes to the log.
const UPSTREAM_FAILURE: &str = "upstream service failed";

/// Map an orchestration failure to a status code. Bad input is the client's
/// fault; everything else is reported as a server error.
fn chat_error(e: Error) -> Response {
    match e {
        Error::Validation(message) => error_response(StatusCode::BAD_REQUEST, message),
        other => {
            error!(error = %other, upstream = other.is_upstream(), "Chat processing failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, UPSTREAM_FAILURE.to_string())
        }
    }
}

async fn chat_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let (session, issued) = match state.cookie.read(&headers) {
        Some(id) => (id, false),
        None => (SessionId::new(), true),
    };

    let mut response = match payload {
        Err(rejection) => {
            // Oversized bodies keep their 413; every other body problem is a 400.
            let status = match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::BAD_REQUEST,
            };
            warn!(error = %rejection.body_text(), %status, "Rejected chat request body");
            error_response(status, rejection.body_text())
        }
        Ok(Json(request)) => {
            info!(session = %session, message_len = request.message.len(), "Chat message received");
            match state.orchestrator.handle(&request.message, &session).await {
                Ok(response) => Json(ChatResponse { response }).into_response(),
                Err(e) => chat_error(e),
            }
        }
    };

    if issued {
        match HeaderValue::from_str(&state.cookie.set_cookie(&session)) {
            Ok(value) => {
                response.headers_mut().insert(SET_COOKIE, value);
            }
            Err(e) => warn!(error = %e, "Could not encode session cookie"),
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use persona_core::error::{MemoryError, ProviderError};
    use persona_core::provider::{GenerateRequest, GenerateResponse, Provider};
    use persona_core::retrieval::{SimilarityDocument, VectorQuery, VectorStore};
    use persona_memory::InMemorySessionBackend;
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Replies "generic" to classifier prompts and echoes a fixed answer otherwise.
    struct EchoProvider {
        fail: bool,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(
            &self,
            request: GenerateRequest,
        ) -> Result<GenerateResponse, ProviderError> {
            *self.calls.lock().unwrap() += 1;
            if self.fail {
                return Err(ProviderError::AuthenticationFailed("bad key".into()));
            }
            let text = if request.prompt.starts_with("You are conversation classifier") {
                "generic"
            } else {
                "I only talk about **Naisarg**."
            };
            Ok(GenerateResponse {
                text: text.into(),
                model: request.model,
                usage: None,
            })
        }
    }

    struct EmptyStore;

    #[async_trait]
    impl VectorStore for EmptyStore {
        fn name(&self) -> &str {
            "empty"
        }

        async fn search(&self, _: &VectorQuery) -> Result<Vec<SimilarityDocument>, MemoryError> {
            Ok(vec![])
        }
    }

    fn test_state(fail: bool) -> SharedState {
        let mut config = AppConfig::default();
        config.gateway.development_url = Some("http://localhost:3000".into());
        let provider = Arc::new(EchoProvider {
            fail,
            calls: Mutex::new(0),
        });
        let orchestrator = bootstrap::assemble(
            &config,
            provider,
            Arc::new(InMemorySessionBackend::new()),
            Arc::new(EmptyStore),
        );
        Arc::new(GatewayState::new(orchestrator, &config))
    }

    fn chat_request(body: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = build_router(test_state(false));

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = json_body(response).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn chat_issues_session_cookie() {
        let app = build_router(test_state(false));

        let response = app
            .oneshot(chat_request(r#"{"message": "What can you do?"}"#, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("session="));
        assert!(cookie.contains("HttpOnly"));

        let body: ChatResponse = json_body(response).await;
        assert_eq!(body.response, "I only talk about <b>Naisarg</b>.");
    }

    #[tokio::test]
    async fn existing_session_is_reused() {
        let state = test_state(false);
        let app = build_router(state.clone());

        let response = app
            .clone()
            .oneshot(chat_request(r#"{"message": "hi"}"#, Some("session=known-id")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(SET_COOKIE).is_none());

        let transcript = state
            .orchestrator
            .contexts()
            .transcript(&SessionId::from("known-id"))
            .await
            .unwrap();
        assert!(transcript.as_str().starts_with("User: hi\nBot: "));
    }

    #[tokio::test]
    async fn empty_message_is_bad_request() {
        let app = build_router(test_state(false));
        let response = app
            .oneshot(chat_request(r#"{"message": "  "}"#, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = json_body(response).await;
        assert!(body.error.contains("empty"));
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let app = build_router(test_state(false));
        let response = app.oneshot(chat_request("{not json", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let app = build_router(test_state(false));
        let response = app
            .oneshot(chat_request(r#"{"text": "wrong field"}"#, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upstream_failure_is_server_error() {
        let app = build_router(test_state(true));
        let response = app
            .oneshot(chat_request(r#"{"message": "hello"}"#, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = json_body(response).await;
        assert_eq!(body.error, UPSTREAM_FAILURE);
    }

    #[tokio::test]
    async fn unreachable_model_does_not_expose_api_key() {
        let mut config = AppConfig::default();
        config.api_key = Some("SECRET-GOOGLE-KEY-123".into());
        config.model.api_url = Some("http://127.0.0.1:1/v1beta".into());
        let orchestrator = bootstrap::assemble(
            &config,
            persona_providers::build_from_config(&config),
            Arc::new(InMemorySessionBackend::new()),
            Arc::new(EmptyStore),
        );
        let app = build_router(Arc::new(GatewayState::new(orchestrator, &config)));

        let response = app
            .oneshot(chat_request(r#"{"message": "hi"}"#, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8_lossy(&body);
        assert!(!body.contains("SECRET-GOOGLE-KEY-123"));
        assert!(body.contains(UPSTREAM_FAILURE));
    }

    #[tokio::test]
    async fn cors_allows_configured_origin_only() {
        let app = build_router(test_state(false));
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/chat")
            .header("origin", "http://localhost:3000")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("http://localhost:3000")
        );

        let app = build_router(test_state(false));
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/chat")
            .header("origin", "http://evil.example")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert!(response.headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let app = build_router(test_state(false));
        let big = format!(r#"{{"message": "{}"}}"#, "a".repeat(MAX_BODY_BYTES + 1));
        let response = app.oneshot(chat_request(&big, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
