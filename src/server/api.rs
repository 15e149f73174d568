use crate::agent::ChatAgent;
use crate::cli::Args;
use crate::error::ChatError;
use crate::models::api::{
    ChatRequest,
    ChatResponse,
    ErrorResponse,
    HistoryQuery,
    HistoryRecord,
    HistoryResponse,
    DEFAULT_USER_ID,
};
use std::error::Error;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use axum::{
    body::Bytes,
    extract::{ Query, Request, State },
    http::StatusCode,
    middleware::{ self, Next },
    response::{ IntoResponse, Response },
    routing::{ get, post },
    Json,
    Router,
};
use governor::{ RateLimiter, Quota, state::{ InMemoryState, NotKeyed }, clock::DefaultClock };
use serde::Serialize;
use serde_json::Value as JsonValue;
use tower_http::cors::{ Any, CorsLayer };
use uuid::Uuid;
use log::{ info, warn, error };

type GlobalLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Serialize)]
struct ReloadResponse {
    success: bool,
    message: String,
}

#[derive(Clone)]
pub struct AppState {
    agent: Arc<ChatAgent>,
    limiter: Option<Arc<GlobalLimiter>>,
}

impl AppState {
    /// `rate_limit_per_second == 0` disables request limiting.
    pub fn new(agent: Arc<ChatAgent>, rate_limit_per_second: u32) -> Self {
        let limiter = NonZeroU32::new(rate_limit_per_second).map(|rate|
            Arc::new(RateLimiter::direct(Quota::per_second(rate)))
        );
        Self { agent, limiter }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/chat-history", get(chat_history_handler))
        .route("/api/reload-prompts", get(reload_prompts_handler))
        .route("/health", get(|| async { "ok" }))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(cors)
        .with_state(state)
}

pub async fn start_http_server(
    agent: Arc<ChatAgent>,
    args: Args
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = args.server_addr.parse::<SocketAddr>()?;
    let app = build_router(AppState::new(agent, args.rate_limit_per_second));

    if args.enable_tls {
        let (cert_path, key_path) = match (&args.tls_cert_path, &args.tls_key_path) {
            (Some(cert), Some(key)) => (cert, key),
            _ => {
                error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                return Err("Missing TLS certificate or key path".into());
            }
        };
        info!("TLS enabled. Loading certificate from '{}' and key from '{}'", cert_path, key_path);
        let tls_config = axum_server::tls_rustls::RustlsConfig
            ::from_pem_file(cert_path, key_path).await?;

        info!("Starting HTTPS API server on: https://{}", addr);
        axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()).await?;
    } else {
        let listener = tokio::net::TcpListener
            ::bind(addr).await
            .map_err(|e| format!("Failed to bind HTTP server to {}: {}", addr, e))?;
        info!("Starting HTTP API server on: http://{}", addr);
        axum::serve(listener, app.into_make_service()).await?;
    }

    Ok(())
}

async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if let Some(limiter) = &state.limiter {
        if limiter.check().is_err() {
            warn!("Global request rate limit exceeded for {}", req.uri().path());
            return (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ErrorResponse::new("Too many requests")),
            ).into_response();
        }
    }
    next.run(req).await
}

fn parse_chat_request(body: &[u8]) -> Result<ChatRequest, ChatError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ChatError::InvalidRequest("No data provided"));
    }
    let value: JsonValue = serde_json
        ::from_slice(body)
        .map_err(|_| ChatError::InvalidRequest("Invalid JSON body"))?;

    match &value {
        JsonValue::Null => Err(ChatError::InvalidRequest("No data provided")),
        JsonValue::Object(map) if map.is_empty() => {
            Err(ChatError::InvalidRequest("No data provided"))
        }
        JsonValue::Object(_) =>
            serde_json
                ::from_value(value)
                .map_err(|_| ChatError::InvalidRequest("Invalid chat request")),
        _ => Err(ChatError::InvalidRequest("Invalid JSON body")),
    }
}

async fn chat_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match parse_chat_request(&body) {
        Ok(req) => req,
        Err(e) => {
            return e.into_response();
        }
    };

    match state.agent.process_message(request).await {
        Ok(reply) => {
            let payload = ChatResponse {
                success: true,
                response: reply.message_text.clone(),
                message: reply.message_text,
                message_id: Uuid::new_v4().to_string(),
                response_id: reply.continuation_id,
                audio: reply.audio,
            };
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(e) => {
            if !matches!(e, ChatError::InvalidRequest(_)) {
                error!("Chat API error: {}", e);
            }
            e.into_response()
        }
    }
}

async fn chat_history_handler(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>
) -> Response {
    let user_id = query.user_id.as_deref().unwrap_or(DEFAULT_USER_ID);

    match state.agent.chat_history(user_id).await {
        Ok(turns) => {
            let messages = turns.iter().map(HistoryRecord::from).collect();
            (StatusCode::OK, Json(HistoryResponse { success: true, messages })).into_response()
        }
        Err(e) => {
            error!("Chat history API error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to load chat history")),
            ).into_response()
        }
    }
}

async fn reload_prompts_handler(State(state): State<AppState>) -> Response {
    match state.agent.reload_prompts_if_changed().await {
        Ok(changed) => {
            let message = if changed { "Prompts reloaded" } else { "Prompts unchanged" };
            (
                StatusCode::OK,
                Json(ReloadResponse { success: true, message: message.into() }),
            ).into_response()
        }
        Err(e) => {
            error!("Prompt reload failed: {}", e);
            (
                StatusCode::BAD_REQUEST,
                Json(ReloadResponse { success: false, message: "Reload errors".into() }),
            ).into_response()
        }
    }
}
