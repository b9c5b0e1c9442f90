//! HTTP gateway for Baton sessions.
//!
//! A thin JSON layer over the [`SessionManager`]: one route to send a
//! message, one to reset, one to read a session back, plus a health
//! check. Session ids are caller-chosen path segments, so external
//! systems can address sessions without a create step.
//!
//! Error mapping mirrors the runtime's failure contract: a rolled-back
//! turn surfaces as `503` with a retryable body, an unknown session as
//! `404`, and everything else as `500`.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use baton_agent::SessionManager;
use baton_core::{Error, Message};

type SharedManager = Arc<SessionManager>;

/// Build the gateway router.
pub fn build_router(manager: SharedManager) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/sessions/{id}/messages", post(message_handler))
        .route("/v1/sessions/{id}/reset", post(reset_handler))
        .route("/v1/sessions/{id}", get(session_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(manager)
}

/// Bind and serve until the process is stopped.
pub async fn serve(manager: SharedManager, host: &str, port: u16) -> std::io::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Gateway listening");
    axum::serve(listener, build_router(manager)).await
}

/// Error body shared by all failing responses.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    retryable: bool,
}

struct ApiError(Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, retryable) = match &self.0 {
            Error::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, true),
            Error::UnknownSession(_) => (StatusCode::NOT_FOUND, false),
            Error::UnknownAgent(_) | Error::Config { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, false)
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, false),
        };
        let body = ErrorBody {
            error: self.0.to_string(),
            retryable,
        };
        (status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "baton-gateway",
    }))
}

#[derive(Debug, Deserialize)]
struct MessageRequest {
    message: String,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    session_id: String,
    agent: String,
    reply: String,
}

async fn message_handler(
    State(manager): State<SharedManager>,
    Path(id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let turn = manager.process(&id, &request.message).await?;
    Ok(Json(MessageResponse {
        session_id: id,
        agent: turn.agent,
        reply: turn.reply,
    }))
}

#[derive(Debug, Serialize)]
struct ResetResponse {
    session_id: String,
    agent: String,
}

async fn reset_handler(
    State(manager): State<SharedManager>,
    Path(id): Path<String>,
) -> Result<Json<ResetResponse>, ApiError> {
    manager.reset(&id).await?;
    Ok(Json(ResetResponse {
        session_id: id,
        agent: manager.entry_agent().to_string(),
    }))
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    session_id: String,
    active_agent: String,
    messages: Vec<Message>,
}

async fn session_handler(
    State(manager): State<SharedManager>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = manager.snapshot(&id).await?;
    Ok(Json(SessionResponse {
        session_id: id,
        active_agent: session.active_agent,
        messages: session.messages,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use baton_agent::session_manager_from_config;
    use baton_agent::test_helpers::{
        SequentialMockService, make_text_response, make_tool_call, make_tool_call_response,
    };
    use baton_config::AppConfig;
    use baton_core::{EventBus, ProviderError};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app(service: SequentialMockService) -> Router {
        let config = AppConfig::default();
        let bus = Arc::new(EventBus::default());
        let manager = session_manager_from_config(&config, Arc::new(service), bus).unwrap();
        build_router(Arc::new(manager))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_message(id: &str, text: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/v1/sessions/{id}/messages"))
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({"message": text}).to_string(),
            ))
            .unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = app(SequentialMockService::single_text("unused"));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn message_roundtrip_reports_active_agent() {
        let app = app(SequentialMockService::new(vec![
            make_tool_call_response(
                vec![make_tool_call("transfer_to_sales", serde_json::json!({}))],
                "",
            ),
            make_text_response("Sales speaking."),
        ]));

        let response = app.oneshot(post_message("s1", "quote please")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["agent"], "sales");
        assert_eq!(body["reply"], "Sales speaking.");
        assert_eq!(body["session_id"], "s1");
    }

    #[tokio::test]
    async fn provider_failure_maps_to_503() {
        let app = app(SequentialMockService::failing(ProviderError::Network(
            "down".into(),
        )));

        let response = app.oneshot(post_message("s1", "hello")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(body["retryable"], true);
    }

    #[tokio::test]
    async fn unknown_session_maps_to_404() {
        let app = app(SequentialMockService::single_text("unused"));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/sessions/ghost")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reset_endpoint_clears_history() {
        let service = SequentialMockService::new(vec![make_text_response("Hi.")]);
        let config = AppConfig::default();
        let bus = Arc::new(EventBus::default());
        let manager =
            Arc::new(session_manager_from_config(&config, Arc::new(service), bus).unwrap());
        let app = build_router(manager.clone());

        app.clone()
            .oneshot(post_message("s1", "hello"))
            .await
            .unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/sessions/s1/reset")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(manager.history("s1").await.unwrap().is_empty());
    }
}
