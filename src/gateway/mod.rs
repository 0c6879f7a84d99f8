//! The minimal HTTP gateway (spec §6, collaborator): `GET /health` and
//! `POST /webhook`, built with `axum` as the teacher builds its HTTP API.

use crate::runtime::Runtime;
use anyhow::Result;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

async fn health_handler() -> Json<Value> {
    Json(json!({"status": "ok", "service": "bareclaw"}))
}

async fn webhook_handler(body: axum::body::Bytes) -> Json<Value> {
    tracing::debug!("gateway: received webhook payload ({} bytes)", body.len());
    Json(json!({"received": true}))
}

fn build_router() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/webhook", post(webhook_handler))
}

/// Bind and serve the gateway. `runtime` is accepted for parity with the
/// other entry points (and future expansion) but the two-endpoint contract
/// in spec §6 does not itself drive the agent loop.
pub async fn serve(_runtime: Runtime, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("gateway listening on {bind}");
    axum::serve(listener, build_router()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_returns_ok_status() {
        let app = build_router();
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn webhook_accepts_post_and_returns_received() {
        let app = build_router();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let app = build_router();
        let response = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
