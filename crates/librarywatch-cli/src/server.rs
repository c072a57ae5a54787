use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use library_sync_core::{handle_webhook, SharedStore};
use library_sync_models::WebhookPayload;
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/hook", post(hook))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn ping() -> StatusCode {
    StatusCode::OK
}

/// Any well-formed JSON document is acknowledged, recognized event or not.
async fn hook(State(state): State<AppState>, body: Bytes) -> StatusCode {
    let value: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            warn!(operation = "webhook", error = %e, "Rejected webhook with malformed JSON body");
            return StatusCode::BAD_REQUEST;
        }
    };

    let payload = WebhookPayload::from_value(value);
    handle_webhook(&state.store, &payload).await;
    StatusCode::OK
}

/// Serve the router on `listener` until `shutdown` resolves.
pub async fn run(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(operation = "http_listen", address = %addr, "Listening on {}", addr);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
