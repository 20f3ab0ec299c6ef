use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use shared::error::{BotError, ErrorCode};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::warn;

use crate::{app_state::AppState, dispatch::dispatch_update, telegram::Update};

pub(crate) const WEBHOOK_PATH: &str = "/webhook";
pub(crate) const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";
const MAX_UPDATE_BYTES: usize = 1024 * 1024;

pub(crate) fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(WEBHOOK_PATH, post(receive_update))
        .layer(RequestBodyLimitLayer::new(MAX_UPDATE_BYTES))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

/// Accepts the update and answers right away; the update itself is handled
/// on its own task so a slow render never holds up Telegram's delivery.
async fn receive_update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(update): Json<Update>,
) -> Result<StatusCode, (StatusCode, Json<BotError>)> {
    if let Some(expected) = state.webhook_secret.as_deref() {
        let presented = headers
            .get(SECRET_HEADER)
            .and_then(|value| value.to_str().ok());
        if presented != Some(expected) {
            warn!(update_id = update.update_id, "webhook secret mismatch");
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(BotError::new(ErrorCode::Transport, "invalid webhook secret")),
            ));
        }
    }

    tokio::spawn(async move {
        dispatch_update(&state.bot, state.transport.as_ref(), update).await;
    });
    Ok(StatusCode::OK)
}

#[cfg(test)]
#[path = "tests/webhook_tests.rs"]
mod tests;
