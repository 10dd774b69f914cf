use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::sync::{RefreshResult, RefreshState};

/// Reject requests that come through Cloudflare Tunnel (public domain).
/// Cloudflare always adds the `CF-Connecting-IP` header to proxied requests.
fn require_local(headers: &HeaderMap) -> Result<(), ApiError> {
    if headers.contains_key("cf-connecting-ip") {
        return Err(ApiError::Forbidden(
            "Refresh is only available on localhost".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct LiveStarted {
    pub status: &'static str,
    pub ticks: u32,
    pub poll_ms: u64,
}

/// Reload both tables now.
pub async fn refresh_now(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<RefreshResult>, ApiError> {
    require_local(&headers)?;

    if state.refresher.is_running().await {
        return Err(ApiError::Conflict("A refresh is already running".to_string()));
    }

    let result = state
        .refresher
        .refresh_once()
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;
    Ok(Json(result))
}

/// Start a bounded burst of fast polls in the background.
pub async fn start_live(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<LiveStarted>), ApiError> {
    require_local(&headers)?;

    if !state.refresher.try_begin_live(state.live_ticks).await {
        return Err(ApiError::Conflict("A live refresh is already running".to_string()));
    }

    info!(
        "Live refresh requested: {} polls every {:?}",
        state.live_ticks, state.live_poll
    );
    let refresher = state.refresher.clone();
    let (poll, ticks) = (state.live_poll, state.live_ticks);
    tokio::spawn(async move {
        if let Err(e) = refresher.run_live(poll, ticks).await {
            warn!("Live refresh ended early: {}", e);
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(LiveStarted {
            status: "started",
            ticks,
            poll_ms: poll.as_millis() as u64,
        }),
    ))
}

pub async fn refresh_status(State(state): State<AppState>) -> Json<RefreshState> {
    Json(state.refresher.state().await)
}
