use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::ingest::RecordSet;
use crate::ladder::{board_view, compute, ladder_view, BoardView, DualSnapshot, LadderView, RecencySettings};
use crate::models::{Arm, LadderEvent, LadderKey, RankedLadder, Revision, SlotKey};

// ── Params ───────────────────────────────────────────────────────

/// Overrides for the configured recency window.
#[derive(Debug, Default, Deserialize)]
pub struct RecencyParams {
    pub window_days: Option<u32>,
    pub show_badges: Option<bool>,
}

impl RecencyParams {
    fn settings(&self, state: &AppState) -> RecencySettings {
        let defaults = RecencySettings::from(state.ladder.as_ref());
        RecencySettings {
            window_days: self.window_days.unwrap_or(defaults.window_days),
            show_badges: self.show_badges.unwrap_or(defaults.show_badges),
        }
    }
}

// ── Responses ────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct BoardResponse {
    #[serde(flatten)]
    pub board: BoardView,
    pub revision: Revision,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct LadderResponse {
    #[serde(flatten)]
    pub ladder: LadderView,
    pub cutoff: Option<DateTime<Utc>>,
    pub revision: Revision,
}

/// Ranked ladders plus the event maps a renderer needs to draw deltas and
/// badges on its own.
#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    pub ladders: Vec<RankedLadder>,
    pub last_events: BTreeMap<SlotKey, LadderEvent>,
    pub last_jumps: BTreeMap<SlotKey, u32>,
    pub cutoff: Option<DateTime<Utc>>,
    pub revision: Revision,
}

// ── Helpers ──────────────────────────────────────────────────────

async fn current_records(state: &AppState) -> Result<Arc<RecordSet>, ApiError> {
    state
        .refresher
        .records()
        .await
        .ok_or_else(|| ApiError::Unavailable("No records loaded yet".to_string()))
}

fn dual_for(state: &AppState, records: &RecordSet, settings: RecencySettings) -> DualSnapshot {
    compute(
        &state.ladder,
        &records.competitors,
        &records.matches,
        settings,
        Utc::now(),
    )
}

/// Accepts "right", "left" or their first letter, in any case.
fn parse_arm(raw: &str) -> Option<Arm> {
    match raw.to_ascii_lowercase().as_str() {
        "right" | "r" => Some(Arm::Right),
        "left" | "l" => Some(Arm::Left),
        _ => None,
    }
}

/// Resolve a ladder from URL segments, matching the group case-insensitively.
fn resolve_ladder(state: &AppState, group: &str, arm: &str) -> Result<LadderKey, ApiError> {
    let arm = parse_arm(arm).ok_or_else(|| ApiError::BadRequest(format!("Unknown arm: {}", arm)))?;
    let group = state
        .ladder
        .weight_groups
        .iter()
        .find(|g| g.eq_ignore_ascii_case(group))
        .ok_or_else(|| ApiError::NotFound(format!("Ladder {} {}", group, arm)))?;
    Ok(LadderKey::new(group.clone(), arm))
}

// ── Handlers ─────────────────────────────────────────────────────

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn board(
    State(state): State<AppState>,
    Query(params): Query<RecencyParams>,
) -> Result<Json<BoardResponse>, ApiError> {
    let records = current_records(&state).await?;
    let dual = dual_for(&state, &records, params.settings(&state));

    Ok(Json(BoardResponse {
        board: board_view(&dual, &state.ladder),
        revision: records.revision.clone(),
        loaded_at: records.loaded_at,
    }))
}

pub async fn ladder(
    State(state): State<AppState>,
    Path((group, arm)): Path<(String, String)>,
    Query(params): Query<RecencyParams>,
) -> Result<Json<LadderResponse>, ApiError> {
    let key = resolve_ladder(&state, &group, &arm)?;
    let records = current_records(&state).await?;
    let dual = dual_for(&state, &records, params.settings(&state));

    let view = ladder_view(&dual, &key, None)
        .ok_or_else(|| ApiError::NotFound(format!("Ladder {}", key)))?;

    Ok(Json(LadderResponse {
        ladder: view,
        cutoff: dual.cutoff,
        revision: records.revision.clone(),
    }))
}

pub async fn snapshot(
    State(state): State<AppState>,
    Query(params): Query<RecencyParams>,
) -> Result<Json<SnapshotResponse>, ApiError> {
    let records = current_records(&state).await?;
    let DualSnapshot { now, cutoff, .. } = dual_for(&state, &records, params.settings(&state));

    Ok(Json(SnapshotResponse {
        ladders: now.ladders,
        last_events: now.last_events,
        last_jumps: now.last_jumps,
        cutoff,
        revision: records.revision.clone(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::build_router;
    use crate::api::routes::test_support::{get_json, loaded_state, state};
    use axum::http::StatusCode;
    use serde_json::Value;

    fn ids(ladder: &Value) -> Vec<String> {
        ladder["standings"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_parse_arm() {
        assert_eq!(parse_arm("Right"), Some(Arm::Right));
        assert_eq!(parse_arm("l"), Some(Arm::Left));
        assert_eq!(parse_arm("LEFT"), Some(Arm::Left));
        assert_eq!(parse_arm("both"), None);
        assert_eq!(parse_arm("rightish"), None);
    }

    #[tokio::test]
    async fn test_health() {
        let (status, json) = get_json(build_router(state()), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_board_unavailable_before_first_load() {
        let (status, json) = get_json(build_router(state()), "/api/board").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"]["code"], "UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_board_lists_ladders_in_display_order() {
        let app = build_router(loaded_state().await);
        let (status, json) = get_json(app, "/api/board").await;

        assert_eq!(status, StatusCode::OK);
        let ladders = json["ladders"].as_array().unwrap();
        assert_eq!(ladders.len(), 8);
        assert_eq!(ladders[0]["key"], "Open Right");
        assert_eq!(ladders[1]["key"], "Open Left");
        assert_eq!(ladders[7]["key"], "u60kg Left");
        assert_eq!(ladders[0]["label"], "Open Right Arm");
        assert!(json["revision"].is_string());
        assert!(json["loaded_at"].is_string());
        assert_eq!(json["settings"]["window_days"], 30);
    }

    #[tokio::test]
    async fn test_board_inactive_competitor_left_off() {
        let app = build_router(loaded_state().await);
        let (_, json) = get_json(app, "/api/board").await;

        let open_right = &json["ladders"][0];
        assert_eq!(open_right["total"], 3);
        assert!(!ids(open_right).contains(&"dave".to_string()));
    }

    #[tokio::test]
    async fn test_ladder_full_standings() {
        let app = build_router(loaded_state().await);
        let (status, json) = get_json(app, "/api/ladders/u60kg/right").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["key"], "u60kg Right");
        assert_eq!(json["champion"], "bob");
        assert_eq!(ids(&json), vec!["bob", "alice"]);
    }

    #[tokio::test]
    async fn test_ladder_group_is_case_insensitive() {
        let app = build_router(loaded_state().await);
        let (status, json) = get_json(app, "/api/ladders/OPEN/L").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["key"], "Open Left");
    }

    #[tokio::test]
    async fn test_ladder_unknown_group() {
        let app = build_router(loaded_state().await);
        let (status, json) = get_json(app, "/api/ladders/u99kg/left").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_ladder_unknown_arm() {
        let app = build_router(loaded_state().await);
        let (status, _) = get_json(app, "/api/ladders/u60kg/both").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_old_match_outside_window_has_no_badge() {
        let app = build_router(loaded_state().await);
        let (_, json) = get_json(app, "/api/ladders/u60kg/right").await;

        let bob = &json["standings"][0];
        assert_eq!(bob["delta"], 0);
        assert!(bob["badge"].is_null());
    }

    #[tokio::test]
    async fn test_wide_window_shows_takeover() {
        let app = build_router(loaded_state().await);
        let (_, json) = get_json(app, "/api/ladders/u60kg/right?window_days=100000").await;

        let bob = &json["standings"][0];
        assert_eq!(bob["was_rank"], 2);
        assert_eq!(bob["delta"], 1);
        assert_eq!(bob["badge"]["kind"], "takeover");
        assert_eq!(bob["badge"]["up"], 1);
        assert!(json["cutoff"].is_string());
    }

    #[tokio::test]
    async fn test_badges_hidden_by_query() {
        let app = build_router(loaded_state().await);
        let (_, json) = get_json(app, "/api/ladders/u60kg/right?window_days=100000&show_badges=false").await;

        assert!(json["cutoff"].is_null());
        for standing in json["standings"].as_array().unwrap() {
            assert_eq!(standing["delta"], 0);
            assert!(standing["badge"].is_null());
        }
    }

    #[tokio::test]
    async fn test_snapshot_event_maps() {
        let app = build_router(loaded_state().await);
        let (status, json) = get_json(app, "/api/snapshot").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["last_events"]["u60kg Right:bob"]["kind"], "takeover");
        assert_eq!(json["last_events"]["u60kg Right:alice"]["kind"], "lost");
        assert_eq!(json["last_jumps"]["u60kg Right:bob"], 1);
        // Left ladders never saw the match
        assert!(json["last_events"]["u60kg Left:bob"].is_null());
    }
}
