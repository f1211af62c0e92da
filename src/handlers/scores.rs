//! 리더보드 HTTP 핸들러

use crate::leaderboard::ScoreEntry;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json, Response,
    },
};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct ScoresQuery {
    pub limit: Option<usize>,
}

/// 상위 점수 조회
pub async fn list_scores(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScoresQuery>,
) -> Json<Vec<ScoreEntry>> {
    let limit = query
        .limit
        .unwrap_or(state.config.leaderboard.default_limit);
    Json(state.leaderboard.top(limit))
}

/// 점수 등록
pub async fn submit_score(
    State(state): State<Arc<AppState>>,
    Json(entry): Json<ScoreEntry>,
) -> Response {
    if entry.label.trim().is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({ "error": "label must not be empty" })),
        )
            .into_response();
    }

    tracing::info!(label = %entry.label, score = entry.score, "Score submitted");
    state.leaderboard.append(entry.clone());
    (StatusCode::CREATED, Json(entry)).into_response()
}

/// 새 점수 SSE 스트림
pub async fn stream_scores(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let stream = state
        .leaderboard
        .subscribe_new_entries()
        .map(|entry| Event::default().event("score").json_data(entry));
    Sse::new(stream).keep_alive(KeepAlive::default())
}
