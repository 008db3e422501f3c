//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; failures map to 404/400 with a JSON message.

use std::sync::Arc;
use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};

use crate::logic;
use crate::protocol::*;
use crate::state::AppState;

fn not_found(message: String) -> axum::response::Response {
  (StatusCode::NOT_FOUND, Json(serde_json::json!({ "message": message }))).into_response()
}

fn bad_request(message: String) -> axum::response::Response {
  (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "message": message }))).into_response()
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_get_objectives(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(logic::list_objectives(&state))
}

#[instrument(level = "info", skip(state), fields(%q.problem_id))]
pub async fn http_get_problem(
  State(state): State<Arc<AppState>>,
  Query(q): Query<ProblemQuery>,
) -> impl IntoResponse {
  match logic::get_problem(&state, &q.problem_id).await {
    Ok(problem) => Json(problem).into_response(),
    Err(message) => not_found(message),
  }
}

#[instrument(level = "info", skip(state, body), fields(%body.problem_id, answer_len = body.answer.len()))]
pub async fn http_post_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AnswerIn>,
) -> impl IntoResponse {
  match logic::evaluate_answer(&state, &body.problem_id, &body.answer).await {
    Ok(out) => {
      info!(target: "practice", id = %body.problem_id, correct = out.correct, "HTTP answer evaluated");
      Json(out).into_response()
    }
    Err(message) => not_found(message),
  }
}

#[instrument(level = "info", skip(state, body), fields(%body.problem_id, body.level))]
pub async fn http_post_hint(
  State(state): State<Arc<AppState>>,
  Json(body): Json<HintIn>,
) -> impl IntoResponse {
  match logic::consume_hint(&state, &body.problem_id, body.level).await {
    Ok(hint) => {
      info!(target: "practice", id = %body.problem_id, level = body.level, "HTTP hint served");
      Json(hint).into_response()
    }
    Err(message) => bad_request(message),
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_progress(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(logic::progress_overview(&state).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_achievements(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(logic::achievements_overview(&state).await)
}

#[instrument(level = "info", skip(state, body), fields(name_len = body.name.len()))]
pub async fn http_post_student(
  State(state): State<Arc<AppState>>,
  Json(body): Json<StudentIn>,
) -> impl IntoResponse {
  Json(logic::set_student(&state, body).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_reset(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  logic::reset_progress(&state).await;
  Json(serde_json::json!({ "ok": true }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_export(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(logic::export_progress(&state).await)
}

#[instrument(level = "info", fields(expr_len = q.expression.len()))]
pub async fn http_get_plot(Query(q): Query<PlotQuery>) -> impl IntoResponse {
  match logic::sample_plot(&q.expression, q.from, q.to, q.samples) {
    Ok(plot) => Json(plot).into_response(),
    Err(message) => bad_request(message),
  }
}
