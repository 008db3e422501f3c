//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Submitting answers (dispatch on the problem's answer spec, attempt
//!     accounting, completion with hint penalty)
//!   - Consuming hints (idempotent per level, refused once completed)
//!   - Progress / achievements overviews, student identity, reset, export
//!   - Sampling curve expressions for the visualization front-end

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::achievements;
use crate::domain::{AnswerSpec, FeedbackKind, StudentInfo, ValidationOutcome};
use crate::expr;
use crate::persist::{export_filename, ProgressSnapshot};
use crate::protocol::{
  problem_out, AchievementsOut, AnswerOut, ExportOut, HintLevelOut, HintOut, ObjectiveOut,
  PlotOut, ProblemOut, ProgressOut, StudentIn,
};
use crate::state::AppState;
use crate::validate::{validate_algebraic, validate_keywords, validate_numeric};

const DEFAULT_PLOT_SAMPLES: usize = 200;
const MAX_PLOT_SAMPLES: usize = 2000;

fn dispatch_validation(spec: Option<&AnswerSpec>, answer: &str) -> ValidationOutcome {
  match spec {
    Some(AnswerSpec::Numeric { accepted, tolerance }) => {
      validate_numeric(answer, accepted, *tolerance)
    }
    Some(AnswerSpec::Algebraic { accepted }) => validate_algebraic(answer, accepted),
    Some(AnswerSpec::Keywords { required, optional }) => {
      validate_keywords(answer, required, optional)
    }
    // No spec for this problem: accept any non-empty answer and flag it
    // for manual review instead of failing hard.
    None => {
      if answer.trim().is_empty() {
        ValidationOutcome::new(
          false,
          Some(0),
          FeedbackKind::Incorrect,
          "Please enter an answer before verifying.",
        )
      } else {
        ValidationOutcome::new(
          true,
          Some(100),
          FeedbackKind::ManualReview,
          "Answer recorded. Ask your instructor for the final evaluation.",
        )
      }
    }
  }
}

/// Validate a submission and update progress. The attempt counter always
/// increments, even for unparsable input; a correct verdict completes the
/// problem with the validator's partial score as the base.
#[instrument(level = "info", skip(state, answer), fields(%problem_id, answer_len = answer.len()))]
pub async fn evaluate_answer(
  state: &AppState,
  problem_id: &str,
  answer: &str,
) -> Result<AnswerOut, String> {
  if state.catalog.problem(problem_id).is_none() {
    return Err(format!("Unknown problemId: {problem_id}"));
  }
  let spec = state.catalog.answer_spec(problem_id);
  if spec.is_none() {
    warn!(target: "practice", %problem_id, "No answer spec; falling back to manual review.");
  }
  let outcome = dispatch_validation(spec, answer);

  let (attempts, score, metrics) = {
    let mut store = state.progress.write().await;
    let attempts = store.record_attempt(&state.catalog, problem_id);
    let score = if outcome.correct {
      let base = outcome.partial_score.unwrap_or(100);
      Some(store.complete(&state.catalog, problem_id, base, answer))
    } else {
      outcome.partial_score
    };
    (attempts, score, store.metrics().clone())
  };
  state.persist_progress().await;

  info!(target: "practice", %problem_id, correct = outcome.correct, kind = ?outcome.kind, attempts, "answer evaluated");
  Ok(AnswerOut {
    problem_id: problem_id.to_string(),
    correct: outcome.correct,
    score,
    kind: outcome.kind,
    feedback: outcome.feedback,
    attempts,
    metrics,
  })
}

/// Reveal one hint level, recording it against the score. Refused once the
/// problem is completed; the store itself does not enforce that policy.
#[instrument(level = "info", skip(state), fields(%problem_id, level))]
pub async fn consume_hint(
  state: &AppState,
  problem_id: &str,
  level: u8,
) -> Result<HintOut, String> {
  let hint = state
    .catalog
    .hint(problem_id, level)
    .ok_or_else(|| format!("No hint at level {level} for problem {problem_id}"))?
    .clone();

  let hints_used = {
    let mut store = state.progress.write().await;
    if store.attempt(problem_id).map(|a| a.correct).unwrap_or(false) {
      return Err("Problem already completed; hints are no longer available.".into());
    }
    store.use_hint(&state.catalog, problem_id, level);
    store.attempt(problem_id).map(|a| a.hints_used.len()).unwrap_or(0)
  };
  state.persist_progress().await;

  info!(target: "practice", %problem_id, level, hints_used, "hint revealed");
  Ok(HintOut {
    problem_id: problem_id.to_string(),
    level: hint.level,
    text: hint.text,
    label: hint.label,
    deduction: hint.deduction,
    hints_used,
  })
}

pub async fn get_problem(state: &AppState, problem_id: &str) -> Result<ProblemOut, String> {
  let problem = state
    .catalog
    .problem(problem_id)
    .ok_or_else(|| format!("Unknown problemId: {problem_id}"))?;
  let hint_levels = state
    .catalog
    .hints(problem_id)
    .iter()
    .map(|h| HintLevelOut { level: h.level, label: h.label, deduction: h.deduction })
    .collect();
  let attempt = { state.progress.read().await.attempt(problem_id).cloned() };
  Ok(problem_out(problem, hint_levels, attempt))
}

pub fn list_objectives(state: &AppState) -> Vec<ObjectiveOut> {
  state
    .catalog
    .objectives()
    .iter()
    .map(|o| ObjectiveOut {
      id: o.id.clone(),
      title: o.title.clone(),
      description: o.description.clone(),
      problem_ids: state
        .catalog
        .objective_children(&o.id)
        .into_iter()
        .map(String::from)
        .collect(),
    })
    .collect()
}

pub async fn progress_overview(state: &AppState) -> ProgressOut {
  let store = state.progress.read().await;
  ProgressOut {
    student: store.student().cloned(),
    attempts: store.attempts().clone(),
    metrics: store.metrics().clone(),
  }
}

pub async fn achievements_overview(state: &AppState) -> AchievementsOut {
  let stats = {
    let store = state.progress.read().await;
    store.achievement_stats(&state.catalog)
  };
  AchievementsOut { stats, achievements: achievements::evaluate(&stats) }
}

#[instrument(level = "info", skip(state, input), fields(name_len = input.name.len()))]
pub async fn set_student(state: &AppState, input: StudentIn) -> StudentInfo {
  let student = StudentInfo {
    name: input.name,
    id: input.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
    local_center: input.local_center,
    session_start: Utc::now(),
  };
  {
    let mut store = state.progress.write().await;
    store.set_student(student.clone());
  }
  state.persist_progress().await;
  student
}

#[instrument(level = "info", skip(state))]
pub async fn reset_progress(state: &AppState) {
  {
    let mut store = state.progress.write().await;
    store.reset(&state.catalog);
  }
  state.persist_progress().await;
  info!(target: "practice", "progress reset");
}

pub async fn export_progress(state: &AppState) -> ExportOut {
  let snapshot = {
    let store = state.progress.read().await;
    ProgressSnapshot::of(&store)
  };
  ExportOut { filename: export_filename(&snapshot), document: snapshot }
}

/// Sample an expression for the visualization front-end using the same
/// constrained evaluator as the numeric answer path. Non-finite samples
/// (poles, domain gaps) are dropped rather than reported as errors.
#[instrument(level = "debug", skip(expression), fields(expr_len = expression.len()))]
pub fn sample_plot(
  expression: &str,
  from: f64,
  to: f64,
  samples: Option<usize>,
) -> Result<PlotOut, String> {
  if !from.is_finite() || !to.is_finite() || from >= to {
    return Err("Invalid plot domain: 'from' must be less than 'to'.".into());
  }
  let n = samples.unwrap_or(DEFAULT_PLOT_SAMPLES).clamp(2, MAX_PLOT_SAMPLES);
  let step = (to - from) / (n - 1) as f64;
  let mut points = Vec::with_capacity(n);
  for i in 0..n {
    let x = from + step * i as f64;
    if let Ok(y) = expr::evaluate_at(expression, x) {
      points.push((x, y));
    }
  }
  Ok(PlotOut { expression: expression.to_string(), points })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::state::AppState;
  use std::path::PathBuf;
  use tokio::sync::RwLock;

  fn test_state() -> AppState {
    let dir = std::env::temp_dir().join(format!("integra-test-{}", Uuid::new_v4()));
    AppState {
      catalog: crate::catalog::builtin_catalog(),
      progress: RwLock::new(crate::progress::ProgressStore::new()),
      storage_path: PathBuf::from(dir).join("snapshot.json"),
    }
  }

  #[tokio::test]
  async fn correct_answer_completes_with_hint_penalty() {
    let state = test_state();
    consume_hint(&state, "I.2.1", 1).await.unwrap();
    let out = evaluate_answer(&state, "I.2.1", "pi").await.unwrap();
    assert!(out.correct);
    assert_eq!(out.score, Some(95));
    assert_eq!(out.attempts, 1);
    assert_eq!(out.metrics.percent_completed, 12.5);
  }

  #[tokio::test]
  async fn invalid_format_still_counts_the_attempt() {
    let state = test_state();
    let out = evaluate_answer(&state, "I.1.2", "no clue").await.unwrap();
    assert!(!out.correct);
    assert_eq!(out.kind, FeedbackKind::InvalidFormat);
    assert_eq!(out.score, None);
    assert_eq!(out.attempts, 1);

    // The student can always retry; nothing is lost.
    let out = evaluate_answer(&state, "I.1.2", "4-2arctan(2)").await.unwrap();
    assert!(out.correct);
    assert_eq!(out.attempts, 2);
  }

  #[tokio::test]
  async fn hint_level_is_idempotent_for_scoring() {
    let state = test_state();
    consume_hint(&state, "I.1.1", 2).await.unwrap();
    let again = consume_hint(&state, "I.1.1", 2).await.unwrap();
    assert_eq!(again.hints_used, 1);
  }

  #[tokio::test]
  async fn hints_are_refused_after_completion() {
    let state = test_state();
    evaluate_answer(&state, "I.2.1", "3.1416").await.unwrap();
    assert!(consume_hint(&state, "I.2.1", 1).await.is_err());
  }

  #[tokio::test]
  async fn unknown_problem_is_an_error_not_a_crash() {
    let state = test_state();
    assert!(evaluate_answer(&state, "IX.9.9", "42").await.is_err());
    assert!(get_problem(&state, "IX.9.9").await.is_err());
  }

  #[tokio::test]
  async fn objectives_list_children_in_order() {
    let state = test_state();
    let objectives = list_objectives(&state);
    assert_eq!(objectives.len(), 4);
    assert_eq!(objectives[0].problem_ids, vec!["I.1.1", "I.1.2"]);
  }

  #[test]
  fn plot_sampling_drops_non_finite_samples() {
    let out = sample_plot("sqrt(x)", -1.0, 1.0, Some(201)).unwrap();
    // The negative half of the domain evaluates to NaN and is absent.
    assert!(!out.points.is_empty());
    assert!(out.points.len() <= 101);
    assert!(out.points.iter().all(|(x, y)| *x >= 0.0 && y.is_finite()));
  }

  #[test]
  fn plot_rejects_bad_domain() {
    assert!(sample_plot("x", 1.0, 1.0, None).is_err());
    assert!(sample_plot("x", 2.0, 1.0, None).is_err());
  }
}
