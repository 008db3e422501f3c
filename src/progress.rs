//! Per-problem attempt tracking and derived metrics.
//!
//! One logical actor mutates this store; every mutation is followed by a
//! full recomputation of the aggregate metrics from the attempt map, so the
//! derived values can never drift from the per-problem state. Problem
//! states move NotStarted → InProgress → Completed and never regress.

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{debug, instrument};

use crate::catalog::Catalog;
use crate::domain::{AchievementStats, AggregateMetrics, ProblemAttempt, StudentInfo};

/// Points deducted per consumed hint level.
pub const HINT_PENALTY: u32 = 5;

#[derive(Clone, Debug, Default)]
pub struct ProgressStore {
  student: Option<StudentInfo>,
  attempts: BTreeMap<String, ProblemAttempt>,
  metrics: AggregateMetrics,
}

impl ProgressStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Rebuild the store from persisted parts (startup restore). Metrics are
  /// recomputed rather than trusted from the snapshot.
  pub fn restore(
    student: Option<StudentInfo>,
    attempts: BTreeMap<String, ProblemAttempt>,
    catalog: &Catalog,
  ) -> Self {
    let mut store = Self { student, attempts, metrics: AggregateMetrics::default() };
    store.recompute_metrics(catalog);
    store
  }

  pub fn student(&self) -> Option<&StudentInfo> {
    self.student.as_ref()
  }

  pub fn set_student(&mut self, student: StudentInfo) {
    self.student = Some(student);
  }

  pub fn attempt(&self, problem_id: &str) -> Option<&ProblemAttempt> {
    self.attempts.get(problem_id)
  }

  pub fn attempts(&self) -> &BTreeMap<String, ProblemAttempt> {
    &self.attempts
  }

  pub fn metrics(&self) -> &AggregateMetrics {
    &self.metrics
  }

  /// Count one verification submission. Allowed in any state; attempts on
  /// an already-completed problem are still counted but cannot change
  /// correctness.
  #[instrument(level = "debug", skip(self, catalog))]
  pub fn record_attempt(&mut self, catalog: &Catalog, problem_id: &str) -> u32 {
    let entry = self.attempts.entry(problem_id.to_string()).or_default();
    entry.attempts += 1;
    let count = entry.attempts;
    self.recompute_metrics(catalog);
    count
  }

  /// Mark a hint level as consumed. Idempotent per level: repeated use of
  /// the same level changes nothing. Returns true when newly consumed.
  #[instrument(level = "debug", skip(self, catalog))]
  pub fn use_hint(&mut self, catalog: &Catalog, problem_id: &str, level: u8) -> bool {
    let entry = self.attempts.entry(problem_id.to_string()).or_default();
    let added = entry.hints_used.insert(level);
    self.recompute_metrics(catalog);
    added
  }

  /// Transition a problem to Completed. `correct` is monotonic; the score
  /// is the base score minus the accumulated hint penalty, floored at 0.
  #[instrument(level = "debug", skip(self, catalog, final_answer))]
  pub fn complete(
    &mut self,
    catalog: &Catalog,
    problem_id: &str,
    base_score: u32,
    final_answer: &str,
  ) -> u32 {
    let entry = self.attempts.entry(problem_id.to_string()).or_default();
    let penalty = entry.hints_used.len() as u32 * HINT_PENALTY;
    entry.correct = true;
    entry.score = base_score.saturating_sub(penalty);
    entry.final_answer = Some(final_answer.to_string());
    entry.completed_at = Some(Utc::now());
    let score = entry.score;
    self.recompute_metrics(catalog);
    debug!(target: "practice", problem_id, base_score, penalty, score, "problem completed");
    score
  }

  /// Clear all attempt state. Metrics fall back to their zero values.
  #[instrument(level = "debug", skip(self, catalog))]
  pub fn reset(&mut self, catalog: &Catalog) {
    self.attempts.clear();
    self.recompute_metrics(catalog);
  }

  /// Full derivation over the attempt map. The per-objective child lists
  /// come from the catalog so a catalog change cannot silently break the
  /// completion rule.
  fn recompute_metrics(&mut self, catalog: &Catalog) {
    let total = catalog.total_problems();
    let completed = self.attempts.values().filter(|a| a.correct).count();
    let percent_completed = if total == 0 {
      0.0
    } else {
      (completed as f64 / total as f64) * 100.0
    };

    let scored: Vec<u32> = self
      .attempts
      .values()
      .filter(|a| a.attempts > 0)
      .map(|a| a.score)
      .collect();
    let average_score = if scored.is_empty() {
      0.0
    } else {
      scored.iter().sum::<u32>() as f64 / scored.len() as f64
    };

    let mut completed_objectives = Vec::new();
    for objective in catalog.objectives() {
      let children = catalog.objective_children(&objective.id);
      if children.is_empty() {
        continue;
      }
      let all_correct = children
        .iter()
        .all(|id| self.attempts.get(*id).map(|a| a.correct).unwrap_or(false));
      if all_correct {
        completed_objectives.push(objective.id.clone());
      }
    }

    self.metrics = AggregateMetrics { percent_completed, average_score, completed_objectives };
  }

  /// Inputs for the achievement predicates. The streak is the best run of
  /// completed problems in catalog order; an attempted-but-incorrect
  /// problem breaks the run, untouched problems are skipped.
  pub fn achievement_stats(&self, catalog: &Catalog) -> AchievementStats {
    let problems_completed = self.attempts.values().filter(|a| a.correct).count();
    let hints_used = self.attempts.values().map(|a| a.hints_used.len()).sum();
    let total_attempts = self.attempts.values().map(|a| a.attempts).sum();

    let mut best = 0usize;
    let mut run = 0usize;
    for id in catalog.ordered_problem_ids() {
      match self.attempts.get(id) {
        Some(a) if a.correct => {
          run += 1;
          best = best.max(run);
        }
        Some(a) if a.attempts > 0 => run = 0,
        _ => {}
      }
    }

    AchievementStats {
      problems_completed,
      objectives_completed: self.metrics.completed_objectives.len(),
      average_score: self.metrics.average_score,
      hints_used,
      total_attempts,
      streak: best,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::builtin_catalog;

  #[test]
  fn hint_usage_is_idempotent_per_level() {
    let cat = builtin_catalog();
    let mut store = ProgressStore::new();
    assert!(store.use_hint(&cat, "I.1.1", 3));
    assert!(!store.use_hint(&cat, "I.1.1", 3));
    assert_eq!(store.attempt("I.1.1").unwrap().hints_used.len(), 1);
    assert!(store.use_hint(&cat, "I.1.1", 4));
    assert_eq!(store.attempt("I.1.1").unwrap().hints_used.len(), 2);
  }

  #[test]
  fn score_law_after_completion() {
    let cat = builtin_catalog();
    let mut store = ProgressStore::new();
    store.use_hint(&cat, "I.1.2", 1);
    store.use_hint(&cat, "I.1.2", 2);
    store.record_attempt(&cat, "I.1.2");
    let score = store.complete(&cat, "I.1.2", 100, "4-2arctan(2)");
    assert_eq!(score, 100 - 2 * HINT_PENALTY);
    let a = store.attempt("I.1.2").unwrap();
    assert_eq!(a.score, 90);
    assert!(a.correct);
    assert!(a.completed_at.is_some());
  }

  #[test]
  fn score_floors_at_zero() {
    let cat = builtin_catalog();
    let mut store = ProgressStore::new();
    for level in 1..=5 {
      store.use_hint(&cat, "I.2.1", level);
    }
    let score = store.complete(&cat, "I.2.1", 10, "pi");
    assert_eq!(score, 0);
  }

  #[test]
  fn correctness_is_monotonic() {
    let cat = builtin_catalog();
    let mut store = ProgressStore::new();
    store.record_attempt(&cat, "I.1.1");
    store.complete(&cat, "I.1.1", 100, "ok");
    store.record_attempt(&cat, "I.1.1");
    store.use_hint(&cat, "I.1.1", 1);
    assert!(store.attempt("I.1.1").unwrap().correct);
  }

  #[test]
  fn objective_completes_only_when_all_children_do() {
    let cat = builtin_catalog();
    let mut store = ProgressStore::new();
    store.record_attempt(&cat, "I.1.1");
    store.complete(&cat, "I.1.1", 100, "a");
    assert!(store.metrics().completed_objectives.is_empty());

    store.record_attempt(&cat, "I.1.2");
    store.complete(&cat, "I.1.2", 100, "b");
    assert_eq!(store.metrics().completed_objectives, vec!["I.1".to_string()]);
    assert_eq!(store.metrics().percent_completed, 25.0);
  }

  #[test]
  fn average_score_covers_attempted_problems_only() {
    let cat = builtin_catalog();
    let mut store = ProgressStore::new();
    store.record_attempt(&cat, "I.1.1");
    store.complete(&cat, "I.1.1", 100, "a");
    store.record_attempt(&cat, "I.1.2"); // attempted, not solved: score 0
    assert_eq!(store.metrics().average_score, 50.0);
  }

  #[test]
  fn reset_clears_everything() {
    let cat = builtin_catalog();
    let mut store = ProgressStore::new();
    store.record_attempt(&cat, "I.1.1");
    store.complete(&cat, "I.1.1", 100, "a");
    store.reset(&cat);
    assert!(store.attempts().is_empty());
    assert_eq!(store.metrics().percent_completed, 0.0);
    assert_eq!(store.metrics().average_score, 0.0);
    assert!(store.metrics().completed_objectives.is_empty());
  }

  #[test]
  fn streak_breaks_on_failed_problem_and_skips_untouched() {
    let cat = builtin_catalog();
    let mut store = ProgressStore::new();
    // I.1.1 and I.1.2 solved, I.2.1 attempted and failed, II.1.1 solved.
    store.complete(&cat, "I.1.1", 100, "a");
    store.complete(&cat, "I.1.2", 100, "b");
    store.record_attempt(&cat, "I.2.1");
    store.complete(&cat, "II.1.1", 100, "c");
    let stats = store.achievement_stats(&cat);
    assert_eq!(stats.streak, 2);
    assert_eq!(stats.problems_completed, 3);
  }
}
