//! Domain models used by the backend: catalog entries, answer specs, hints,
//! per-problem attempt state, and derived metrics.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How hard a catalog problem is, as shown to the student.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  Medium,
  MediumHard,
  Hard,
  VeryHard,
}

/// Which visualization the front-end should render for a problem.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisualizationKind {
  Plot2d,
  Plot2dWithLimits,
  Solid3d,
  Region2dAndSolid3d,
  Curve2dWithLength,
  ParametricCurve,
  PolarWithArea,
}

/// Visualization descriptor: the front-end samples `expressions` itself
/// (through the plot endpoint) over the optional domain.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Visualization {
  pub kind: VisualizationKind,
  pub expressions: Vec<String>,
  #[serde(default)] pub domain: Option<(f64, f64)>,
}

/// An accepted answer value: either a numeric literal or a decorated
/// numeric string that must itself be extracted before comparison.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AcceptedValue {
  Number(f64),
  Text(String),
}

/// Per-problem validation configuration. Static, read-only at runtime.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnswerSpec {
  Numeric {
    accepted: Vec<AcceptedValue>,
    #[serde(default = "default_tolerance")]
    tolerance: f64,
  },
  Algebraic {
    accepted: Vec<String>,
  },
  Keywords {
    #[serde(default)] required: Vec<String>,
    #[serde(default)] optional: Vec<String>,
  },
}

fn default_tolerance() -> f64 { 0.01 }

/// Utility label shown next to a hint level.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HintLabel {
  Directional,
  Explanatory,
  Detailed,
  VisualAid,
  FullSolution,
}

/// One of the five ordered hint levels for a problem.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Hint {
  pub level: u8,
  pub text: String,
  pub label: HintLabel,
  pub deduction: u32,
}

/// A catalog problem. Statements and steps are display text; the validation
/// core only consumes the id and its `AnswerSpec`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Problem {
  pub id: String,
  pub objective_id: String,
  pub statement: String,
  pub method: String,
  #[serde(default)] pub steps: Vec<String>,
  #[serde(default)] pub common_errors: Vec<String>,
  #[serde(default)] pub visualization: Option<Visualization>,
  pub difficulty: Difficulty,
  pub max_points: u32,
}

/// A curriculum unit. Child problem ids are derived from the catalog's
/// problem order, never duplicated here.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Objective {
  pub id: String,
  pub title: String,
  pub description: String,
}

/// Per-problem attempt state. Created lazily on first interaction.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProblemAttempt {
  pub attempts: u32,
  /// Hint levels consumed; a set so each level is penalized at most once.
  pub hints_used: BTreeSet<u8>,
  pub correct: bool,
  pub score: u32,
  #[serde(default)] pub final_answer: Option<String>,
  #[serde(default)] pub completed_at: Option<DateTime<Utc>>,
}

/// Who is working through the curriculum.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StudentInfo {
  pub name: String,
  pub id: String,
  #[serde(default)] pub local_center: Option<String>,
  pub session_start: DateTime<Utc>,
}

/// Derived metrics. Never stored independently of the attempt map;
/// recomputed from scratch on every mutation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AggregateMetrics {
  pub percent_completed: f64,
  pub average_score: f64,
  pub completed_objectives: Vec<String>,
}

/// Validation result classification, part of the error taxonomy.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
  ExactMatch,
  Equivalent,
  CloseButInexact,
  Incorrect,
  InvalidFormat,
  ManualReview,
}

/// What a validator returns. Failures stay inside this value; no validator
/// error crosses the validation boundary as a fault.
#[derive(Clone, Debug, Serialize)]
pub struct ValidationOutcome {
  pub correct: bool,
  /// Absent when the input could not be parsed at all.
  pub partial_score: Option<u32>,
  pub kind: FeedbackKind,
  pub feedback: String,
}

impl ValidationOutcome {
  pub fn new(
    correct: bool,
    partial_score: Option<u32>,
    kind: FeedbackKind,
    feedback: impl Into<String>,
  ) -> Self {
    Self { correct, partial_score, kind, feedback: feedback.into() }
  }
}

/// Inputs to achievement unlock predicates.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct AchievementStats {
  pub problems_completed: usize,
  pub objectives_completed: usize,
  pub average_score: f64,
  pub hints_used: usize,
  pub total_attempts: u32,
  pub streak: usize,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AchievementTier {
  Bronze,
  Silver,
  Gold,
  Platinum,
}
