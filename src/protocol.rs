//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::achievements::AchievementStatus;
use crate::domain::{
    AchievementStats, AggregateMetrics, Difficulty, FeedbackKind, HintLabel, Problem,
    ProblemAttempt, StudentInfo, Visualization,
};
use crate::persist::ProgressSnapshot;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    ListObjectives,
    GetProblem {
        #[serde(rename = "problemId")]
        problem_id: String,
    },
    SubmitAnswer {
        #[serde(rename = "problemId")]
        problem_id: String,
        answer: String,
    },
    Hint {
        #[serde(rename = "problemId")]
        problem_id: String,
        level: u8,
    },
    Progress,
    Achievements,
    SetStudent {
        name: String,
        #[serde(default)]
        id: Option<String>,
        #[serde(default, rename = "localCenter")]
        local_center: Option<String>,
    },
    ResetProgress,
    ExportProgress,
    Plot {
        expression: String,
        from: f64,
        to: f64,
        #[serde(default)]
        samples: Option<usize>,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Objectives {
        objectives: Vec<ObjectiveOut>,
    },
    Problem {
        problem: ProblemOut,
    },
    AnswerResult(AnswerOut),
    Hint(HintOut),
    Progress(ProgressOut),
    Achievements(AchievementsOut),
    Student {
        student: StudentInfo,
    },
    ProgressReset {
        ok: bool,
    },
    Export(ExportOut),
    Plot(PlotOut),
    Error {
        message: String,
    },
}

/// Objective DTO; child problem ids come from the catalog derivation.
#[derive(Debug, Serialize)]
pub struct ObjectiveOut {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "problemIds")]
    pub problem_ids: Vec<String>,
}

/// Hint level as listed on a problem: label and cost, but not the text.
/// The text is only revealed (and penalized) through the hint endpoint.
#[derive(Debug, Serialize)]
pub struct HintLevelOut {
    pub level: u8,
    pub label: HintLabel,
    pub deduction: u32,
}

/// DTO used by both WS and HTTP for problem delivery.
#[derive(Debug, Serialize)]
pub struct ProblemOut {
    pub id: String,
    #[serde(rename = "objectiveId")]
    pub objective_id: String,
    pub statement: String,
    pub method: String,
    pub steps: Vec<String>,
    #[serde(rename = "commonErrors")]
    pub common_errors: Vec<String>,
    pub visualization: Option<Visualization>,
    pub difficulty: Difficulty,
    #[serde(rename = "maxPoints")]
    pub max_points: u32,
    #[serde(rename = "hintLevels")]
    pub hint_levels: Vec<HintLevelOut>,
    pub attempt: Option<ProblemAttempt>,
}

pub fn problem_out(
    problem: &Problem,
    hint_levels: Vec<HintLevelOut>,
    attempt: Option<ProblemAttempt>,
) -> ProblemOut {
    ProblemOut {
        id: problem.id.clone(),
        objective_id: problem.objective_id.clone(),
        statement: problem.statement.clone(),
        method: problem.method.clone(),
        steps: problem.steps.clone(),
        common_errors: problem.common_errors.clone(),
        visualization: problem.visualization.clone(),
        difficulty: problem.difficulty,
        max_points: problem.max_points,
        hint_levels,
        attempt,
    }
}

#[derive(Debug, Serialize)]
pub struct AnswerOut {
    #[serde(rename = "problemId")]
    pub problem_id: String,
    pub correct: bool,
    /// Score recorded for the attempt (hint penalty applied when correct).
    pub score: Option<u32>,
    pub kind: FeedbackKind,
    pub feedback: String,
    pub attempts: u32,
    pub metrics: AggregateMetrics,
}

#[derive(Debug, Serialize)]
pub struct HintOut {
    #[serde(rename = "problemId")]
    pub problem_id: String,
    pub level: u8,
    pub text: String,
    pub label: HintLabel,
    pub deduction: u32,
    #[serde(rename = "hintsUsed")]
    pub hints_used: usize,
}

#[derive(Debug, Serialize)]
pub struct ProgressOut {
    pub student: Option<StudentInfo>,
    pub attempts: BTreeMap<String, ProblemAttempt>,
    pub metrics: AggregateMetrics,
}

#[derive(Debug, Serialize)]
pub struct AchievementsOut {
    pub stats: AchievementStats,
    pub achievements: Vec<AchievementStatus>,
}

#[derive(Debug, Serialize)]
pub struct ExportOut {
    pub filename: String,
    pub document: ProgressSnapshot,
}

#[derive(Debug, Serialize)]
pub struct PlotOut {
    pub expression: String,
    /// Finite samples only; poles and domain gaps are simply absent.
    pub points: Vec<(f64, f64)>,
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct ProblemQuery {
    #[serde(rename = "problemId")]
    pub problem_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AnswerIn {
    #[serde(rename = "problemId")]
    pub problem_id: String,
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct HintIn {
    #[serde(rename = "problemId")]
    pub problem_id: String,
    pub level: u8,
}

#[derive(Debug, Deserialize)]
pub struct StudentIn {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "localCenter")]
    pub local_center: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlotQuery {
    pub expression: String,
    pub from: f64,
    pub to: f64,
    #[serde(default)]
    pub samples: Option<usize>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
