//! Best-effort progress persistence.
//!
//! A JSON snapshot is written to local disk as a side effect of every store
//! mutation. The write is fire-and-forget: it runs on a spawned task, goes
//! through a temp file + rename, and any failure is logged and swallowed.
//! The in-memory store stays the source of truth for the session.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::domain::{AggregateMetrics, ProblemAttempt, StudentInfo};
use crate::progress::ProgressStore;

/// Namespace for the on-disk snapshot; bump on incompatible layout changes.
pub const STORAGE_NAMESPACE: &str = "integra-progress-v1";

#[derive(Debug, Error)]
pub enum PersistError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("serialization error: {0}")]
  Serde(#[from] serde_json::Error),
}

/// The durable representation of a session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressSnapshot {
  #[serde(default)] pub student: Option<StudentInfo>,
  #[serde(default)] pub attempts: BTreeMap<String, ProblemAttempt>,
  #[serde(default)] pub metrics: AggregateMetrics,
  pub updated_at: DateTime<Utc>,
}

impl ProgressSnapshot {
  pub fn of(store: &ProgressStore) -> Self {
    Self {
      student: store.student().cloned(),
      attempts: store.attempts().clone(),
      metrics: store.metrics().clone(),
      updated_at: Utc::now(),
    }
  }
}

/// Resolve the snapshot path from `PROGRESS_PATH` or the default location.
pub fn storage_path_from_env() -> PathBuf {
  std::env::var("PROGRESS_PATH")
    .map(PathBuf::from)
    .unwrap_or_else(|_| PathBuf::from(format!("./data/{STORAGE_NAMESPACE}.json")))
}

/// Load the snapshot at startup. Missing or unreadable files are not errors;
/// the session simply starts fresh.
pub fn load(path: &Path) -> Option<ProgressSnapshot> {
  let raw = match std::fs::read_to_string(path) {
    Ok(s) => s,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
    Err(e) => {
      error!(target: "persist", path = %path.display(), error = %e, "failed to read snapshot");
      return None;
    }
  };
  match serde_json::from_str::<ProgressSnapshot>(&raw) {
    Ok(snap) => {
      info!(target: "persist", path = %path.display(), updated_at = %snap.updated_at, "loaded progress snapshot");
      Some(snap)
    }
    Err(e) => {
      error!(target: "persist", path = %path.display(), error = %e, "failed to parse snapshot; starting fresh");
      None
    }
  }
}

async fn write_snapshot(path: &Path, snapshot: &ProgressSnapshot) -> Result<(), PersistError> {
  if let Some(parent) = path.parent() {
    tokio::fs::create_dir_all(parent).await?;
  }
  let json = serde_json::to_vec_pretty(snapshot)?;
  let tmp = path.with_extension("json.tmp");
  tokio::fs::write(&tmp, &json).await?;
  tokio::fs::rename(&tmp, path).await?;
  Ok(())
}

/// Queue a snapshot write. Never blocks the caller; never surfaces a failure.
pub fn spawn_save(path: PathBuf, snapshot: ProgressSnapshot) {
  tokio::spawn(async move {
    match write_snapshot(&path, &snapshot).await {
      Ok(()) => debug!(target: "persist", path = %path.display(), "snapshot written"),
      Err(e) => {
        error!(target: "persist", path = %path.display(), error = %e, "snapshot write failed; in-memory state unaffected")
      }
    }
  });
}

/// Filename for the downloadable export: student id + current date.
pub fn export_filename(snapshot: &ProgressSnapshot) -> String {
  let student_id = snapshot
    .student
    .as_ref()
    .map(|s| s.id.as_str())
    .unwrap_or("anonymous");
  format!("progress-{}-{}.json", student_id, Utc::now().format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::builtin_catalog;

  fn sample_store() -> ProgressStore {
    let cat = builtin_catalog();
    let mut store = ProgressStore::new();
    store.record_attempt(&cat, "I.1.1");
    store.use_hint(&cat, "I.1.1", 1);
    store.complete(&cat, "I.1.1", 100, "done");
    store
  }

  #[test]
  fn snapshot_round_trips_through_json() {
    let snap = ProgressSnapshot::of(&sample_store());
    let json = serde_json::to_string(&snap).unwrap();
    let back: ProgressSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back.attempts.len(), 1);
    let a = &back.attempts["I.1.1"];
    assert!(a.correct);
    assert_eq!(a.score, 95);
    assert_eq!(a.hints_used.len(), 1);
  }

  #[tokio::test]
  async fn write_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snap.json");
    let snap = ProgressSnapshot::of(&sample_store());
    write_snapshot(&path, &snap).await.unwrap();
    let loaded = load(&path).expect("snapshot should load");
    assert_eq!(loaded.attempts.len(), 1);
  }

  #[test]
  fn missing_file_loads_as_none() {
    assert!(load(Path::new("./definitely/not/here.json")).is_none());
  }

  #[test]
  fn export_filename_uses_student_id_and_date() {
    let mut store = sample_store();
    store.set_student(StudentInfo {
      name: "Ada".into(),
      id: "s-042".into(),
      local_center: None,
      session_start: Utc::now(),
    });
    let name = export_filename(&ProgressSnapshot::of(&store));
    assert!(name.starts_with("progress-s-042-"));
    assert!(name.ends_with(".json"));
  }
}
