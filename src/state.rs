//! Application state: the read-only catalog and the single-student
//! progress store.
//!
//! All store mutations are synchronous read-modify-write operations behind
//! one RwLock; there is exactly one logical actor, so no finer coordination
//! is needed. Persistence to disk happens as a fire-and-forget side effect
//! after each mutation and never blocks or fails a state transition.

use std::collections::HashMap;
use std::path::PathBuf;

use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::catalog::Catalog;
use crate::config::{build_catalog, load_catalog_config_from_env};
use crate::persist::{self, ProgressSnapshot};
use crate::progress::ProgressStore;

pub struct AppState {
    pub catalog: Catalog,
    pub progress: RwLock<ProgressStore>,
    pub storage_path: PathBuf,
}

impl AppState {
    /// Build state from env: load the catalog overlay, install built-ins,
    /// and restore any persisted progress snapshot.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_catalog_config_from_env();
        let catalog = build_catalog(cfg.as_ref());

        // Inventory summary by objective and difficulty.
        let mut count_by_objective: HashMap<String, usize> = HashMap::new();
        for p in catalog.problems() {
            *count_by_objective.entry(p.objective_id.clone()).or_default() += 1;
        }
        for (objective, count) in &count_by_objective {
            info!(target: "practice", %objective, problems = count, "Startup catalog inventory");
        }

        let storage_path = persist::storage_path_from_env();
        let progress = match persist::load(&storage_path) {
            Some(snap) => ProgressStore::restore(snap.student, snap.attempts, &catalog),
            None => ProgressStore::new(),
        };

        Self { catalog, progress: RwLock::new(progress), storage_path }
    }

    /// Snapshot the current store and queue a best-effort disk write.
    /// Call after every mutating operation.
    pub async fn persist_progress(&self) {
        let snapshot = {
            let store = self.progress.read().await;
            ProgressSnapshot::of(&store)
        };
        persist::spawn_save(self.storage_path.clone(), snapshot);
    }
}
