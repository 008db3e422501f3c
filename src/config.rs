//! Loading the optional catalog overlay (problems + hints) from TOML.
//!
//! `CATALOG_CONFIG_PATH` may point at a TOML file that adds problems or
//! describes objectives beyond the built-in curriculum. Config entries are
//! inserted first, so built-ins never overwrite them.

use serde::Deserialize;
use tracing::{error, info};

use crate::catalog::{install_builtin, Catalog};
use crate::domain::{AnswerSpec, Difficulty, Hint, Objective, Problem, Visualization};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct CatalogConfig {
  #[serde(default)]
  pub objectives: Vec<Objective>,
  #[serde(default)]
  pub problems: Vec<ProblemCfg>,
}

/// Problem entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct ProblemCfg {
  pub id: String,
  pub objective: String,
  pub statement: String,
  #[serde(default)] pub method: String,
  #[serde(default)] pub steps: Vec<String>,
  #[serde(default)] pub common_errors: Vec<String>,
  #[serde(default)] pub visualization: Option<Visualization>,
  pub difficulty: Difficulty,
  #[serde(default = "default_max_points")] pub max_points: u32,
  #[serde(default)] pub answer: Option<AnswerSpec>,
  #[serde(default)] pub hints: Vec<Hint>,
}

fn default_max_points() -> u32 { 100 }

/// Attempt to load a `CatalogConfig` from CATALOG_CONFIG_PATH.
/// On any parsing/IO error, returns None and the built-ins stand alone.
pub fn load_catalog_config_from_env() -> Option<CatalogConfig> {
  let path = std::env::var("CATALOG_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<CatalogConfig>(&s) {
      Ok(cfg) => {
        info!(target: "integra_backend", %path, "Loaded catalog config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "integra_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "integra_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

/// Build the runtime catalog: config overlay first, then the built-in
/// curriculum without overwriting.
pub fn build_catalog(cfg: Option<&CatalogConfig>) -> Catalog {
  let mut catalog = Catalog::new();

  if let Some(cfg) = cfg {
    for objective in &cfg.objectives {
      catalog.describe_objective(objective.clone());
    }
    for pc in &cfg.problems {
      if pc.statement.trim().is_empty() {
        error!(target: "practice", id = %pc.id, "Skipping config problem: empty statement.");
        continue;
      }
      let hints = pc.hints.clone();
      if !hints.is_empty() {
        let levels: Vec<u8> = hints.iter().map(|h| h.level).collect();
        if levels != [1, 2, 3, 4, 5] {
          error!(target: "practice", id = %pc.id, ?levels, "Skipping config problem: hint bank must be levels 1..=5 in order.");
          continue;
        }
      }
      let problem = Problem {
        id: pc.id.clone(),
        objective_id: pc.objective.clone(),
        statement: pc.statement.clone(),
        method: pc.method.clone(),
        steps: pc.steps.clone(),
        common_errors: pc.common_errors.clone(),
        visualization: pc.visualization.clone(),
        difficulty: pc.difficulty,
        max_points: pc.max_points,
      };
      if !catalog.insert(problem, pc.answer.clone(), hints) {
        error!(target: "practice", id = %pc.id, "Duplicate config problem id; first entry wins.");
      }
    }
  }

  install_builtin(&mut catalog);
  catalog
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn overlay_problems_win_over_builtins() {
    let toml_src = r#"
      [[objectives]]
      id = "I.1"
      title = "Custom title"
      description = "Custom description"

      [[problems]]
      id = "I.1.1"
      objective = "I.1"
      statement = "Custom statement"
      difficulty = "medium"

      [problems.answer]
      type = "numeric"
      accepted = [2.0, "sqrt(4)"]
      tolerance = 0.05
    "#;
    let cfg: CatalogConfig = toml::from_str(toml_src).unwrap();
    let catalog = build_catalog(Some(&cfg));

    assert_eq!(catalog.problem("I.1.1").unwrap().statement, "Custom statement");
    assert!(matches!(
      catalog.answer_spec("I.1.1"),
      Some(AnswerSpec::Numeric { tolerance, .. }) if *tolerance == 0.05
    ));
    // Built-ins still fill the rest of the curriculum.
    assert_eq!(catalog.total_problems(), 8);
    let obj = catalog.objectives().iter().find(|o| o.id == "I.1").unwrap();
    assert_eq!(obj.title, "Custom title");
  }

  #[test]
  fn malformed_hint_bank_is_skipped() {
    let toml_src = r#"
      [[problems]]
      id = "X.1.1"
      objective = "X.1"
      statement = "Extra problem"
      difficulty = "hard"

      [[problems.hints]]
      level = 2
      text = "only one hint"
      label = "directional"
      deduction = 5
    "#;
    let cfg: CatalogConfig = toml::from_str(toml_src).unwrap();
    let catalog = build_catalog(Some(&cfg));
    assert!(catalog.problem("X.1.1").is_none());
    assert_eq!(catalog.total_problems(), 8);
  }

  #[test]
  fn no_config_yields_builtin_catalog() {
    let catalog = build_catalog(None);
    assert_eq!(catalog.total_problems(), 8);
    assert_eq!(catalog.objectives().len(), 4);
  }
}
