//! Static achievement definitions and their unlock predicates.
//!
//! Unlock status is never stored: it is recomputed from the current
//! `AchievementStats` on every query, so achievements cannot regress
//! inconsistently or drift from actual progress.

use serde::Serialize;

use crate::domain::{AchievementStats, AchievementTier};

pub struct AchievementDef {
  pub id: &'static str,
  pub title: &'static str,
  pub description: &'static str,
  pub icon: &'static str,
  pub tier: AchievementTier,
  pub hidden: bool,
  pub criterion: fn(&AchievementStats) -> bool,
}

/// Achievement as reported to the client.
#[derive(Clone, Debug, Serialize)]
pub struct AchievementStatus {
  pub id: String,
  pub title: String,
  pub description: String,
  pub icon: String,
  pub tier: AchievementTier,
  pub hidden: bool,
  pub unlocked: bool,
}

pub fn achievement_defs() -> &'static [AchievementDef] {
  use AchievementTier::*;
  &[
    AchievementDef {
      id: "first-step",
      title: "First Step",
      description: "Complete your first problem",
      icon: "🎯",
      tier: Bronze,
      hidden: false,
      criterion: |s| s.problems_completed >= 1,
    },
    AchievementDef {
      id: "beginner",
      title: "Beginner",
      description: "Complete a full objective",
      icon: "📚",
      tier: Bronze,
      hidden: false,
      criterion: |s| s.objectives_completed >= 1,
    },
    AchievementDef {
      id: "dedicated-student",
      title: "Dedicated Student",
      description: "Complete 4 problems",
      icon: "📖",
      tier: Silver,
      hidden: false,
      criterion: |s| s.problems_completed >= 4,
    },
    AchievementDef {
      id: "integration-master",
      title: "Integration Master",
      description: "Complete every objective",
      icon: "🏆",
      tier: Gold,
      hidden: false,
      criterion: |s| s.objectives_completed >= 4,
    },
    AchievementDef {
      id: "perfectionist",
      title: "Perfectionist",
      description: "Complete every problem",
      icon: "💎",
      tier: Platinum,
      hidden: false,
      criterion: |s| s.problems_completed >= 8,
    },
    AchievementDef {
      id: "bright-student",
      title: "Bright Student",
      description: "Reach an average score above 80",
      icon: "⭐",
      tier: Silver,
      hidden: false,
      criterion: |s| s.average_score >= 80.0,
    },
    AchievementDef {
      id: "math-genius",
      title: "Math Genius",
      description: "Reach an average score above 95",
      icon: "🌟",
      tier: Gold,
      hidden: false,
      criterion: |s| s.average_score >= 95.0,
    },
    AchievementDef {
      id: "self-reliant",
      title: "Self-Reliant",
      description: "Complete 3 problems without using hints",
      icon: "🧠",
      tier: Gold,
      hidden: false,
      criterion: |s| s.problems_completed >= 3 && s.hints_used == 0,
    },
    AchievementDef {
      id: "independent-thinker",
      title: "Independent Thinker",
      description: "Complete a problem without using hints",
      icon: "💡",
      tier: Silver,
      hidden: false,
      criterion: |s| s.problems_completed >= 1 && s.hints_used == 0,
    },
    AchievementDef {
      id: "persistent",
      title: "Persistent",
      description: "Make 10 attempts in total",
      icon: "💪",
      tier: Bronze,
      hidden: false,
      criterion: |s| s.total_attempts >= 10,
    },
    AchievementDef {
      id: "tireless",
      title: "Tireless",
      description: "Make 25 attempts in total",
      icon: "🔥",
      tier: Silver,
      hidden: false,
      criterion: |s| s.total_attempts >= 25,
    },
    AchievementDef {
      id: "hot-streak",
      title: "Hot Streak",
      description: "Complete 3 problems in a row without failing",
      icon: "🔥",
      tier: Gold,
      hidden: true,
      criterion: |s| s.streak >= 3,
    },
  ]
}

/// Evaluate every definition against the current stats.
pub fn evaluate(stats: &AchievementStats) -> Vec<AchievementStatus> {
  achievement_defs()
    .iter()
    .map(|d| AchievementStatus {
      id: d.id.to_string(),
      title: d.title.to_string(),
      description: d.description.to_string(),
      icon: d.icon.to_string(),
      tier: d.tier,
      hidden: d.hidden,
      unlocked: (d.criterion)(stats),
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::AchievementStats;

  fn unlocked_ids(stats: &AchievementStats) -> Vec<String> {
    evaluate(stats).into_iter().filter(|a| a.unlocked).map(|a| a.id).collect()
  }

  #[test]
  fn nothing_unlocked_at_start() {
    assert!(unlocked_ids(&AchievementStats::default()).is_empty());
  }

  #[test]
  fn first_completion_unlocks_first_step_and_hint_free_bonus() {
    let stats = AchievementStats { problems_completed: 1, ..Default::default() };
    let ids = unlocked_ids(&stats);
    assert!(ids.contains(&"first-step".to_string()));
    assert!(ids.contains(&"independent-thinker".to_string()));
  }

  #[test]
  fn hint_usage_blocks_self_reliant() {
    let stats =
      AchievementStats { problems_completed: 3, hints_used: 1, ..Default::default() };
    let ids = unlocked_ids(&stats);
    assert!(!ids.contains(&"self-reliant".to_string()));
    assert!(!ids.contains(&"independent-thinker".to_string()));
  }

  #[test]
  fn full_run_unlocks_everything() {
    let stats = AchievementStats {
      problems_completed: 8,
      objectives_completed: 4,
      average_score: 96.0,
      hints_used: 0,
      total_attempts: 25,
      streak: 8,
    };
    assert_eq!(unlocked_ids(&stats).len(), achievement_defs().len());
  }

  #[test]
  fn status_is_pure_function_of_stats() {
    let stats = AchievementStats { problems_completed: 4, ..Default::default() };
    assert_eq!(unlocked_ids(&stats), unlocked_ids(&stats));
  }
}
