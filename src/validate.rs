//! Deterministic answer validation: numeric, algebraic, and keyword paths.
//!
//! Every failure mode is expressed in the returned `ValidationOutcome`;
//! nothing here panics or propagates an error to the caller. The numeric
//! path leans on the safe evaluator in `expr`.

use crate::domain::{AcceptedValue, FeedbackKind, ValidationOutcome};
use crate::expr;

/// Fallback tolerance for the "close but inexact" partial-credit pass.
const LOOSE_TOLERANCE: f64 = 0.1;

/// Score weights for the keyword path.
const REQUIRED_WEIGHT: f64 = 70.0;
const OPTIONAL_WEIGHT: f64 = 30.0;

/// Canonicalize a free-text math answer for textual comparison: lowercase,
/// strip whitespace and multiplication glyphs, unify `π` and `√` spellings.
/// Total function; used only by the algebraic path.
pub fn normalize_expression(expr: &str) -> String {
  expr
    .to_lowercase()
    .chars()
    .filter(|c| !c.is_whitespace())
    .filter(|c| !matches!(c, '*' | '×' | '·'))
    .collect::<String>()
    .replace('π', "pi")
    .replace('√', "sqrt")
}

/// Absolute-difference comparison used by the numeric path.
pub fn compare_numbers(a: f64, b: f64, tolerance: f64) -> bool {
  (a - b).abs() <= tolerance
}

/// Turn a decorated numeric string into a value, or `None` if it cannot be
/// parsed. Evaluator errors are swallowed here; they all mean "not numeric".
pub fn extract_numeric(text: &str) -> Option<f64> {
  expr::evaluate(text).ok()
}

fn accepted_numeric(value: &AcceptedValue) -> Option<f64> {
  match value {
    AcceptedValue::Number(n) => Some(*n),
    AcceptedValue::Text(s) => extract_numeric(s),
  }
}

/// Numeric validation: exact pass under `tolerance`, then a looser pass for
/// partial credit. The first matching accepted value wins.
pub fn validate_numeric(
  user_answer: &str,
  accepted: &[AcceptedValue],
  tolerance: f64,
) -> ValidationOutcome {
  let user_value = match extract_numeric(user_answer) {
    Some(v) => v,
    None => {
      return ValidationOutcome::new(
        false,
        None,
        FeedbackKind::InvalidFormat,
        "The answer is not in a valid numeric format.",
      )
    }
  };

  for value in accepted {
    if let Some(correct) = accepted_numeric(value) {
      if compare_numbers(user_value, correct, tolerance) {
        return ValidationOutcome::new(
          true,
          Some(100),
          FeedbackKind::ExactMatch,
          "Correct! Your answer is exact.",
        );
      }
    }
  }

  for value in accepted {
    if let Some(correct) = accepted_numeric(value) {
      if compare_numbers(user_value, correct, LOOSE_TOLERANCE) {
        return ValidationOutcome::new(
          false,
          Some(70),
          FeedbackKind::CloseButInexact,
          "Your answer is close but not exact. Check your calculations.",
        );
      }
    }
  }

  ValidationOutcome::new(
    false,
    Some(0),
    FeedbackKind::Incorrect,
    "Incorrect answer. Review your procedure and try again.",
  )
}

/// Swap the first `a OP b` pair of word tokens around `op`.
/// Word tokens are alphanumeric runs, matching the original rewrite rules.
fn swap_first_commutative(expr: &str, op: char) -> String {
  let chars: Vec<char> = expr.chars().collect();
  let is_word = |c: &char| c.is_alphanumeric();
  for (i, c) in chars.iter().enumerate() {
    if *c != op || i == 0 || i + 1 == chars.len() {
      continue;
    }
    if !is_word(&chars[i - 1]) || !is_word(&chars[i + 1]) {
      continue;
    }
    let mut start = i - 1;
    while start > 0 && is_word(&chars[start - 1]) {
      start -= 1;
    }
    let mut end = i + 1;
    while end + 1 < chars.len() && is_word(&chars[end + 1]) {
      end += 1;
    }
    let left: String = chars[start..i].iter().collect();
    let right: String = chars[i + 1..=end].iter().collect();
    let prefix: String = chars[..start].iter().collect();
    let suffix: String = chars[end + 1..].iter().collect();
    return format!("{prefix}{right}{op}{left}{suffix}");
  }
  expr.to_string()
}

/// Fixed, intentionally shallow equivalence rewrites: commutative swap
/// around `+` and `*`, and the two π spellings. Rules are applied in order
/// and cumulatively, comparing after each substitution.
fn are_equivalent_expressions(user: &str, expected: &str) -> bool {
  let mut modified = user.to_string();
  let rewrites: [fn(&str) -> String; 4] = [
    |e| swap_first_commutative(e, '+'),
    |e| swap_first_commutative(e, '*'),
    |e| e.replacen("pi", "π", 1),
    |e| e.replacen('π', "pi", 1),
  ];
  for rewrite in rewrites {
    let candidate = rewrite(&modified);
    if candidate == expected {
      return true;
    }
    modified = candidate;
  }
  false
}

/// Algebraic validation: normalized exact match, then the rewrite table.
/// Pattern-based on purpose; accepted-answer lists are curated per problem.
pub fn validate_algebraic(user_answer: &str, accepted: &[String]) -> ValidationOutcome {
  let normalized_user = normalize_expression(user_answer);

  for correct in accepted {
    let normalized_correct = normalize_expression(correct);

    if normalized_user == normalized_correct {
      return ValidationOutcome::new(
        true,
        Some(100),
        FeedbackKind::ExactMatch,
        "Correct! Your expression matches the expected answer.",
      );
    }

    if are_equivalent_expressions(&normalized_user, &normalized_correct) {
      return ValidationOutcome::new(
        true,
        Some(100),
        FeedbackKind::Equivalent,
        "Correct! Your expression is equivalent to the expected answer.",
      );
    }
  }

  ValidationOutcome::new(
    false,
    Some(0),
    FeedbackKind::Incorrect,
    "The expression does not match any expected form. Check your procedure.",
  )
}

/// Keyword validation for conceptual questions. Case-insensitive substring
/// containment; required keywords carry 70% of the weight, optional 30%.
pub fn validate_keywords(
  user_answer: &str,
  required: &[String],
  optional: &[String],
) -> ValidationOutcome {
  let normalized = user_answer.to_lowercase();
  let contains = |kw: &String| normalized.contains(&kw.to_lowercase());

  let found_required = required.iter().filter(|kw| contains(kw)).count();
  let found_optional = optional.iter().filter(|kw| contains(kw)).count();

  let required_score = if required.is_empty() {
    REQUIRED_WEIGHT
  } else {
    (found_required as f64 / required.len() as f64) * REQUIRED_WEIGHT
  };
  let optional_score = if optional.is_empty() {
    OPTIONAL_WEIGHT
  } else {
    (found_optional as f64 / optional.len() as f64) * OPTIONAL_WEIGHT
  };
  let total = required_score + optional_score;

  if total >= 90.0 {
    ValidationOutcome::new(
      true,
      Some(100),
      FeedbackKind::ExactMatch,
      "Excellent! Your answer covers all the key concepts.",
    )
  } else if total >= 70.0 {
    ValidationOutcome::new(
      true,
      Some(total.round() as u32),
      FeedbackKind::ExactMatch,
      "Good! Your answer covers the main concepts.",
    )
  } else if total >= 40.0 {
    ValidationOutcome::new(
      false,
      Some(total.round() as u32),
      FeedbackKind::Incorrect,
      "Your answer is incomplete. Important concepts are missing.",
    )
  } else {
    ValidationOutcome::new(
      false,
      Some(0),
      FeedbackKind::Incorrect,
      "Your answer does not include the expected key concepts.",
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::f64::consts::PI;

  fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn normalization_is_canonical() {
    assert_eq!(normalize_expression("2 * π x"), "2pix");
    assert_eq!(normalize_expression("√(X − 1)"), "sqrt(x−1)");
    assert_eq!(normalize_expression("A × b · c"), "abc");
  }

  #[test]
  fn extraction_round_trips_through_numeric_validation() {
    // Any accepted string must validate against itself at any tolerance.
    for s in ["pi/2", "4-2arctan(2)", "sqrt(2)", "1.771", "2e"] {
      let accepted = vec![AcceptedValue::Text(s.to_string())];
      let out = validate_numeric(s, &accepted, 1e-9);
      assert!(out.correct, "{s} should match itself");
      assert_eq!(out.partial_score, Some(100));
      assert_eq!(out.kind, FeedbackKind::ExactMatch);
    }
  }

  #[test]
  fn numeric_exact_match_on_substitution_integral() {
    let accepted = vec![
      AcceptedValue::Number(4.0 - 2.0 * 2.0_f64.atan()),
      AcceptedValue::Number(1.771),
      AcceptedValue::Text("4-2arctan(2)".into()),
    ];
    let out = validate_numeric("4-2*arctan(2)", &accepted, 0.01);
    assert!(out.correct);
    assert_eq!(out.partial_score, Some(100));
  }

  #[test]
  fn numeric_close_but_inexact_gets_partial_credit() {
    // |3.1 − π| ≈ 0.0416: outside the exact tolerance, inside the loose band.
    let accepted = vec![AcceptedValue::Number(PI)];
    let out = validate_numeric("3.1", &accepted, 0.01);
    assert!(!out.correct);
    assert_eq!(out.partial_score, Some(70));
    assert_eq!(out.kind, FeedbackKind::CloseButInexact);
  }

  #[test]
  fn numeric_outside_loose_band_is_plain_incorrect() {
    // |3.0 − π| ≈ 0.1416 exceeds the loose 0.1 band: no partial credit.
    let accepted = vec![AcceptedValue::Number(PI)];
    let out = validate_numeric("3.0", &accepted, 0.01);
    assert!(!out.correct);
    assert_eq!(out.partial_score, Some(0));
    assert_eq!(out.kind, FeedbackKind::Incorrect);
  }

  #[test]
  fn numeric_rejects_unparsable_input() {
    let accepted = vec![AcceptedValue::Number(1.0)];
    let out = validate_numeric("no idea, sorry", &accepted, 0.01);
    assert!(!out.correct);
    assert_eq!(out.partial_score, None);
    assert_eq!(out.kind, FeedbackKind::InvalidFormat);
  }

  #[test]
  fn numeric_plain_miss_scores_zero() {
    let accepted = vec![AcceptedValue::Number(PI)];
    let out = validate_numeric("12", &accepted, 0.01);
    assert!(!out.correct);
    assert_eq!(out.partial_score, Some(0));
    assert_eq!(out.kind, FeedbackKind::Incorrect);
  }

  #[test]
  fn algebraic_exact_and_spacing_insensitive() {
    let accepted = texts(&["y=-πx/2+π²/4"]);
    let out = validate_algebraic("y = -π x / 2 + π² / 4", &accepted);
    assert!(out.correct);
    assert_eq!(out.kind, FeedbackKind::ExactMatch);
  }

  #[test]
  fn algebraic_commutative_swap() {
    let accepted = texts(&["a+b"]);
    let out = validate_algebraic("b+a", &accepted);
    assert!(out.correct);
    assert_eq!(out.kind, FeedbackKind::Equivalent);
  }

  #[test]
  fn algebraic_pi_respelling() {
    // Normalization maps π to "pi", so only curated forms that still carry
    // the glyph exercise the respelling rule; both directions are kept.
    assert!(are_equivalent_expressions("pix", "πx"));
    assert!(are_equivalent_expressions("πx", "pix"));
  }

  #[test]
  fn algebraic_rejects_non_matching_forms() {
    let accepted = texts(&["y=2x+1"]);
    let out = validate_algebraic("y=2x+2", &accepted);
    assert!(!out.correct);
    assert_eq!(out.partial_score, Some(0));
  }

  #[test]
  fn keyword_boundary_exactly_required() {
    // All required present, none of the optional: 70 + 0 = 70 → correct.
    let required = texts(&["volume", "revolution", "washers", "integral"]);
    let optional = texts(&["radius", "outer", "inner", "evaluate"]);
    let out = validate_keywords(
      "set up the integral for the volume of revolution using washers",
      &required,
      &optional,
    );
    assert!(out.correct);
    assert_eq!(out.partial_score, Some(70));
  }

  #[test]
  fn keyword_partial_coverage_is_incorrect_but_scored() {
    // 3 of 4 required, none of the optional: 52.5 → rounds to 53.
    let required = texts(&["derive", "verify", "formula", "integral"]);
    let optional = texts(&["rule", "quotient", "chain", "simplify"]);
    let out = validate_keywords(
      "I would derive the right-hand side to verify the formula",
      &required,
      &optional,
    );
    assert!(!out.correct);
    assert_eq!(out.partial_score, Some(53));
  }

  #[test]
  fn keyword_empty_lists_default_to_full_weight() {
    let out = validate_keywords("anything", &[], &[]);
    assert!(out.correct);
    assert_eq!(out.partial_score, Some(100));
  }

  #[test]
  fn keyword_no_coverage_scores_zero() {
    let required = texts(&["arc", "length"]);
    let out = validate_keywords("unrelated words", &required, &texts(&["implicit"]));
    assert!(!out.correct);
    assert_eq!(out.partial_score, Some(0));
  }
}
