//! Built-in curriculum: objectives, problems, answer specs, and hint banks.
//!
//! The catalog guarantees the app is fully usable without any external
//! config. Objective child lists are always derived from problem declaration
//! order so they cannot drift from the actual content.

use std::collections::HashMap;
use std::f64::consts::PI;

use crate::domain::{
  AcceptedValue, AnswerSpec, Difficulty, Hint, HintLabel, Objective, Problem, Visualization,
  VisualizationKind,
};

/// Read-only problem catalog: the validation core consumes problem-id →
/// answer-spec and objective-id → child-problem-id lookups from here.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
  objectives: Vec<Objective>,
  problems: Vec<Problem>,
  answers: HashMap<String, AnswerSpec>,
  hints: HashMap<String, Vec<Hint>>,
}

impl Catalog {
  pub fn new() -> Self {
    Self::default()
  }

  /// Insert a problem with its answer spec and hint bank. Returns false
  /// (and leaves the catalog untouched) when the id is already present.
  pub fn insert(
    &mut self,
    problem: Problem,
    answer: Option<AnswerSpec>,
    hints: Vec<Hint>,
  ) -> bool {
    if self.problems.iter().any(|p| p.id == problem.id) {
      return false;
    }
    if !self.objectives.iter().any(|o| o.id == problem.objective_id) {
      // Placeholder metadata; config or built-ins can describe it properly.
      self.objectives.push(Objective {
        id: problem.objective_id.clone(),
        title: problem.objective_id.clone(),
        description: String::new(),
      });
    }
    if let Some(spec) = answer {
      self.answers.insert(problem.id.clone(), spec);
    }
    if !hints.is_empty() {
      self.hints.insert(problem.id.clone(), hints);
    }
    self.problems.push(problem);
    true
  }

  /// Describe an objective (title/description). Inserts it if unknown.
  pub fn describe_objective(&mut self, objective: Objective) {
    match self.objectives.iter_mut().find(|o| o.id == objective.id) {
      Some(existing) => *existing = objective,
      None => self.objectives.push(objective),
    }
  }

  /// Like `describe_objective`, but an existing real description wins.
  /// Placeholder entries (created when a problem referenced an unknown
  /// objective) are still filled in.
  pub fn describe_objective_if_absent(&mut self, objective: Objective) {
    match self.objectives.iter_mut().find(|o| o.id == objective.id) {
      Some(existing) if existing.description.is_empty() => *existing = objective,
      Some(_) => {}
      None => self.objectives.push(objective),
    }
  }

  pub fn objectives(&self) -> &[Objective] {
    &self.objectives
  }

  pub fn problems(&self) -> &[Problem] {
    &self.problems
  }

  pub fn problem(&self, id: &str) -> Option<&Problem> {
    self.problems.iter().find(|p| p.id == id)
  }

  pub fn answer_spec(&self, id: &str) -> Option<&AnswerSpec> {
    self.answers.get(id)
  }

  pub fn hints(&self, id: &str) -> &[Hint] {
    self.hints.get(id).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn hint(&self, id: &str, level: u8) -> Option<&Hint> {
    self.hints(id).iter().find(|h| h.level == level)
  }

  pub fn total_problems(&self) -> usize {
    self.problems.len()
  }

  /// Child problem ids of an objective, in catalog order.
  pub fn objective_children(&self, objective_id: &str) -> Vec<&str> {
    self
      .problems
      .iter()
      .filter(|p| p.objective_id == objective_id)
      .map(|p| p.id.as_str())
      .collect()
  }

  /// Problem ids in catalog order (used for streak derivation).
  pub fn ordered_problem_ids(&self) -> Vec<&str> {
    self.problems.iter().map(|p| p.id.as_str()).collect()
  }
}

macro_rules! hint {
  ($level:expr, $label:ident, $text:expr) => {
    Hint { level: $level, text: $text.into(), label: HintLabel::$label, deduction: 5 }
  };
}

macro_rules! strings {
  ($($s:expr),* $(,)?) => { vec![$($s.to_string()),*] };
}

fn viz(kind: VisualizationKind, exprs: &[&str], domain: Option<(f64, f64)>) -> Option<Visualization> {
  Some(Visualization {
    kind,
    expressions: exprs.iter().map(|s| s.to_string()).collect(),
    domain,
  })
}

/// The fixed eight-problem curriculum, two problems per objective.
pub fn builtin_catalog() -> Catalog {
  let mut cat = Catalog::new();
  install_builtin(&mut cat);
  cat
}

/// Install the built-in curriculum without overwriting anything already
/// present (config-provided entries win).
pub fn install_builtin(cat: &mut Catalog) {
  cat.describe_objective_if_absent(Objective {
    id: "I.1".into(),
    title: "Integration techniques".into(),
    description: "Verify integral formulas and compute definite integrals by substitution.".into(),
  });
  cat.describe_objective_if_absent(Objective {
    id: "I.2".into(),
    title: "Improper integrals".into(),
    description: "Decide convergence of improper integrals and compute volumes over unbounded regions.".into(),
  });
  cat.describe_objective_if_absent(Objective {
    id: "II.1".into(),
    title: "Applications of the definite integral".into(),
    description: "Volumes of solids of revolution and arc length of plane curves.".into(),
  });
  cat.describe_objective_if_absent(Objective {
    id: "II.2".into(),
    title: "Parametric and polar curves".into(),
    description: "Tangent lines to parametric curves and areas between polar curves.".into(),
  });

  cat.insert(
    Problem {
      id: "I.1.1".into(),
      objective_id: "I.1".into(),
      statement: "Verify the formula ∫ u²/(a+bu)² du = (1/b³)(bu − a²/(a+bu) − 2a·ln|a+bu|) + C by differentiating the right-hand side.".into(),
      method: "Differentiate the right-hand side and show the result equals the integrand.".into(),
      steps: strings![
        "Differentiate each term of the right-hand side",
        "Combine the terms over the common denominator (a+bu)²",
        "Simplify the numerator and compare with the integrand",
      ],
      common_errors: strings![
        "Forgetting the chain rule on ln|a+bu|",
        "Sign mistakes when differentiating the quotient",
      ],
      visualization: None,
      difficulty: Difficulty::Medium,
      max_points: 100,
    },
    Some(AnswerSpec::Keywords {
      required: strings!["derive", "verify", "formula", "integral"],
      optional: strings!["rule", "quotient", "chain", "simplify"],
    }),
    vec![
      hint!(1, Directional, "To verify an integral formula you can differentiate the right-hand side and check you recover the integrand."),
      hint!(2, Explanatory, "Apply the quotient rule to a²/(a+bu) and the chain rule to ln|a+bu|."),
      hint!(3, Detailed, "Differentiating: d/du[bu] = b, d/du[a²/(a+bu)] = −a²b/(a+bu)², d/du[2a·ln|a+bu|] = 2ab/(a+bu)."),
      hint!(4, VisualAid, "Combine over (a+bu)²: you should reach [b(a+bu)² − a²b − 2ab(a+bu)]/(a+bu)²."),
      hint!(5, FullSolution, "The numerator simplifies to bu², so the derivative is u²/(a+bu)² times 1/b³·b³, verifying the formula."),
    ],
  );

  cat.insert(
    Problem {
      id: "I.1.2".into(),
      objective_id: "I.1".into(),
      statement: "Compute ∫₁⁵ √(x−1)/x dx using the substitution x−1 = t².".into(),
      method: "Substitution with change of limits, then long division and the arctangent antiderivative.".into(),
      steps: strings![
        "Write dx = 2t dt and transform the limits (x=1 → t=0, x=5 → t=2)",
        "Reduce to 2∫₀² t²/(t²+1) dt",
        "Rewrite t²/(t²+1) = 1 − 1/(t²+1) and integrate",
      ],
      common_errors: strings![
        "Forgetting to change the limits of integration",
        "Dropping the factor 2t from dx",
      ],
      visualization: viz(VisualizationKind::Plot2d, &["sqrt(x-1)/x"], Some((1.0, 5.0))),
      difficulty: Difficulty::MediumHard,
      max_points: 100,
    },
    Some(AnswerSpec::Numeric {
      accepted: vec![
        AcceptedValue::Number(4.0 - 2.0 * 2.0_f64.atan()),
        AcceptedValue::Number(1.771),
        AcceptedValue::Number(1.77),
        AcceptedValue::Text("4-2arctan(2)".into()),
        AcceptedValue::Text("4-2*arctan(2)".into()),
      ],
      tolerance: 0.01,
    }),
    vec![
      hint!(1, Directional, "The substitution x−1 = t² gives dx = 2t dt."),
      hint!(2, Explanatory, "Transform the limits: x=1 → t=0, x=5 → t=2, and express √(x−1) as t."),
      hint!(3, Detailed, "The integral becomes ∫₀² (t/(t²+1))·2t dt = 2∫₀² t²/(t²+1) dt."),
      hint!(4, VisualAid, "Rewrite t²/(t²+1) = 1 − 1/(t²+1); the antiderivative of 1/(t²+1) is arctan(t)."),
      hint!(5, FullSolution, "Final answer: 2[t − arctan(t)]₀² = 2(2 − arctan(2)) = 4 − 2·arctan(2)."),
    ],
  );

  cat.insert(
    Problem {
      id: "I.2.1".into(),
      objective_id: "I.2".into(),
      statement: "Decide whether ∫_{−∞}^{∞} 3eˣ/(3e²ˣ+3) dx converges, and compute its value if it does.".into(),
      method: "Split at 0, substitute u = eˣ, and evaluate both one-sided limits.".into(),
      steps: strings![
        "Split the integral at 0 into two improper integrals",
        "Substitute to reach an arctangent antiderivative",
        "Evaluate both limits and add",
      ],
      common_errors: strings![
        "Evaluating a doubly infinite integral as a single limit",
        "Losing a constant factor in the substitution",
      ],
      visualization: viz(VisualizationKind::Plot2dWithLimits, &["3exp(x)/(3exp(2x)+3)"], Some((-6.0, 6.0))),
      difficulty: Difficulty::Hard,
      max_points: 100,
    },
    Some(AnswerSpec::Numeric {
      accepted: vec![
        AcceptedValue::Number(PI),
        AcceptedValue::Number(3.14159),
        AcceptedValue::Number(3.1416),
        AcceptedValue::Number(3.14),
        AcceptedValue::Text("pi".into()),
        AcceptedValue::Text("π".into()),
      ],
      tolerance: 0.01,
    }),
    vec![
      hint!(1, Directional, "For integrals from −∞ to ∞, split into two limits: from −∞ to 0 and from 0 to ∞."),
      hint!(2, Explanatory, "Substitute u = eˣ so du = eˣ dx; the integrand becomes 1/(u²+1)."),
      hint!(3, Detailed, "Each piece has an arctangent antiderivative; track what happens as u → 0 and u → ∞."),
      hint!(4, VisualAid, "Evaluate lim[a→−∞] ∫ₐ⁰ and lim[b→∞] ∫₀ᵇ separately; both must converge."),
      hint!(5, FullSolution, "The integral converges to arctan(∞) − arctan(−∞) = π/2 − (−π/2) = π."),
    ],
  );

  cat.insert(
    Problem {
      id: "I.2.2".into(),
      objective_id: "I.2".into(),
      statement: "The region under f(x) = 1/x^(3/2) for x ≥ 1 is rotated about the x-axis. Decide whether the solid has finite volume and compute it.".into(),
      method: "Disk method with an improper integral: V = π∫₁^∞ [f(x)]² dx.".into(),
      steps: strings![
        "Set up V = π∫₁^∞ 1/x³ dx",
        "Evaluate the improper integral as a limit",
        "Multiply by π",
      ],
      common_errors: strings![
        "Forgetting to square f(x) in the disk formula",
        "Treating the improper integral as a plain definite integral",
      ],
      visualization: viz(VisualizationKind::Solid3d, &["1/(x*sqrt(x))"], Some((1.0, 10.0))),
      difficulty: Difficulty::Hard,
      max_points: 100,
    },
    Some(AnswerSpec::Numeric {
      accepted: vec![
        AcceptedValue::Number(PI / 2.0),
        AcceptedValue::Number(1.5708),
        AcceptedValue::Number(1.571),
        AcceptedValue::Text("pi/2".into()),
        AcceptedValue::Text("π/2".into()),
      ],
      tolerance: 0.01,
    }),
    vec![
      hint!(1, Directional, "For a volume of revolution use V = π∫[f(x)]² dx; here f(x) = 1/x^(3/2)."),
      hint!(2, Explanatory, "Squaring gives 1/x³, so V = π∫₁^∞ x⁻³ dx."),
      hint!(3, Detailed, "Write the improper integral as lim[b→∞] π∫₁ᵇ x⁻³ dx."),
      hint!(4, VisualAid, "The antiderivative of x⁻³ is −1/(2x²); evaluate it at b and at 1."),
      hint!(5, FullSolution, "V = π·lim[b→∞](−1/(2b²) + 1/2) = π/2. The solid has finite volume π/2."),
    ],
  );

  cat.insert(
    Problem {
      id: "II.1.1".into(),
      objective_id: "II.1".into(),
      statement: "Describe the procedure to compute the volume of the solid obtained by rotating the region between y = x² and y = 2x about the x-axis.".into(),
      method: "Washer method with outer and inner radii.".into(),
      steps: strings![
        "Find the intersection points of the curves",
        "Identify the outer and inner radius on the interval",
        "Set up and evaluate the washer integral",
      ],
      common_errors: strings![
        "Swapping the outer and inner radius",
        "Subtracting the radii before squaring",
      ],
      visualization: viz(VisualizationKind::Region2dAndSolid3d, &["x*x", "2x"], Some((0.0, 2.0))),
      difficulty: Difficulty::MediumHard,
      max_points: 100,
    },
    Some(AnswerSpec::Keywords {
      required: strings!["volume", "revolution", "washers", "integral"],
      optional: strings!["radius", "outer", "inner", "evaluate"],
    }),
    vec![
      hint!(1, Directional, "When the region between two curves is rotated, the cross sections are washers."),
      hint!(2, Explanatory, "The volume is V = π∫(R² − r²) dx where R is the outer and r the inner radius."),
      hint!(3, Detailed, "On [0,2] the line 2x lies above x², so R = 2x and r = x²."),
      hint!(4, VisualAid, "Set up V = π∫₀² (4x² − x⁴) dx and evaluate term by term."),
      hint!(5, FullSolution, "Mention: intersection points, washers with outer/inner radius, the integral π∫₀²(4x²−x⁴)dx, and its evaluation."),
    ],
  );

  cat.insert(
    Problem {
      id: "II.1.2".into(),
      objective_id: "II.1".into(),
      statement: "Explain how to compute the arc length of the curve defined implicitly by y³ = x² between two points.".into(),
      method: "Arc length integral L = ∫√(1+(dy/dx)²) dx after implicit differentiation.".into(),
      steps: strings![
        "Differentiate the relation implicitly to get dy/dx",
        "Substitute into the arc length integrand",
        "Simplify and evaluate the integral",
      ],
      common_errors: strings![
        "Forgetting to square dy/dx inside the root",
        "Not simplifying before integrating",
      ],
      visualization: viz(VisualizationKind::Curve2dWithLength, &["exp(2/3ln(x))"], Some((0.1, 8.0))),
      difficulty: Difficulty::Hard,
      max_points: 100,
    },
    Some(AnswerSpec::Keywords {
      required: strings!["length", "arc", "derive", "integral"],
      optional: strings!["implicit", "simplify", "calculate"],
    }),
    vec![
      hint!(1, Directional, "Arc length uses L = ∫√(1+(dy/dx)²) dx."),
      hint!(2, Explanatory, "Derive y³ = x² implicitly: 3y²·y' = 2x, so y' = 2x/(3y²)."),
      hint!(3, Detailed, "Express y' in terms of x only using y = x^(2/3)."),
      hint!(4, VisualAid, "The integrand becomes √(1 + 4/(9x^(2/3))); simplify before integrating."),
      hint!(5, FullSolution, "Mention: implicit differentiation, substituting into the arc length formula, simplifying the root, and evaluating the resulting integral."),
    ],
  );

  cat.insert(
    Problem {
      id: "II.2.1".into(),
      objective_id: "II.2".into(),
      statement: "Find the tangent line to the parametric curve x = t·sin(t), y = t·cos(t) at t = π/2.".into(),
      method: "Parametric slope dy/dx = (dy/dt)/(dx/dt) and the point-slope form.".into(),
      steps: strings![
        "Compute dx/dt and dy/dt",
        "Evaluate the slope at t = π/2",
        "Write the tangent line through the point (π/2, 0)",
      ],
      common_errors: strings![
        "Inverting the slope quotient",
        "Forgetting the product rule on t·sin(t)",
      ],
      visualization: viz(VisualizationKind::ParametricCurve, &["x*sin(x)", "x*cos(x)"], Some((0.0, 6.28))),
      difficulty: Difficulty::VeryHard,
      max_points: 100,
    },
    Some(AnswerSpec::Algebraic {
      accepted: strings![
        "y=-πx/2+π²/4",
        "y=-(π/2)x+π²/4",
        "y=-pi*x/2+pi^2/4",
        "-πx/2+π²/4",
      ],
    }),
    vec![
      hint!(1, Directional, "For a parametric curve the slope is dy/dx = (dy/dt)/(dx/dt)."),
      hint!(2, Explanatory, "By the product rule: dx/dt = sin(t) + t·cos(t) and dy/dt = cos(t) − t·sin(t)."),
      hint!(3, Detailed, "At t = π/2: dx/dt = 1 + 0 = 1 and dy/dt = 0 − π/2 = −π/2."),
      hint!(4, VisualAid, "So dy/dx = −π/2, and the point of tangency is (π/2, 0)."),
      hint!(5, FullSolution, "The tangent line is y − 0 = −π/2·(x − π/2), that is y = −πx/2 + π²/4."),
    ],
  );

  cat.insert(
    Problem {
      id: "II.2.2".into(),
      objective_id: "II.2".into(),
      statement: "Describe how to compute the area inside both the circle r = 2sin(θ) and the rose r = 2sin(2θ).".into(),
      method: "Polar area formula A = ½∫r² dθ between intersection angles, using symmetry.".into(),
      steps: strings![
        "Find the intersection angles of the two curves",
        "Split the area integral at the intersections",
        "Use symmetry and evaluate ½∫r² dθ on each piece",
      ],
      common_errors: strings![
        "Forgetting the ½ factor in the polar area formula",
        "Missing intersection points at the pole",
      ],
      visualization: viz(VisualizationKind::PolarWithArea, &["2sin(x)", "2sin(2x)"], Some((0.0, 3.1416))),
      difficulty: Difficulty::VeryHard,
      max_points: 100,
    },
    Some(AnswerSpec::Keywords {
      required: strings!["area", "polar", "intersection", "integral"],
      optional: strings!["symmetry", "rose", "circle", "evaluate"],
    }),
    vec![
      hint!(1, Directional, "Find the intersections by solving 2sin(2θ) = 2sin(θ); remember the pole."),
      hint!(2, Explanatory, "Polar areas use A = ½∫r² dθ between the intersection angles."),
      hint!(3, Detailed, "Split the region at the intersections and decide which curve bounds each piece."),
      hint!(4, VisualAid, "Both curves are symmetric about θ = π/2; compute half the area and double it."),
      hint!(5, FullSolution, "Mention: intersections of the circle and the rose, splitting the integral, the ½∫r²dθ formula on each piece, symmetry, and the final evaluation."),
    ],
  );

}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builtin_catalog_is_complete() {
    let cat = builtin_catalog();
    assert_eq!(cat.total_problems(), 8);
    assert_eq!(cat.objectives().len(), 4);
    for obj in cat.objectives() {
      assert_eq!(cat.objective_children(&obj.id).len(), 2, "{}", obj.id);
    }
    for p in cat.problems() {
      assert!(cat.answer_spec(&p.id).is_some(), "{} missing answer spec", p.id);
      let hints = cat.hints(&p.id);
      assert_eq!(hints.len(), 5, "{} must have 5 hint levels", p.id);
      for (i, h) in hints.iter().enumerate() {
        assert_eq!(h.level as usize, i + 1);
        assert_eq!(h.deduction, 5);
      }
    }
  }

  #[test]
  fn insert_never_overwrites() {
    let mut cat = builtin_catalog();
    let mut dup = cat.problem("I.1.1").unwrap().clone();
    dup.statement = "changed".into();
    assert!(!cat.insert(dup, None, vec![]));
    assert_ne!(cat.problem("I.1.1").unwrap().statement, "changed");
  }

  #[test]
  fn children_follow_declaration_order() {
    let cat = builtin_catalog();
    assert_eq!(cat.objective_children("I.1"), vec!["I.1.1", "I.1.2"]);
    assert_eq!(cat.objective_children("II.2"), vec!["II.2.1", "II.2.2"]);
  }
}
