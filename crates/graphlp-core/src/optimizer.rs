use graphlp_solver::{ConstraintOp, LpProblem, SolutionStatus, Solver};
use tracing::{debug, warn};

use crate::restriction::{Objective, OptimizationType, RelOp, Restriction};

/// Outcome of one optimization request.
///
/// `Infeasible` and `Unbounded` are ordinary answers, not failures.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum OptimizationResult {
    Optimal { x1: f64, x2: f64, z: f64 },
    Infeasible,
    Unbounded,
    SolverFailure(String),
}

impl OptimizationResult {
    pub fn is_optimal(&self) -> bool {
        matches!(self, OptimizationResult::Optimal { .. })
    }

    /// The optimal `(x1, x2)`, if any
    pub fn vertex(&self) -> Option<(f64, f64)> {
        match *self {
            OptimizationResult::Optimal { x1, x2, .. } => Some((x1, x2)),
            _ => None,
        }
    }

    /// Message suitable for showing to the person who entered the problem
    pub fn message(&self) -> String {
        match self {
            OptimizationResult::Optimal { x1, x2, z } => {
                format!("Optimal point: ({:.2}, {:.2})\nOptimal Z value: {:.2}", x1, x2, z)
            }
            OptimizationResult::Infeasible => {
                "No point satisfies every restriction together with x1, x2 >= 0.".to_string()
            }
            OptimizationResult::Unbounded => {
                "The objective can be improved without limit over the feasible region.".to_string()
            }
            OptimizationResult::SolverFailure(reason) => format!("The solver failed: {}", reason),
        }
    }
}

/// Optimal-vertex search over `x1, x2 >= 0`
#[derive(Debug, Clone, Default)]
pub struct Optimizer {
    solver: Solver,
}

impl Optimizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_solver(solver: Solver) -> Self {
        Self { solver }
    }

    pub fn solver(&self) -> &Solver {
        &self.solver
    }

    pub fn optimize(&self, restrictions: &[Restriction], objective: &Objective) -> OptimizationResult {
        let problem = standard_form(restrictions, objective);

        let solution = match self.solver.solve(&problem) {
            Ok(solution) => solution,
            Err(e) => {
                warn!(error = %e, "solver failed");
                return OptimizationResult::SolverFailure(e.to_string());
            }
        };
        debug!(
            status = %solution.status,
            iterations = solution.iterations,
            restrictions = restrictions.len(),
            "solved linear program"
        );

        match solution.status {
            SolutionStatus::Optimal => {
                let (x1, x2) = (solution.values[0], solution.values[1]);
                OptimizationResult::Optimal {
                    x1,
                    x2,
                    z: objective.value(x1, x2),
                }
            }
            SolutionStatus::Infeasible => OptimizationResult::Infeasible,
            SolutionStatus::Unbounded => OptimizationResult::Unbounded,
        }
    }
}

/// Optimize `objective` over `restrictions` with the default solver settings.
pub fn optimize(restrictions: &[Restriction], objective: &Objective) -> OptimizationResult {
    Optimizer::default().optimize(restrictions, objective)
}

/// Minimization with every row in `<=` form; `x1, x2 >= 0` are implied by the solver.
fn standard_form(restrictions: &[Restriction], objective: &Objective) -> LpProblem {
    let mut problem = LpProblem::new(vec!["x1".to_string(), "x2".to_string()]);

    let cost = match objective.optimization_type {
        OptimizationType::Max => vec![-objective.coeff_x1, -objective.coeff_x2],
        OptimizationType::Min => vec![objective.coeff_x1, objective.coeff_x2],
    };
    problem.set_objective(cost, true);

    for r in restrictions {
        let (row, rhs) = match r.op {
            RelOp::Le => (vec![r.a, r.b], r.c),
            RelOp::Ge => (vec![-r.a, -r.b], -r.c),
        };
        problem.add_constraint(r.label(), row, ConstraintOp::Le, rhs);
    }

    problem
}

/// Indices of the restrictions whose boundary passes through `(x1, x2)`,
/// within `tolerance` scaled by the row's magnitude.
pub fn binding_restrictions(restrictions: &[Restriction], x1: f64, x2: f64, tolerance: f64) -> Vec<usize> {
    restrictions
        .iter()
        .enumerate()
        .filter(|(_, r)| {
            let scale = r.a.abs().max(r.b.abs()).max(1.0);
            (r.lhs(x1, x2) - r.c).abs() <= tolerance * scale
        })
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn textbook() -> Vec<Restriction> {
        vec![
            Restriction::le(1.0, 1.0, 4.0),
            Restriction::le(1.0, 0.0, 3.0),
            Restriction::le(0.0, 1.0, 3.0),
            Restriction::ge(1.0, 0.0, 0.0),
            Restriction::ge(0.0, 1.0, 0.0),
        ]
    }

    fn assert_optimal(result: &OptimizationResult, x1: f64, x2: f64, z: f64) {
        match *result {
            OptimizationResult::Optimal { x1: a, x2: b, z: c } => {
                assert!((a - x1).abs() < 1e-6, "x1 = {} (expected {})", a, x1);
                assert!((b - x2).abs() < 1e-6, "x2 = {} (expected {})", b, x2);
                assert!((c - z).abs() < 1e-6, "z = {} (expected {})", c, z);
            }
            ref other => panic!("Expected optimal, got {:?}", other),
        }
    }

    #[test]
    fn test_textbook_maximum() {
        let result = optimize(&textbook(), &Objective::maximize(3.0, 2.0));
        assert_optimal(&result, 3.0, 1.0, 11.0);
        assert_eq!(result.vertex().map(|(x, _)| x.round()), Some(3.0));
    }

    #[test]
    fn test_minimum_with_ge_rows() {
        let restrictions = [
            Restriction::ge(1.0, 1.0, 4.0),
            Restriction::le(1.0, 0.0, 3.0),
            Restriction::le(0.0, 1.0, 3.0),
        ];
        let result = optimize(&restrictions, &Objective::minimize(2.0, 3.0));
        assert_optimal(&result, 3.0, 1.0, 9.0);
    }

    #[test]
    fn test_infeasible() {
        let restrictions = [Restriction::ge(1.0, 0.0, 5.0), Restriction::le(1.0, 0.0, 2.0)];
        let result = optimize(&restrictions, &Objective::maximize(1.0, 1.0));
        assert_eq!(result, OptimizationResult::Infeasible);
        assert_eq!(result.vertex(), None);
    }

    #[test]
    fn test_infeasible_against_non_negativity() {
        // x1 + x2 <= -1 has no point in the first quadrant
        let result = optimize(&[Restriction::le(1.0, 1.0, -1.0)], &Objective::minimize(1.0, 1.0));
        assert_eq!(result, OptimizationResult::Infeasible);
    }

    #[test]
    fn test_unbounded() {
        let result = optimize(&[Restriction::ge(1.0, 0.0, 0.0)], &Objective::maximize(1.0, 1.0));
        assert_eq!(result, OptimizationResult::Unbounded);
    }

    #[test]
    fn test_empty_restrictions() {
        assert_eq!(optimize(&[], &Objective::maximize(1.0, 0.0)), OptimizationResult::Unbounded);
        assert_optimal(&optimize(&[], &Objective::minimize(1.0, 1.0)), 0.0, 0.0, 0.0);
    }

    #[test]
    fn test_z_uses_original_coefficients() {
        let restrictions = textbook();
        let min = optimize(&restrictions, &Objective::minimize(-3.0, -2.0));
        let max = optimize(&restrictions, &Objective::maximize(3.0, 2.0));
        assert_optimal(&min, 3.0, 1.0, -11.0);
        assert_optimal(&max, 3.0, 1.0, 11.0);
    }

    #[test]
    fn test_badly_scaled_restrictions() {
        for s in [1e-10, 1e-6, 1e6, 1e12] {
            let restrictions = [
                Restriction::le(s, s, 4.0 * s),
                Restriction::le(s, 0.0, 3.0 * s),
                Restriction::le(0.0, s, 3.0 * s),
            ];
            assert_optimal(&optimize(&restrictions, &Objective::maximize(3.0, 2.0)), 3.0, 1.0, 11.0);
        }
        let restrictions = [Restriction::ge(1e-10, 0.0, 1e-10), Restriction::le(1.0, 0.0, 0.5)];
        assert_eq!(optimize(&restrictions, &Objective::maximize(1.0, 1.0)), OptimizationResult::Infeasible);
    }

    #[test]
    fn test_nan_is_solver_failure() {
        let result = optimize(&[Restriction::le(f64::NAN, 1.0, 4.0)], &Objective::maximize(1.0, 1.0));
        match result {
            OptimizationResult::SolverFailure(reason) => assert!(reason.contains("Non-finite")),
            other => panic!("Expected solver failure, got {:?}", other),
        }
    }

    #[test]
    fn test_iteration_limit_is_solver_failure() {
        let optimizer = Optimizer::with_solver(Solver::new().with_max_iterations(0));
        let result = optimizer.optimize(&textbook(), &Objective::maximize(3.0, 2.0));
        assert!(matches!(result, OptimizationResult::SolverFailure(_)));
    }

    #[test]
    fn test_binding_restrictions() {
        let restrictions = textbook();
        assert_eq!(binding_restrictions(&restrictions, 3.0, 1.0, 1e-6), vec![0, 1]);
        assert_eq!(binding_restrictions(&restrictions, 0.0, 0.0, 1e-6), vec![3, 4]);
    }

    #[test]
    fn test_messages() {
        let optimal = OptimizationResult::Optimal { x1: 3.0, x2: 1.0, z: 11.0 };
        assert_eq!(optimal.message(), "Optimal point: (3.00, 1.00)\nOptimal Z value: 11.00");
        assert!(OptimizationResult::SolverFailure("boom".into()).message().contains("boom"));
    }
}
