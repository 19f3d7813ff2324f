mod problem;
mod simplex;
mod solution;

pub use problem::{Constraint, ConstraintOp, LpProblem, Objective};
pub use simplex::{Solver, SolverError};
pub use solution::{Solution, SolutionStatus};
