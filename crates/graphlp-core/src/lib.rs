//! Graphical-method linear programming over two variables.
//!
//! Restrictions `a*x1 + b*x2 (≤|≥) c` are sampled on a grid to picture the
//! feasible region, and handed to a simplex solver to find the optimal vertex.

pub mod feasibility;
pub mod input;
pub mod lexer;
pub mod optimizer;
pub mod parser;
pub mod plot;
pub mod restriction;
pub mod store;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use feasibility::{
    evaluate_feasibility, BoundaryLine, FeasibilityMask, FeasibilityReport, Grid, GridError, MAX_RESOLUTION,
};
pub use input::{collect_rows, InputError, ObjectiveRow, RestrictionRow, Sign, SignPolicy};
pub use lexer::{Lexer, Span, Token, TokenKind};
pub use optimizer::{binding_restrictions, optimize, OptimizationResult, Optimizer};
pub use parser::{ParseError, Parser, ProblemText};
pub use plot::PlotPayload;
pub use restriction::{Objective, OptimizationType, RelOp, Restriction, UnknownSymbol};
pub use store::RestrictionStore;

pub use graphlp_solver::Solver;
