use thiserror::Error;

use crate::problem::{ConstraintOp, LpProblem};
use crate::solution::{Solution, SolutionStatus};

/// Consecutive degenerate pivots tolerated before falling back to Bland's rule
const DEGENERATE_STREAK_LIMIT: usize = 50;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Non-finite value {value} in {name}")]
    NonFiniteCoefficient { name: String, value: f64 },
    #[error("{name} has {found} coefficients but the problem has {expected} variables")]
    DimensionMismatch {
        name: String,
        found: usize,
        expected: usize,
    },
    #[error("Iteration limit of {0} pivots reached")]
    IterationLimit(usize),
    #[error("Numerical breakdown: {0}")]
    NumericalBreakdown(&'static str),
}

/// Simplex solver for linear programming problems
#[derive(Debug, Clone)]
pub struct Solver {
    /// Maximum pivots (both phases) before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Solve the LP problem using the two-phase simplex method.
    ///
    /// Infeasible and unbounded problems are reported through
    /// [`Solution::status`]; `Err` is reserved for malformed input and
    /// numerical breakdown.
    pub fn solve(&self, problem: &LpProblem) -> Result<Solution, SolverError> {
        problem.validate()?;

        let mut tableau = self.build_tableau(problem);
        let mut pivots = Pivots::default();

        // Phase 1: Find initial basic feasible solution
        if tableau.n_artificial > 0 {
            if !self.phase1(&mut tableau, &mut pivots)? {
                return Ok(Solution::infeasible(pivots.total));
            }
        }

        // Phase 2: Optimize
        match self.phase2(&mut tableau, &mut pivots)? {
            SimplexResult::Optimal => {}
            SimplexResult::Unbounded => {
                return Ok(Solution::unbounded(pivots.total, problem.objective.minimize));
            }
        }

        Ok(self.extract_solution(&tableau, problem, pivots.total))
    }

    fn build_tableau(&self, problem: &LpProblem) -> Tableau {
        let n_vars = problem.num_variables();
        let n_constraints = problem.num_constraints();

        // A negative rhs is flipped, which also flips the direction of the row
        let rows: Vec<(ConstraintOp, bool)> = problem
            .constraints
            .iter()
            .map(|c| {
                let flip = c.rhs < 0.0;
                let op = match (c.op, flip) {
                    (ConstraintOp::Le, true) => ConstraintOp::Ge,
                    (ConstraintOp::Ge, true) => ConstraintOp::Le,
                    (op, _) => op,
                };
                (op, flip)
            })
            .collect();

        // Count slack and artificial variables needed
        let mut n_slack = 0;
        let mut n_artificial = 0;
        for (op, _) in &rows {
            match op {
                ConstraintOp::Le => n_slack += 1,
                ConstraintOp::Ge => {
                    n_slack += 1; // surplus
                    n_artificial += 1;
                }
                ConstraintOp::Eq => n_artificial += 1,
            }
        }

        let total_cols = n_vars + n_slack + n_artificial + 1; // +1 for RHS
        let total_rows = n_constraints + 1; // +1 for objective

        let mut tableau = Tableau {
            data: vec![vec![0.0; total_cols]; total_rows],
            basic_vars: vec![0; n_constraints],
            n_vars,
            n_slack,
            n_artificial,
        };

        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;

        for (i, (c, &(op, flip))) in problem.constraints.iter().zip(&rows).enumerate() {
            // Rows are scaled to a largest coefficient of 1 so the absolute
            // tolerance means the same thing for every row.
            let scale = row_scale(&c.coefficients);
            let factor = if flip { -1.0 / scale } else { 1.0 / scale };
            for (j, &coef) in c.coefficients.iter().enumerate() {
                tableau.data[i][j] = factor * coef;
            }
            tableau.data[i][total_cols - 1] = factor * c.rhs;

            match op {
                ConstraintOp::Le => {
                    tableau.data[i][slack_idx] = 1.0;
                    tableau.basic_vars[i] = slack_idx;
                    slack_idx += 1;
                }
                ConstraintOp::Ge => {
                    tableau.data[i][slack_idx] = -1.0; // surplus
                    slack_idx += 1;
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
                ConstraintOp::Eq => {
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
            }
        }

        // Objective row (last row). The tableau always maximizes, so a
        // minimization stores the negated costs.
        // The objective value is recomputed from the original costs, so the
        // row is scaled like the constraints.
        let obj_row = n_constraints;
        let scale = row_scale(&problem.objective.coefficients);
        for (j, &coef) in problem.objective.coefficients.iter().enumerate() {
            let cost = if problem.objective.minimize { -coef } else { coef };
            tableau.data[obj_row][j] = cost / scale;
        }

        tableau
    }

    /// Returns `Ok(false)` when no feasible basis exists.
    fn phase1(&self, tableau: &mut Tableau, pivots: &mut Pivots) -> Result<bool, SolverError> {
        let obj_row = tableau.obj_row();
        let n_cols = tableau.n_cols();
        let art_start = tableau.art_start();

        let orig_obj = tableau.data[obj_row].clone();

        // Maximize -sum(artificials)
        tableau.data[obj_row].iter_mut().for_each(|v| *v = 0.0);
        for j in art_start..(art_start + tableau.n_artificial) {
            tableau.data[obj_row][j] = -1.0;
        }
        // Price out the artificials sitting in the initial basis
        for i in 0..obj_row {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] += tableau.data[i][j];
                }
            }
        }

        match self.run(tableau, n_cols - 1, pivots)? {
            SimplexResult::Optimal => {}
            // Phase 1 is bounded above by zero; an open ray is round-off
            SimplexResult::Unbounded => {
                return Err(SolverError::NumericalBreakdown("phase 1 objective became unbounded"));
            }
        }

        let rhs_col = n_cols - 1;
        for i in 0..obj_row {
            if tableau.basic_vars[i] >= art_start && tableau.data[i][rhs_col].abs() > self.tolerance {
                return Ok(false);
            }
        }

        // Artificials still basic sit at zero; swap them for a structural or
        // slack column so phase 2 never moves them. Rows with nothing to swap
        // in are redundant and stay inert.
        for i in 0..obj_row {
            if tableau.basic_vars[i] < art_start {
                continue;
            }
            let replacement = (0..art_start).find(|&j| tableau.data[i][j].abs() > self.tolerance);
            if let Some(j) = replacement {
                self.pivot(tableau, i, j);
            }
        }

        // Restore original objective and price out the current basis
        tableau.data[obj_row] = orig_obj;
        for i in 0..obj_row {
            let basic = tableau.basic_vars[i];
            let ratio = tableau.data[obj_row][basic];
            if ratio.abs() > self.tolerance {
                for j in 0..n_cols {
                    tableau.data[obj_row][j] -= ratio * tableau.data[i][j];
                }
            }
        }

        Ok(true)
    }

    fn phase2(&self, tableau: &mut Tableau, pivots: &mut Pivots) -> Result<SimplexResult, SolverError> {
        // Artificial columns never re-enter
        let exclude_from = tableau.art_start();
        self.run(tableau, exclude_from, pivots)
    }

    /// Pivot until no column below `col_limit` improves the objective row.
    fn run(&self, tableau: &mut Tableau, col_limit: usize, pivots: &mut Pivots) -> Result<SimplexResult, SolverError> {
        let rhs_col = tableau.n_cols() - 1;
        loop {
            let bland = pivots.degenerate_streak >= DEGENERATE_STREAK_LIMIT;
            let Some(pivot_col) = self.find_pivot_column(tableau, col_limit, bland) else {
                return Ok(SimplexResult::Optimal);
            };
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col, bland) else {
                return Ok(SimplexResult::Unbounded);
            };
            if pivots.total >= self.max_iterations {
                return Err(SolverError::IterationLimit(pivots.total));
            }

            if tableau.data[pivot_row][rhs_col].abs() <= self.tolerance {
                pivots.degenerate_streak += 1;
            } else {
                pivots.degenerate_streak = 0;
            }
            self.pivot(tableau, pivot_row, pivot_col);
            pivots.total += 1;
        }
    }

    fn find_pivot_column(&self, tableau: &Tableau, col_limit: usize, bland: bool) -> Option<usize> {
        let obj_row = &tableau.data[tableau.obj_row()];

        if bland {
            // Lowest index with an improving reduced cost
            return (0..col_limit).find(|&j| obj_row[j] > self.tolerance);
        }

        // Most positive reduced cost; ties keep the lowest index
        let mut max_val = self.tolerance;
        let mut max_col = None;
        for (j, &val) in obj_row.iter().enumerate().take(col_limit) {
            if val > max_val {
                max_val = val;
                max_col = Some(j);
            }
        }
        max_col
    }

    fn find_pivot_row(&self, tableau: &Tableau, col: usize, bland: bool) -> Option<usize> {
        let n_constraints = tableau.obj_row();
        let rhs_col = tableau.n_cols() - 1;

        let mut min_ratio = f64::INFINITY;
        let mut min_row: Option<usize> = None;

        for i in 0..n_constraints {
            let val = tableau.data[i][col];
            if val <= self.tolerance {
                continue;
            }
            let ratio = (tableau.data[i][rhs_col] / val).max(0.0);
            let better = match min_row {
                None => true,
                Some(_) if ratio < min_ratio - self.tolerance => true,
                // Bland: among tied rows, the lowest basic variable leaves
                Some(r) if bland && (ratio - min_ratio).abs() <= self.tolerance => {
                    tableau.basic_vars[i] < tableau.basic_vars[r]
                }
                Some(_) => false,
            };
            if better {
                min_ratio = ratio;
                min_row = Some(i);
            }
        }

        min_row
    }

    fn pivot(&self, tableau: &mut Tableau, row: usize, col: usize) {
        let n_rows = tableau.data.len();
        let n_cols = tableau.n_cols();

        tableau.basic_vars[row] = col;

        // Scale pivot row
        let pivot_val = tableau.data[row][col];
        for j in 0..n_cols {
            tableau.data[row][j] /= pivot_val;
        }

        // Eliminate column in other rows
        let pivot_row = tableau.data[row].clone();
        for i in 0..n_rows {
            if i == row {
                continue;
            }
            let factor = tableau.data[i][col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..n_cols {
                tableau.data[i][j] -= factor * pivot_row[j];
            }
        }
    }

    fn extract_solution(&self, tableau: &Tableau, problem: &LpProblem, iterations: usize) -> Solution {
        let n_vars = problem.num_variables();
        let rhs_col = tableau.n_cols() - 1;

        let mut values = vec![0.0; n_vars];
        for (i, &basic) in tableau.basic_vars.iter().enumerate() {
            if basic < n_vars {
                let v = tableau.data[i][rhs_col];
                // Snap round-off around the non-negativity bound
                values[basic] = if v.abs() <= self.tolerance { 0.0 } else { v };
            }
        }

        let objective_value = problem
            .objective
            .coefficients
            .iter()
            .zip(&values)
            .map(|(c, v)| c * v)
            .sum();

        Solution {
            status: SolutionStatus::Optimal,
            values,
            objective_value,
            iterations,
        }
    }
}

/// Largest absolute coefficient, or 1 for an all-zero row
fn row_scale(coefficients: &[f64]) -> f64 {
    let max = coefficients.iter().fold(0.0_f64, |m, c| m.max(c.abs()));
    if max > 0.0 { max } else { 1.0 }
}

struct Tableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
}

impl Tableau {
    fn obj_row(&self) -> usize {
        self.data.len() - 1
    }

    fn n_cols(&self) -> usize {
        self.data[0].len()
    }

    fn art_start(&self) -> usize {
        self.n_vars + self.n_slack
    }
}

#[derive(Default)]
struct Pivots {
    total: usize,
    degenerate_streak: usize,
}

enum SimplexResult {
    Optimal,
    Unbounded,
}
