use crate::simplex::SolverError;

/// A linear program over non-negative variables
#[derive(Debug, Clone)]
pub struct LpProblem {
    /// Variable names
    pub variables: Vec<String>,
    /// Objective function coefficients
    pub objective: Objective,
    /// Constraints
    pub constraints: Vec<Constraint>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Objective {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Whether to minimize or maximize
    pub minimize: bool,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

impl LpProblem {
    pub fn new(variables: Vec<String>) -> Self {
        let n = variables.len();
        Self {
            variables,
            objective: Objective {
                coefficients: vec![0.0; n],
                minimize: true,
            },
            constraints: Vec::new(),
        }
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, minimize: bool) {
        self.objective = Objective { coefficients, minimize };
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) {
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            op,
            rhs,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Reject coefficient vectors the tableau cannot hold and values that
    /// would poison every pivot (NaN, infinities).
    pub fn validate(&self) -> Result<(), SolverError> {
        let n = self.num_variables();

        if self.objective.coefficients.len() > n {
            return Err(SolverError::DimensionMismatch {
                name: "objective".to_string(),
                found: self.objective.coefficients.len(),
                expected: n,
            });
        }
        if let Some(bad) = self.objective.coefficients.iter().find(|v| !v.is_finite()) {
            return Err(SolverError::NonFiniteCoefficient {
                name: "objective".to_string(),
                value: *bad,
            });
        }

        for c in &self.constraints {
            if c.coefficients.len() > n {
                return Err(SolverError::DimensionMismatch {
                    name: c.name.clone(),
                    found: c.coefficients.len(),
                    expected: n,
                });
            }
            let bad = c
                .coefficients
                .iter()
                .chain(std::iter::once(&c.rhs))
                .find(|v| !v.is_finite());
            if let Some(bad) = bad {
                return Err(SolverError::NonFiniteCoefficient {
                    name: c.name.clone(),
                    value: *bad,
                });
            }
        }

        Ok(())
    }
}
