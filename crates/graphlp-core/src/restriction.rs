use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Relational operator of a restriction. Both directions are non-strict.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelOp {
    /// Less than or equal (≤)
    Le,
    /// Greater than or equal (≥)
    Ge,
}

/// Direction of optimization
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptimizationType {
    Max,
    Min,
}

/// One linear inequality `a*x1 + b*x2 op c`.
///
/// `a = b = 0` is legal and describes either the whole plane or nothing.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Restriction {
    pub a: f64,
    pub b: f64,
    pub op: RelOp,
    pub c: f64,
}

/// Linear objective `Z = coeff_x1*x1 + coeff_x2*x2`
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Objective {
    pub coeff_x1: f64,
    pub coeff_x2: f64,
    pub optimization_type: OptimizationType,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind}: '{text}'")]
pub struct UnknownSymbol {
    pub kind: &'static str,
    pub text: String,
}

impl Restriction {
    pub fn new(a: f64, b: f64, op: RelOp, c: f64) -> Self {
        Self { a, b, op, c }
    }

    pub fn le(a: f64, b: f64, c: f64) -> Self {
        Self::new(a, b, RelOp::Le, c)
    }

    pub fn ge(a: f64, b: f64, c: f64) -> Self {
        Self::new(a, b, RelOp::Ge, c)
    }

    /// Left-hand side `a*x1 + b*x2`
    pub fn lhs(&self, x1: f64, x2: f64) -> f64 {
        self.a * x1 + self.b * x2
    }

    /// Plain IEEE comparison, no tolerance: boundary points satisfy both directions.
    pub fn is_satisfied(&self, x1: f64, x2: f64) -> bool {
        let lhs = self.lhs(x1, x2);
        match self.op {
            RelOp::Le => lhs <= self.c,
            RelOp::Ge => lhs >= self.c,
        }
    }

    /// The boundary line solved for x2, or `None` for a vertical boundary (`b == 0`).
    pub fn boundary_y(&self, x: f64) -> Option<f64> {
        if self.b == 0.0 {
            None
        } else {
            Some((self.c - self.a * x) / self.b)
        }
    }

    /// The x1 of a vertical boundary `x1 = c / a`; `None` unless `b == 0` and `a != 0`.
    pub fn vertical_x(&self) -> Option<f64> {
        if self.b == 0.0 && self.a != 0.0 {
            Some(self.c / self.a)
        } else {
            None
        }
    }

    pub fn is_finite(&self) -> bool {
        self.a.is_finite() && self.b.is_finite() && self.c.is_finite()
    }

    /// Legend label, e.g. `1.0x1 + 2.0x2 ≤ 10.0`
    pub fn label(&self) -> String {
        format!("{:?}x1 + {:?}x2 {} {:?}", self.a, self.b, self.op, self.c)
    }
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl Objective {
    pub fn new(coeff_x1: f64, coeff_x2: f64, optimization_type: OptimizationType) -> Self {
        Self {
            coeff_x1,
            coeff_x2,
            optimization_type,
        }
    }

    pub fn maximize(coeff_x1: f64, coeff_x2: f64) -> Self {
        Self::new(coeff_x1, coeff_x2, OptimizationType::Max)
    }

    pub fn minimize(coeff_x1: f64, coeff_x2: f64) -> Self {
        Self::new(coeff_x1, coeff_x2, OptimizationType::Min)
    }

    /// Z at `(x1, x2)` with the coefficients as given, whatever the direction.
    pub fn value(&self, x1: f64, x2: f64) -> f64 {
        self.coeff_x1 * x1 + self.coeff_x2 * x2
    }

    pub fn is_finite(&self) -> bool {
        self.coeff_x1.is_finite() && self.coeff_x2.is_finite()
    }

    pub fn label(&self) -> String {
        format!(
            "{} Z = {:?}x1 + {:?}x2",
            self.optimization_type, self.coeff_x1, self.coeff_x2
        )
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelOp::Le => write!(f, "≤"),
            RelOp::Ge => write!(f, "≥"),
        }
    }
}

impl FromStr for RelOp {
    type Err = UnknownSymbol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<=" | "≤" => Ok(RelOp::Le),
            ">=" | "≥" => Ok(RelOp::Ge),
            other => Err(UnknownSymbol {
                kind: "operator",
                text: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for OptimizationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizationType::Max => write!(f, "max"),
            OptimizationType::Min => write!(f, "min"),
        }
    }
}

impl FromStr for OptimizationType {
    type Err = UnknownSymbol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "max" => Ok(OptimizationType::Max),
            "min" => Ok(OptimizationType::Min),
            _ => Err(UnknownSymbol {
                kind: "optimization type",
                text: s.trim().to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_points_satisfy_both_directions() {
        let le = Restriction::le(1.0, 1.0, 10.0);
        let ge = Restriction::ge(1.0, 1.0, 10.0);
        assert!(le.is_satisfied(4.0, 6.0));
        assert!(ge.is_satisfied(4.0, 6.0));
        assert!(!le.is_satisfied(4.0, 6.5));
        assert!(!ge.is_satisfied(4.0, 5.5));
    }

    #[test]
    fn test_degenerate_restriction() {
        let always = Restriction::le(0.0, 0.0, 1.0);
        let never = Restriction::ge(0.0, 0.0, 1.0);
        assert!(always.is_satisfied(30.0, 40.0));
        assert!(!never.is_satisfied(30.0, 40.0));
        assert_eq!(always.boundary_y(1.0), None);
        assert_eq!(always.vertical_x(), None);
    }

    #[test]
    fn test_boundary_geometry() {
        let r = Restriction::le(2.0, 4.0, 8.0);
        assert_eq!(r.boundary_y(0.0), Some(2.0));
        assert_eq!(r.boundary_y(4.0), Some(0.0));

        let vertical = Restriction::ge(2.0, 0.0, 5.0);
        assert_eq!(vertical.boundary_y(3.0), None);
        assert_eq!(vertical.vertical_x(), Some(2.5));
    }

    #[test]
    fn test_labels() {
        assert_eq!(Restriction::le(1.0, 2.0, 10.0).label(), "1.0x1 + 2.0x2 ≤ 10.0");
        assert_eq!(Restriction::ge(-1.5, 0.0, -3.0).to_string(), "-1.5x1 + 0.0x2 ≥ -3.0");
        assert_eq!(Objective::maximize(3.0, 2.0).label(), "max Z = 3.0x1 + 2.0x2");
    }

    #[test]
    fn test_objective_value_ignores_direction() {
        let max = Objective::maximize(3.0, 2.0);
        let min = Objective::minimize(3.0, 2.0);
        assert_eq!(max.value(3.0, 1.0), 11.0);
        assert_eq!(min.value(3.0, 1.0), 11.0);
    }

    #[test]
    fn test_finiteness() {
        assert!(Restriction::le(1.0, 1.0, 1.0).is_finite());
        assert!(!Restriction::le(f64::NAN, 1.0, 1.0).is_finite());
        assert!(!Objective::minimize(1.0, f64::INFINITY).is_finite());
    }

    #[test]
    fn test_parse_symbols() {
        assert_eq!("<=".parse::<RelOp>(), Ok(RelOp::Le));
        assert_eq!("≥".parse::<RelOp>(), Ok(RelOp::Ge));
        assert!("<".parse::<RelOp>().is_err());
        assert_eq!(" MAX ".parse::<OptimizationType>(), Ok(OptimizationType::Max));
        assert_eq!("min".parse::<OptimizationType>(), Ok(OptimizationType::Min));
        let err = "best".parse::<OptimizationType>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown optimization type: 'best'");
    }
}
