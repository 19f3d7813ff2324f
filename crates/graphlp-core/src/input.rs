//! Validation of raw form input into restrictions and objectives.
//!
//! This is the only place text becomes numbers; the evaluator and the
//! optimizer only ever see validated values.

use thiserror::Error;

use crate::restriction::{Objective, OptimizationType, RelOp, Restriction};
use crate::store::RestrictionStore;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("{field} must be numeric, got '{text}'")]
    NotNumeric { field: &'static str, text: String },
    #[error("{field} must be a finite number, got '{text}'")]
    NotFinite { field: &'static str, text: String },
    #[error("{field} is required")]
    Missing { field: &'static str },
    #[error("Restriction row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: Box<InputError>,
    },
}

/// Sign selector shown in front of the x2 coefficient
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sign {
    #[default]
    Plus,
    Minus,
}

/// How the sign selector combines with the typed x2 coefficient
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignPolicy {
    /// `b = sign * typed`; `-` with `-2` gives `2`
    #[default]
    Multiply,
    /// `b = sign * |typed|`; the selector alone decides the sign
    ForceMagnitude,
}

/// One restriction row as typed: `a (+/-) b (≤/≥) c`
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RestrictionRow {
    pub a: String,
    pub sign: Sign,
    pub b: String,
    pub op: Option<RelOp>,
    pub c: String,
}

/// The objective as typed: `Z = c1 x1 + c2 x2`, max or min
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveRow {
    pub coeff_x1: String,
    pub coeff_x2: String,
    pub optimization_type: OptimizationType,
}

impl RestrictionRow {
    pub fn new(a: impl Into<String>, sign: Sign, b: impl Into<String>, op: RelOp, c: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            sign,
            b: b.into(),
            op: Some(op),
            c: c.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.a.trim().is_empty() && self.b.trim().is_empty() && self.c.trim().is_empty()
    }

    /// `Ok(None)` for a blank row; a blank single field counts as zero.
    /// A row without an operator is read as `≤`.
    pub fn parse(&self, policy: SignPolicy) -> Result<Option<Restriction>, InputError> {
        if self.is_blank() {
            return Ok(None);
        }

        let a = parse_or_zero("x1 coefficient", &self.a)?;
        let typed_b = parse_or_zero("x2 coefficient", &self.b)?;
        let c = parse_or_zero("right-hand side", &self.c)?;

        let sign = match self.sign {
            Sign::Plus => 1.0,
            Sign::Minus => -1.0,
        };
        let b = match policy {
            SignPolicy::Multiply => sign * typed_b,
            SignPolicy::ForceMagnitude => sign * typed_b.abs(),
        };

        Ok(Some(Restriction::new(a, b, self.op.unwrap_or(RelOp::Le), c)))
    }
}

impl ObjectiveRow {
    pub fn new(coeff_x1: impl Into<String>, coeff_x2: impl Into<String>, optimization_type: OptimizationType) -> Self {
        Self {
            coeff_x1: coeff_x1.into(),
            coeff_x2: coeff_x2.into(),
            optimization_type,
        }
    }

    /// Both coefficients are required.
    pub fn parse(&self) -> Result<Objective, InputError> {
        let coeff_x1 = parse_required("objective x1 coefficient", &self.coeff_x1)?;
        let coeff_x2 = parse_required("objective x2 coefficient", &self.coeff_x2)?;
        Ok(Objective::new(coeff_x1, coeff_x2, self.optimization_type))
    }
}

/// Refill `store` from `rows`, skipping blank rows.
///
/// The store is cleared first so restrictions from an earlier solve never
/// leak in; on error it holds only the rows before the offending one.
pub fn collect_rows(rows: &[RestrictionRow], policy: SignPolicy, store: &mut RestrictionStore) -> Result<usize, InputError> {
    store.clear();
    for (i, row) in rows.iter().enumerate() {
        let parsed = row.parse(policy).map_err(|e| InputError::Row {
            row: i + 1,
            source: Box::new(e),
        })?;
        if let Some(restriction) = parsed {
            store.add(restriction);
        }
    }
    Ok(store.len())
}

fn parse_or_zero(field: &'static str, text: &str) -> Result<f64, InputError> {
    if text.trim().is_empty() {
        Ok(0.0)
    } else {
        parse_required(field, text)
    }
}

fn parse_required(field: &'static str, text: &str) -> Result<f64, InputError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(InputError::Missing { field });
    }
    let value: f64 = trimmed.parse().map_err(|_| InputError::NotNumeric {
        field,
        text: trimmed.to_string(),
    })?;
    if !value.is_finite() {
        return Err(InputError::NotFinite {
            field,
            text: trimmed.to_string(),
        });
    }
    Ok(value)
}
