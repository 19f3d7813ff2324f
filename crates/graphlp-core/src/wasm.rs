//! WASM bindings for graphlp
//!
//! JavaScript-friendly entry points so a browser form can act as the input
//! and rendering layer.

use wasm_bindgen::prelude::*;

use crate::feasibility::Grid;
use crate::input::{ObjectiveRow, RestrictionRow, SignPolicy};
use crate::parser::{ParseError, Parser};
use crate::plot::PlotPayload;
use crate::store::RestrictionStore;

/// Parse problem text and return it as JSON
#[wasm_bindgen]
pub fn parse(source: &str) -> Result<JsValue, JsValue> {
    let problem = Parser::parse(source).map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_wasm_bindgen::to_value(&problem).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Validate problem text and return diagnostics as JSON
#[wasm_bindgen]
pub fn validate(source: &str) -> JsValue {
    let diagnostics = get_diagnostics(source);
    serde_wasm_bindgen::to_value(&diagnostics).unwrap_or(JsValue::NULL)
}

/// Parse, sample, and optimize; returns the full plot payload.
///
/// Resolutions above [`MAX_RESOLUTION`](crate::feasibility::MAX_RESOLUTION)
/// are rejected.
#[wasm_bindgen]
pub fn solve(source: &str, lo: f64, hi: f64, resolution: usize) -> Result<JsValue, JsValue> {
    let problem = Parser::parse(source).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let grid = Grid::checked(lo, hi, resolution).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let payload = PlotPayload::from_store(&problem.store(), problem.objective.as_ref(), &grid);
    serde_wasm_bindgen::to_value(&payload).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Solve straight from form rows (`RestrictionRow[]` and an optional `ObjectiveRow`)
#[wasm_bindgen]
pub fn solve_form(
    rows: JsValue,
    objective: JsValue,
    force_magnitude: bool,
    lo: f64,
    hi: f64,
    resolution: usize,
) -> Result<JsValue, JsValue> {
    let rows: Vec<RestrictionRow> =
        serde_wasm_bindgen::from_value(rows).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let objective: Option<ObjectiveRow> =
        serde_wasm_bindgen::from_value(objective).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let policy = if force_magnitude {
        SignPolicy::ForceMagnitude
    } else {
        SignPolicy::Multiply
    };
    let grid = Grid::checked(lo, hi, resolution).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let mut store = RestrictionStore::new();
    let payload = PlotPayload::from_form(&rows, objective.as_ref(), policy, &mut store, &grid)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_wasm_bindgen::to_value(&payload).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[derive(serde::Serialize)]
struct Diagnostic {
    start: usize,
    end: usize,
    line: usize,
    column: usize,
    severity: String,
    message: String,
}

fn get_diagnostics(source: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    match Parser::parse(source) {
        Err(e) => diagnostics.push(error_diagnostic(source, &e)),
        Ok(problem) => {
            for (i, r) in problem.restrictions.iter().enumerate() {
                if r.a == 0.0 && r.b == 0.0 {
                    diagnostics.push(Diagnostic {
                        start: 0,
                        end: source.len(),
                        line: 0,
                        column: 0,
                        severity: "warning".to_string(),
                        message: format!(
                            "Restriction {} has no variable terms and is either always or never satisfied",
                            i + 1
                        ),
                    });
                }
            }
            if problem.objective.is_none() {
                diagnostics.push(Diagnostic {
                    start: 0,
                    end: 0,
                    line: 0,
                    column: 0,
                    severity: "info".to_string(),
                    message: "No objective; only the feasible region will be drawn".to_string(),
                });
            }
        }
    }

    diagnostics
}

fn error_diagnostic(source: &str, error: &ParseError) -> Diagnostic {
    let span = error.span();
    let (line, column) = span.line_col(source);
    Diagnostic {
        start: span.start,
        end: span.end,
        line,
        column,
        severity: "error".to_string(),
        message: error.to_string(),
    }
}
