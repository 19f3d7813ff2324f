//! Sampled feasible region.
//!
//! The region is approximated on an `R×R` grid over `[lo, hi]²`; this is a
//! picture of the restrictions, not an exact vertex enumeration.

use thiserror::Error;
use tracing::{debug, warn};

use crate::restriction::{RelOp, Restriction};

/// Largest samples-per-axis the evaluator will allocate a mask for.
///
/// Larger resolutions are sampled at this value instead.
pub const MAX_RESOLUTION: usize = 4000;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("Resolution {resolution} exceeds the maximum of {max}")]
    ResolutionTooLarge { resolution: usize, max: usize },
    #[error("Grid bounds must be finite, got [{lo}, {hi}]")]
    NonFiniteBounds { lo: f64, hi: f64 },
}

/// Square sampling domain shared by both axes
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub lo: f64,
    pub hi: f64,
    pub resolution: usize,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            lo: 0.0,
            hi: 50.0,
            resolution: 500,
        }
    }
}

impl Grid {
    pub fn new(lo: f64, hi: f64, resolution: usize) -> Self {
        Self { lo, hi, resolution }
    }

    /// Like [`Grid::new`], but rejects grids the evaluator would cap or
    /// could not sample.
    pub fn checked(lo: f64, hi: f64, resolution: usize) -> Result<Self, GridError> {
        let grid = Self::new(lo, hi, resolution);
        grid.validate()?;
        Ok(grid)
    }

    pub fn validate(&self) -> Result<(), GridError> {
        if !self.lo.is_finite() || !self.hi.is_finite() {
            return Err(GridError::NonFiniteBounds { lo: self.lo, hi: self.hi });
        }
        if self.resolution > MAX_RESOLUTION {
            return Err(GridError::ResolutionTooLarge {
                resolution: self.resolution,
                max: MAX_RESOLUTION,
            });
        }
        Ok(())
    }

    /// Samples per axis actually taken, at most [`MAX_RESOLUTION`]
    pub fn effective_resolution(&self) -> usize {
        self.resolution.min(MAX_RESOLUTION)
    }

    pub fn with_range(mut self, lo: f64, hi: f64) -> Self {
        self.lo = lo;
        self.hi = hi;
        self
    }

    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution;
        self
    }

    /// Evenly spaced samples from `lo` to `hi`, both inclusive, one per
    /// [`Grid::effective_resolution`].
    pub fn samples(&self) -> Vec<f64> {
        match self.effective_resolution() {
            0 => Vec::new(),
            1 => vec![self.lo],
            n => {
                let step = (self.hi - self.lo) / (n - 1) as f64;
                let mut samples: Vec<f64> = (0..n).map(|i| self.lo + step * i as f64).collect();
                samples[n - 1] = self.hi;
                samples
            }
        }
    }
}

/// Row-major boolean grid; row `i` is the i-th x2 sample, column `j` the j-th x1 sample.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeasibilityMask {
    resolution: usize,
    cells: Vec<bool>,
}

impl FeasibilityMask {
    /// A uniform mask; `resolution` is capped at [`MAX_RESOLUTION`].
    pub fn filled(resolution: usize, value: bool) -> Self {
        let resolution = resolution.min(MAX_RESOLUTION);
        Self {
            resolution,
            cells: vec![value; resolution * resolution],
        }
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn get(&self, row: usize, col: usize) -> Option<bool> {
        if row < self.resolution && col < self.resolution {
            Some(self.cells[row * self.resolution + col])
        } else {
            None
        }
    }

    /// Lookup by sample indices in `(x1, x2)` order.
    pub fn is_feasible_at(&self, i_x1: usize, i_x2: usize) -> bool {
        self.get(i_x2, i_x1).unwrap_or(false)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        // chunks(0) panics; an empty mask has no rows anyway
        self.cells.chunks(self.resolution.max(1))
    }

    pub fn count_feasible(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn all(&self) -> bool {
        self.cells.iter().all(|&c| c)
    }

    pub fn any(&self) -> bool {
        self.cells.iter().any(|&c| c)
    }

    /// Elementwise conjunction. Masks of different resolution share no cells
    /// and yield an all-false mask of `self`'s resolution.
    pub fn and(&self, other: &FeasibilityMask) -> FeasibilityMask {
        if self.resolution != other.resolution {
            return FeasibilityMask::filled(self.resolution, false);
        }
        FeasibilityMask {
            resolution: self.resolution,
            cells: self.cells.iter().zip(&other.cells).map(|(a, b)| *a && *b).collect(),
        }
    }

    fn conjoin(&mut self, restriction: &Restriction, axis: &[f64]) {
        let Restriction { a, b, op, c } = *restriction;
        for (row, &y) in self.cells.chunks_mut(self.resolution.max(1)).zip(axis) {
            for (cell, &x) in row.iter_mut().zip(axis) {
                let lhs = a * x + b * y;
                let holds = match op {
                    RelOp::Le => lhs <= c,
                    RelOp::Ge => lhs >= c,
                };
                *cell &= holds;
            }
        }
    }
}

/// Sampled boundary `x2 = (c - a*x1) / b` of one restriction
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryLine {
    pub label: String,
    /// Position of the restriction in the evaluated snapshot
    pub restriction_index: usize,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
}

/// Everything the sampler produces for one snapshot
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FeasibilityReport {
    pub axis: Vec<f64>,
    pub mask: FeasibilityMask,
    pub lines: Vec<BoundaryLine>,
}

/// Evaluate the feasibility mask and the boundary lines of `restrictions` over `grid`.
///
/// Restrictions with `b == 0` constrain the mask but get no boundary line.
pub fn evaluate_feasibility(restrictions: &[Restriction], grid: &Grid) -> (FeasibilityMask, Vec<BoundaryLine>) {
    let report = evaluate(restrictions, grid);
    (report.mask, report.lines)
}

pub fn evaluate(restrictions: &[Restriction], grid: &Grid) -> FeasibilityReport {
    if grid.resolution > MAX_RESOLUTION {
        warn!(
            requested = grid.resolution,
            max = MAX_RESOLUTION,
            "resolution capped"
        );
    }
    let axis = grid.samples();
    let mut mask = FeasibilityMask::filled(axis.len(), true);
    let mut lines = Vec::new();

    for (index, restriction) in restrictions.iter().enumerate() {
        if restriction.b != 0.0 {
            let ys = axis
                .iter()
                .map(|&x| (restriction.c - restriction.a * x) / restriction.b)
                .collect();
            lines.push(BoundaryLine {
                label: restriction.label(),
                restriction_index: index,
                xs: axis.clone(),
                ys,
            });
        }
        mask.conjoin(restriction, &axis);
    }

    debug!(
        restrictions = restrictions.len(),
        resolution = axis.len(),
        feasible_cells = mask.count_feasible(),
        "evaluated feasibility grid"
    );

    FeasibilityReport { axis, mask, lines }
}
