use crate::feasibility::{self, BoundaryLine, FeasibilityMask, Grid};
use crate::input::{collect_rows, InputError, ObjectiveRow, RestrictionRow, SignPolicy};
use crate::optimizer::{binding_restrictions, OptimizationResult, Optimizer};
use crate::restriction::{Objective, Restriction};
use crate::store::RestrictionStore;

/// Absolute tolerance for deciding which boundaries pass through the optimum
const BINDING_TOLERANCE: f64 = 1e-6;

/// Everything a renderer needs to draw one solve
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PlotPayload {
    pub grid: Grid,
    pub axis: Vec<f64>,
    pub mask: FeasibilityMask,
    pub lines: Vec<BoundaryLine>,
    /// The evaluated snapshot; renderers draw `b == 0` boundaries from it
    pub restrictions: Vec<Restriction>,
    pub objective: Option<Objective>,
    pub result: Option<OptimizationResult>,
    /// Indices into `restrictions` whose boundary meets the optimal vertex
    pub binding: Vec<usize>,
}

impl PlotPayload {
    pub fn build(restrictions: &[Restriction], objective: Option<&Objective>, grid: &Grid) -> Self {
        Self::build_with(&Optimizer::default(), restrictions, objective, grid)
    }

    /// Build from a snapshot of `store`; later edits to the store do not reach the payload.
    pub fn from_store(store: &RestrictionStore, objective: Option<&Objective>, grid: &Grid) -> Self {
        Self::build(&store.snapshot(), objective, grid)
    }

    /// Validate form rows into `store`, then build from it.
    ///
    /// Nothing is sampled or solved when a row or the objective is invalid.
    pub fn from_form(
        rows: &[RestrictionRow],
        objective: Option<&ObjectiveRow>,
        policy: SignPolicy,
        store: &mut RestrictionStore,
        grid: &Grid,
    ) -> Result<Self, InputError> {
        collect_rows(rows, policy, store)?;
        let objective = objective.map(ObjectiveRow::parse).transpose()?;
        Ok(Self::from_store(store, objective.as_ref(), grid))
    }

    /// Sample the region, then optimize when an objective is given.
    pub fn build_with(
        optimizer: &Optimizer,
        restrictions: &[Restriction],
        objective: Option<&Objective>,
        grid: &Grid,
    ) -> Self {
        let report = feasibility::evaluate(restrictions, grid);
        let result = objective.map(|o| optimizer.optimize(restrictions, o));
        let binding = match result.as_ref().and_then(OptimizationResult::vertex) {
            Some((x1, x2)) => binding_restrictions(restrictions, x1, x2, BINDING_TOLERANCE),
            None => Vec::new(),
        };

        Self {
            grid: *grid,
            axis: report.axis,
            mask: report.mask,
            lines: report.lines,
            restrictions: restrictions.to_vec(),
            objective: objective.copied(),
            result,
            binding,
        }
    }

    pub fn title(&self) -> String {
        match self.objective {
            Some(_) => "Feasible Region with Optimal Solution".to_string(),
            None => "Feasible Region".to_string(),
        }
    }

    /// Marker text for the optimal vertex
    pub fn annotation(&self) -> Option<String> {
        match self.result {
            Some(OptimizationResult::Optimal { x1, x2, z }) => {
                Some(format!("Optimal: ({:.2}, {:.2})\nZ = {:.2}", x1, x2, z))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn textbook() -> Vec<Restriction> {
        vec![
            Restriction::le(1.0, 1.0, 4.0),
            Restriction::le(1.0, 0.0, 3.0),
            Restriction::le(0.0, 1.0, 3.0),
        ]
    }

    #[test]
    fn test_build_without_objective() {
        let grid = Grid::new(0.0, 10.0, 11);
        let payload = PlotPayload::build(&textbook(), None, &grid);

        assert_eq!(payload.title(), "Feasible Region");
        assert_eq!(payload.result, None);
        assert!(payload.binding.is_empty());
        assert_eq!(payload.lines.len(), 2);
        assert_eq!(payload.axis.len(), 11);
        assert_eq!(payload.restrictions.len(), 3);
        assert_eq!(payload.annotation(), None);
    }

    #[test]
    fn test_build_with_objective() {
        let grid = Grid::new(0.0, 10.0, 11);
        let objective = Objective::maximize(3.0, 2.0);
        let payload = PlotPayload::build(&textbook(), Some(&objective), &grid);

        assert_eq!(payload.title(), "Feasible Region with Optimal Solution");
        assert!(payload.result.as_ref().is_some_and(OptimizationResult::is_optimal));
        assert_eq!(payload.binding, vec![0, 1]);
        assert_eq!(payload.annotation().as_deref(), Some("Optimal: (3.00, 1.00)\nZ = 11.00"));
        // The optimum is a sampled, feasible point on this grid
        assert!(payload.mask.is_feasible_at(3, 1));
    }

    #[test]
    fn test_infeasible_payload_keeps_mask() {
        let grid = Grid::new(0.0, 10.0, 11);
        let restrictions = [Restriction::ge(1.0, 0.0, 5.0), Restriction::le(1.0, 0.0, 2.0)];
        let payload = PlotPayload::build(&restrictions, Some(&Objective::maximize(1.0, 1.0)), &grid);

        assert_eq!(payload.result, Some(OptimizationResult::Infeasible));
        assert!(payload.binding.is_empty());
        assert!(!payload.mask.any());
    }

    #[test]
    fn test_from_store_takes_a_snapshot() {
        let grid = Grid::new(0.0, 10.0, 11);
        let mut store: RestrictionStore = textbook().into_iter().collect();
        let payload = PlotPayload::from_store(&store, Some(&Objective::maximize(3.0, 2.0)), &grid);
        store.clear();

        assert_eq!(payload.restrictions, textbook());
        assert_eq!(payload.binding, vec![0, 1]);
    }

    #[test]
    fn test_from_form() {
        use crate::input::Sign;
        use crate::restriction::{OptimizationType, RelOp};

        let grid = Grid::new(0.0, 10.0, 11);
        let rows = vec![
            RestrictionRow::new("1", Sign::Plus, "1", RelOp::Le, "4"),
            RestrictionRow::default(),
            RestrictionRow::new("1", Sign::Plus, "", RelOp::Le, "3"),
            RestrictionRow::new("", Sign::Plus, "1", RelOp::Le, "3"),
        ];
        let objective = ObjectiveRow::new("3", "2", OptimizationType::Max);
        let mut store = RestrictionStore::new();

        let payload =
            PlotPayload::from_form(&rows, Some(&objective), SignPolicy::default(), &mut store, &grid).unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(payload.restrictions, textbook());
        assert_eq!(payload.annotation().as_deref(), Some("Optimal: (3.00, 1.00)\nZ = 11.00"));
    }

    #[test]
    fn test_from_form_rejects_bad_objective() {
        use crate::restriction::OptimizationType;

        let grid = Grid::new(0.0, 10.0, 11);
        let objective = ObjectiveRow::new("3", "abc", OptimizationType::Max);
        let mut store = RestrictionStore::new();

        let result = PlotPayload::from_form(&[], Some(&objective), SignPolicy::default(), &mut store, &grid);

        assert!(matches!(result, Err(InputError::NotNumeric { .. })));
    }
}
