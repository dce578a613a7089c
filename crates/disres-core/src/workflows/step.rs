use crate::core::forcefield::term::RestraintTerm;
use crate::core::geometry::PeriodicBoundary;
use crate::engine::DistanceRestraints;
use crate::engine::ensemble::EnsembleContext;
use crate::engine::error::EngineError;
use crate::engine::forces::ForceBuffers;
use crate::engine::history::DurableHistory;
use nalgebra::Point3;
use tracing::{instrument, warn};

/// Per-step inputs shared by all stages.
#[derive(Clone, Copy)]
pub struct StepInput<'a> {
    pub positions: &'a [Point3<f64>],
    pub pbc: Option<&'a dyn PeriodicBoundary>,
    pub ensemble: Option<&'a dyn EnsembleContext>,
}

impl<'a> StepInput<'a> {
    pub fn new(positions: &'a [Point3<f64>]) -> Self {
        Self {
            positions,
            pbc: None,
            ensemble: None,
        }
    }

    pub fn with_pbc(mut self, pbc: &'a dyn PeriodicBoundary) -> Self {
        self.pbc = Some(pbc);
        self
    }

    pub fn with_ensemble(mut self, ensemble: &'a dyn EnsembleContext) -> Self {
        self.ensemble = Some(ensemble);
        self
    }
}

/// Runs one full integration step of the restraint term.
///
/// The history is read by the aggregation and only written after the evaluation has
/// finished, so the energy and forces of this step are based on the previous averages.
#[instrument(skip_all, name = "disres_step_workflow")]
pub fn run(
    restraints: &mut DistanceRestraints,
    input: StepInput<'_>,
    mut history: Option<&mut DurableHistory>,
    buffers: &mut ForceBuffers<'_>,
) -> Result<RestraintTerm, EngineError> {
    restraints.aggregate(
        input.positions,
        input.pbc,
        history.as_deref(),
        input.ensemble,
    )?;
    let term = restraints.evaluate(input.positions, input.pbc, buffers)?;
    if !term.is_finite() {
        warn!(
            energy = term.energy,
            "Distance restraint step produced a non-finite energy."
        );
    }
    restraints.synchronize(history.as_deref_mut())?;
    Ok(term)
}
