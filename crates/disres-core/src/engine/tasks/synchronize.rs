use crate::engine::config::GlobalParameters;
use crate::engine::error::EngineError;
use crate::engine::history::DurableHistory;
use crate::engine::state::WorkingSet;
use tracing::{instrument, trace};

/// Stores the running averages and warm-up factor of the last aggregation into `history`.
///
/// Must run once per integration step, after every aggregation and evaluation of that step.
/// Does nothing when time averaging is off.
#[instrument(skip_all, name = "disres_synchronize_task")]
pub fn run(
    params: &GlobalParameters,
    working: &WorkingSet,
    history: Option<&mut DurableHistory>,
) -> Result<(), EngineError> {
    if !params.time_averaging() {
        return Ok(());
    }
    let history = history.ok_or(EngineError::MissingHistory)?;
    if history.num_pairs() != working.running_inv_cube.len() {
        return Err(EngineError::HistoryMismatch {
            expected: working.running_inv_cube.len(),
            found: history.num_pairs(),
        });
    }

    history.commit(working.warmup_product, &working.running_inv_cube);
    trace!(
        warmup_factor = working.warmup_product,
        "Distance restraint history updated."
    );
    Ok(())
}
