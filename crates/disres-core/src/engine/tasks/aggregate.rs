use crate::core::forcefield::potentials::{self, AveragingFactors};
use crate::core::geometry::{self, PeriodicBoundary};
use crate::core::models::table::RestraintTable;
use crate::engine::config::GlobalParameters;
use crate::engine::ensemble::EnsembleContext;
use crate::engine::error::EngineError;
use crate::engine::history::DurableHistory;
use crate::engine::state::WorkingSet;
use nalgebra::Point3;
use tracing::{debug, instrument};

/// Computes per-pair distances, running r⁻³ averages and per-restraint r⁻⁶ aggregates.
///
/// Reads `history` but never writes it: the new running averages and the next warm-up
/// factor land in `working`, so repeated calls within one step give identical results.
#[instrument(skip_all, name = "disres_aggregate_task")]
pub fn run(
    table: &RestraintTable,
    params: &GlobalParameters,
    working: &mut WorkingSet,
    positions: &[Point3<f64>],
    pbc: Option<&dyn PeriodicBoundary>,
    history: Option<&DurableHistory>,
    ensemble: Option<&dyn EnsembleContext>,
) -> Result<(), EngineError> {
    if table.is_empty() {
        return Ok(());
    }
    check_atoms(table, positions.len())?;

    let averaging = if params.time_averaging() {
        let history = history.ok_or(EngineError::MissingHistory)?;
        if history.num_pairs() != table.num_pairs() {
            return Err(EngineError::HistoryMismatch {
                expected: table.num_pairs(),
                found: history.num_pairs(),
            });
        }
        let factors = AveragingFactors::new(
            params.decay_factor,
            params.complement_decay,
            history.warmup_factor(),
        );
        working.warmup_product = factors.warmup_product;
        Some((factors, history.running_averages()))
    } else {
        None
    };

    let inv_replicas = ensemble.map(|e| 1.0 / e.num_replicas() as f64);
    let WorkingSet {
        distances,
        running_inv_cube,
        aggregates,
        replica_local,
        ..
    } = working;
    let (instant, averaged) = aggregates.split_mut();

    for (res, restraint) in table.restraints().iter().enumerate() {
        let mut instant_sum = 0.0;
        let mut averaged_sum = 0.0;

        for pair_index in restraint.pair_range() {
            let pair = table.pairs()[pair_index];
            let (dx, _) = geometry::displacement(
                pbc,
                &positions[pair.atom_a],
                &positions[pair.atom_b],
            );
            let dist_sq = dx.norm_squared();
            let inv_cube = potentials::inverse_cube(dist_sq);

            distances[pair_index] = dist_sq.sqrt();
            running_inv_cube[pair_index] = match &averaging {
                Some((factors, previous)) => factors.advance(previous[pair_index], inv_cube),
                None => inv_cube,
            };

            instant_sum += inv_cube * inv_cube;
            averaged_sum += running_inv_cube[pair_index] * running_inv_cube[pair_index];
        }

        instant[res] = instant_sum;
        averaged[res] = averaged_sum;

        if let Some(inv_n) = inv_replicas {
            if let Some(local) = replica_local.as_mut() {
                local[res] = instant_sum;
            }
            instant[res] *= inv_n;
            averaged[res] *= inv_n;
        }
    }

    if let Some(ensemble) = ensemble {
        ensemble.sum(aggregates.as_mut_slice());
    }

    debug!(
        restraints = table.num_restraints(),
        pairs = table.num_pairs(),
        warmup_product = working.warmup_product,
        "Distance restraint aggregates computed."
    );

    Ok(())
}

pub(crate) fn check_atoms(table: &RestraintTable, num_atoms: usize) -> Result<(), EngineError> {
    for (pair, p) in table.pairs().iter().enumerate() {
        for atom in [p.atom_a, p.atom_b] {
            if atom >= num_atoms {
                return Err(EngineError::AtomOutOfRange {
                    pair,
                    atom,
                    num_atoms,
                });
            }
        }
    }
    Ok(())
}
