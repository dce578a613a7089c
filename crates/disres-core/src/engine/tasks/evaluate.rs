use crate::core::forcefield::potentials;
use crate::core::forcefield::term::RestraintTerm;
use crate::core::geometry::{self, CENTRAL_SHIFT, PeriodicBoundary};
use crate::core::models::restraint::RestraintKind;
use crate::core::models::table::{Restraint, RestraintTable};
use crate::engine::config::{GlobalParameters, WeightingPolicy};
use crate::engine::error::EngineError;
use crate::engine::forces::ForceBuffers;
use crate::engine::state::WorkingSet;
use nalgebra::Point3;
use tracing::{debug, instrument, trace, warn};

/// Distances and aggregates one restraint is judged by.
struct Effective {
    instant: f64,
    averaged: f64,
    instant_aggregate: f64,
    averaged_aggregate: f64,
    conservative: bool,
    mixed: bool,
}

/// How the scalar force is spread over the pairs of a violated restraint.
#[derive(Debug, Clone, Copy)]
enum PairWeighting {
    Even,
    /// `weight = r⁻¹ · averaged_pair_weight(running r⁻³)`.
    Averaged,
    /// `weight = r⁻¹ · r⁻⁷`.
    Instantaneous,
    /// Sum of the averaged and instantaneous weights, each scaled by its own excess.
    Mixed { averaged: f64, instant: f64 },
}

/// Turns the aggregates of the last aggregation into energy and forces.
///
/// Forces are added into `buffers`; the returned term holds the restraint energy and the
/// cumulative violation. The working set is only read apart from its violation total.
#[instrument(skip_all, name = "disres_evaluate_task")]
pub fn run(
    table: &RestraintTable,
    params: &GlobalParameters,
    working: &mut WorkingSet,
    positions: &[Point3<f64>],
    pbc: Option<&dyn PeriodicBoundary>,
    buffers: &mut ForceBuffers<'_>,
) -> Result<RestraintTerm, EngineError> {
    let mut total = RestraintTerm::default();
    if table.is_empty() {
        working.sum_violation = 0.0;
        return Ok(total);
    }
    super::aggregate::check_atoms(table, positions.len())?;
    let central = pbc.map_or(CENTRAL_SHIFT, |b| b.central_shift());
    let last_shift = pbc
        .map_or(CENTRAL_SHIFT, |b| b.num_shifts().saturating_sub(1))
        .max(central);
    buffers.ensure_capacity(table.max_atom_index(), last_shift)?;

    let smooth_force_constant = if params.time_averaging() {
        params.force_constant * (1.0 - working.warmup_product)
    } else {
        params.force_constant
    };

    for (res, restraint) in table.restraints().iter().enumerate() {
        let k = smooth_force_constant * restraint.force_constant_factor;
        let effective = effective_distances(restraint, params, working, res);

        let Some(averaged_excess) = potentials::violation(effective.averaged, &restraint.bounds)
        else {
            continue;
        };

        let energy = potentials::harmonic_energy(k, averaged_excess);
        total.energy += energy;
        if !energy.is_finite() {
            warn!(
                label = restraint.label,
                energy,
                averaged_distance = effective.averaged,
                "Distance restraint energy is not finite."
            );
            total.non_finite = true;
        }

        let (mut f_scal, magnitude, instant_excess) = if effective.mixed {
            match potentials::violation(effective.instant, &restraint.bounds) {
                Some(instant_excess) if instant_excess.signum() == averaged_excess.signum() => {
                    let mixed_excess = (averaged_excess * instant_excess).sqrt();
                    (-k * mixed_excess, mixed_excess, instant_excess)
                }
                _ => {
                    trace!(
                        label = restraint.label,
                        "Instantaneous distance does not confirm the averaged violation; no force."
                    );
                    continue;
                }
            }
        } else {
            (-k * averaged_excess, averaged_excess.abs(), 0.0)
        };
        total.violation += magnitude;

        let f_max = potentials::saturation_force(k, &restraint.bounds);
        let weighting = if effective.conservative {
            f_scal = f_scal.max(f_max);
            if !effective.mixed {
                f_scal *= effective.averaged / effective.averaged_aggregate;
                match restraint.kind {
                    RestraintKind::Averaged => PairWeighting::Averaged,
                    RestraintKind::Instantaneous => PairWeighting::Instantaneous,
                }
            } else {
                f_scal /= 2.0 * magnitude;
                PairWeighting::Mixed {
                    averaged: averaged_excess * effective.averaged / effective.averaged_aggregate,
                    instant: instant_excess * effective.instant / effective.instant_aggregate,
                }
            }
        } else {
            f_scal /= restraint.num_pairs() as f64;
            f_scal = f_scal.max(f_max);
            PairWeighting::Even
        };

        trace!(
            label = restraint.label,
            excess = averaged_excess,
            f_scal,
            energy,
            "Distance restraint violated."
        );

        for pair_index in restraint.pair_range() {
            let pair = table.pairs()[pair_index];
            let (dx, shift) = geometry::displacement(
                pbc,
                &positions[pair.atom_a],
                &positions[pair.atom_b],
            );
            let mut weight = 1.0 / dx.norm_squared().sqrt();
            weight *= match weighting {
                PairWeighting::Even => 1.0,
                PairWeighting::Averaged => {
                    potentials::averaged_pair_weight(working.running_inv_cube[pair_index])
                }
                PairWeighting::Instantaneous => {
                    potentials::instantaneous_pair_weight(working.distances[pair_index])
                }
                PairWeighting::Mixed { averaged, instant } => {
                    averaged
                        * potentials::averaged_pair_weight(working.running_inv_cube[pair_index])
                        + instant
                            * potentials::instantaneous_pair_weight(working.distances[pair_index])
                }
            };
            buffers.add_pair(pair.atom_a, pair.atom_b, shift, central, dx * (f_scal * weight));
        }
    }

    working.sum_violation = total.violation;
    debug!(
        energy = total.energy,
        violation = total.violation,
        "Distance restraint evaluation complete."
    );
    Ok(total)
}

fn effective_distances(
    restraint: &Restraint,
    params: &GlobalParameters,
    working: &WorkingSet,
    res: usize,
) -> Effective {
    let multi_pair = restraint.num_pairs() > 1;
    let conservative = params.weighting == WeightingPolicy::Conservative && multi_pair;
    match restraint.kind {
        RestraintKind::Averaged => {
            let instant_aggregate = working.aggregates.instantaneous()[res];
            let averaged_aggregate = working.aggregates.averaged()[res];
            Effective {
                instant: potentials::inv_sixth_root(instant_aggregate),
                averaged: potentials::inv_sixth_root(averaged_aggregate),
                instant_aggregate,
                averaged_aggregate,
                conservative,
                mixed: params.mixed,
            }
        }
        // Weighting follows the global policy here as for averaged restraints; it is
        // not switched to conservative just because the restraint is instantaneous.
        RestraintKind::Instantaneous => {
            let local = working.replica_local()[res];
            let distance = potentials::inv_sixth_root(local);
            Effective {
                instant: distance,
                averaged: distance,
                instant_aggregate: local,
                averaged_aggregate: local,
                conservative,
                mixed: false,
            }
        }
    }
}
