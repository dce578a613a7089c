//! # Engine Module
//!
//! Stateful, per-step machinery of the distance-restraint term.
//!
//! ## Overview
//!
//! [`DistanceRestraints`] is built once from the restraint records and a
//! [`config::RestraintConfig`]. Each integration step then runs the stages in
//! [`tasks`] in a fixed order:
//!
//! 1. [`DistanceRestraints::aggregate`] - distances, running averages and r⁻⁶ aggregates,
//!    optionally reduced over an ensemble of replicas
//! 2. [`DistanceRestraints::evaluate`] - violations, energy and forces
//! 3. [`DistanceRestraints::synchronize`] - persists the running averages into the
//!    caller-owned [`history::DurableHistory`]
//!
//! Stages 1 and 2 only touch a private [`state::WorkingSet`], so they may be repeated
//! within a step without disturbing the durable history.

pub mod config;
pub mod ensemble;
pub mod error;
pub mod forces;
pub mod history;
pub mod state;
pub mod tasks;

use crate::core::forcefield::term::RestraintTerm;
use crate::core::geometry::PeriodicBoundary;
use crate::core::models::restraint::PairRecord;
use crate::core::models::table::RestraintTable;
use config::{GlobalParameters, RestraintConfig};
use ensemble::EnsembleContext;
use error::EngineError;
use forces::ForceBuffers;
use history::DurableHistory;
use nalgebra::Point3;
use state::WorkingSet;
use tracing::info;

#[derive(Debug, Clone)]
pub struct DistanceRestraints {
    params: GlobalParameters,
    table: RestraintTable,
    working: WorkingSet,
    num_replicas: Option<usize>,
}

impl DistanceRestraints {
    /// Validates the records and configuration and allocates all per-step buffers.
    ///
    /// With an ensemble, every replica must call this collectively; the restraint count
    /// is checked for agreement across replicas.
    pub fn new(
        records: &[PairRecord],
        config: &RestraintConfig,
        ensemble: Option<&dyn EnsembleContext>,
    ) -> Result<Self, EngineError> {
        let params = GlobalParameters::from_config(config)?;
        let table = RestraintTable::build(records)?;

        let num_replicas = match ensemble {
            Some(e) if e.num_replicas() == 0 => return Err(EngineError::EmptyEnsemble(0)),
            Some(e) => Some(e.num_replicas()),
            None => None,
        };
        let working = WorkingSet::new(
            table.num_restraints(),
            table.num_pairs(),
            num_replicas.is_some(),
        );

        if !table.is_empty() {
            if let Some(e) = ensemble {
                if !e.agrees_on(table.num_restraints()) {
                    return Err(EngineError::ReplicaMismatch {
                        what: "the number of distance restraints",
                        local: table.num_restraints(),
                    });
                }
            }
            info!(
                restraints = table.num_restraints(),
                pairs = table.num_pairs(),
                time_averaged = params.time_averaging(),
                replicas = num_replicas.unwrap_or(1),
                "Initialized distance restraints."
            );
        }

        Ok(Self {
            params,
            table,
            working,
            num_replicas,
        })
    }

    /// Fresh durable history for a run starting from scratch, or `None` when time
    /// averaging is off and no history is kept.
    pub fn initial_history(&self) -> Option<DurableHistory> {
        self.params
            .time_averaging()
            .then(|| DurableHistory::new(self.table.num_pairs()))
    }

    /// Checks that a history restored from a checkpoint fits this restraint table.
    pub fn check_history(&self, history: &DurableHistory) -> Result<(), EngineError> {
        if history.num_pairs() != self.table.num_pairs() {
            return Err(EngineError::HistoryMismatch {
                expected: self.table.num_pairs(),
                found: history.num_pairs(),
            });
        }
        Ok(())
    }

    pub fn aggregate(
        &mut self,
        positions: &[Point3<f64>],
        pbc: Option<&dyn PeriodicBoundary>,
        history: Option<&DurableHistory>,
        ensemble: Option<&dyn EnsembleContext>,
    ) -> Result<(), EngineError> {
        let found = ensemble.map(|e| e.num_replicas());
        if found != self.num_replicas {
            return Err(EngineError::EnsembleChanged {
                expected: self.num_replicas,
                found,
            });
        }
        tasks::aggregate::run(
            &self.table,
            &self.params,
            &mut self.working,
            positions,
            pbc,
            history,
            ensemble,
        )
    }

    pub fn evaluate(
        &mut self,
        positions: &[Point3<f64>],
        pbc: Option<&dyn PeriodicBoundary>,
        buffers: &mut ForceBuffers<'_>,
    ) -> Result<RestraintTerm, EngineError> {
        tasks::evaluate::run(
            &self.table,
            &self.params,
            &mut self.working,
            positions,
            pbc,
            buffers,
        )
    }

    pub fn synchronize(&self, history: Option<&mut DurableHistory>) -> Result<(), EngineError> {
        tasks::synchronize::run(&self.params, &self.working, history)
    }

    #[inline]
    pub fn params(&self) -> &GlobalParameters {
        &self.params
    }

    #[inline]
    pub fn table(&self) -> &RestraintTable {
        &self.table
    }

    #[inline]
    pub fn working(&self) -> &WorkingSet {
        &self.working
    }

    /// Cumulative violation of the last evaluation.
    #[inline]
    pub fn sum_violation(&self) -> f64 {
        self.working.sum_violation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::restraint::Bounds;
    use crate::core::models::table::TableError;
    use crate::engine::config::RestraintConfigBuilder;
    use crate::engine::ensemble::IdenticalReplicas;
    use nalgebra::Vector3;

    struct DisagreeingReplicas;

    impl EnsembleContext for DisagreeingReplicas {
        fn num_replicas(&self) -> usize {
            2
        }
        fn sum(&self, _buffer: &mut [f64]) {}
        fn agrees_on(&self, _value: usize) -> bool {
            false
        }
    }

    fn config(tau: f64) -> RestraintConfig {
        RestraintConfigBuilder::new()
            .force_constant(1000.0)
            .tau(tau)
            .time_step(0.002)
            .build()
            .unwrap()
    }

    fn records() -> Vec<PairRecord> {
        let bounds = Bounds::new(0.2, 0.3, 0.4);
        vec![
            PairRecord::new(0, bounds, 0, 1),
            PairRecord::new(0, bounds, 0, 2),
            PairRecord::new(1, bounds, 1, 2),
        ]
    }

    #[test]
    fn new_builds_table_and_working_buffers() {
        let restraints = DistanceRestraints::new(&records(), &config(0.0), None).unwrap();
        assert_eq!(restraints.table().num_restraints(), 2);
        assert_eq!(restraints.working().distances().len(), 3);
        assert_eq!(restraints.working().aggregates().len(), 2);
        assert!(restraints.initial_history().is_none());
    }

    #[test]
    fn new_with_time_averaging_provides_seeded_history() {
        let restraints = DistanceRestraints::new(&records(), &config(1.0), None).unwrap();
        let history = restraints.initial_history().unwrap();
        assert_eq!(history.warmup_factor(), 1.0);
        assert_eq!(history.running_averages(), &[0.0, 0.0, 0.0]);
        assert!(restraints.check_history(&history).is_ok());
    }

    #[test]
    fn new_with_no_records_is_an_empty_no_op() {
        let mut restraints = DistanceRestraints::new(&[], &config(0.0), None).unwrap();
        assert!(restraints.table().is_empty());
        restraints.aggregate(&[], None, None, None).unwrap();
        let mut forces: Vec<Vector3<f64>> = Vec::new();
        let mut shifts: Vec<Vector3<f64>> = Vec::new();
        let term = restraints
            .evaluate(&[], None, &mut ForceBuffers::new(&mut forces, &mut shifts))
            .unwrap();
        assert_eq!(term, RestraintTerm::default());
    }

    #[test]
    fn new_propagates_table_errors_without_partial_state() {
        let mut bad = records();
        bad.push(PairRecord::new(0, Bounds::new(0.2, 0.3, 0.4), 3, 4));
        let result = DistanceRestraints::new(&bad, &config(0.0), None);
        assert!(matches!(
            result,
            Err(EngineError::Table {
                source: TableError::NonContiguousLabel { label: 0, index: 3 }
            })
        ));
    }

    #[test]
    fn new_rejects_replicas_disagreeing_on_restraint_count() {
        let result = DistanceRestraints::new(&records(), &config(0.0), Some(&DisagreeingReplicas));
        assert!(matches!(
            result,
            Err(EngineError::ReplicaMismatch { local: 2, .. })
        ));
    }

    #[test]
    fn new_rejects_empty_ensemble() {
        let result =
            DistanceRestraints::new(&records(), &config(0.0), Some(&IdenticalReplicas::new(0)));
        assert!(matches!(result, Err(EngineError::EmptyEnsemble(0))));
    }

    #[test]
    fn aggregate_rejects_ensemble_not_configured_at_initialization() {
        let mut restraints = DistanceRestraints::new(&records(), &config(0.0), None).unwrap();
        let positions = vec![Point3::origin(); 3];
        let result =
            restraints.aggregate(&positions, None, None, Some(&IdenticalReplicas::new(2)));
        assert!(matches!(
            result,
            Err(EngineError::EnsembleChanged {
                expected: None,
                found: Some(2)
            })
        ));
    }

    #[test]
    fn check_history_rejects_mismatched_checkpoint() {
        let restraints = DistanceRestraints::new(&records(), &config(1.0), None).unwrap();
        let history = DurableHistory::from_parts(0.5, vec![1.0]);
        assert!(matches!(
            restraints.check_history(&history),
            Err(EngineError::HistoryMismatch {
                expected: 3,
                found: 1
            })
        ));
    }
}
