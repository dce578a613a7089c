/// Per-restraint r⁻⁶ aggregates stored back to back in one allocation.
///
/// The instantaneous block is followed immediately by the time-averaged block so that an
/// ensemble reduction covers both with a single collective call on [`Self::as_mut_slice`].
#[derive(Debug, Clone, PartialEq)]
pub struct PairedAggregates {
    data: Vec<f64>,
    num_restraints: usize,
}

impl PairedAggregates {
    pub fn new(num_restraints: usize) -> Self {
        Self {
            data: vec![0.0; 2 * num_restraints],
            num_restraints,
        }
    }

    #[inline]
    pub fn instantaneous(&self) -> &[f64] {
        &self.data[..self.num_restraints]
    }

    #[inline]
    pub fn averaged(&self) -> &[f64] {
        &self.data[self.num_restraints..]
    }

    #[inline]
    pub fn split_mut(&mut self) -> (&mut [f64], &mut [f64]) {
        self.data.split_at_mut(self.num_restraints)
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.num_restraints
    }

    pub fn is_empty(&self) -> bool {
        self.num_restraints == 0
    }
}

/// Private working copy of everything the aggregator computes in one step.
///
/// Re-running the aggregator overwrites this state from the durable history and the
/// current positions, so evaluation may be repeated within a step.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingSet {
    pub(crate) distances: Vec<f64>,
    pub(crate) running_inv_cube: Vec<f64>,
    pub(crate) aggregates: PairedAggregates,
    /// Un-averaged instantaneous aggregates of this replica; absent outside an ensemble,
    /// where the instantaneous block already is replica-local.
    pub(crate) replica_local: Option<Vec<f64>>,
    pub(crate) warmup_product: f64,
    pub(crate) sum_violation: f64,
}

impl WorkingSet {
    pub(crate) fn new(num_restraints: usize, num_pairs: usize, ensemble: bool) -> Self {
        Self {
            distances: vec![0.0; num_pairs],
            running_inv_cube: vec![0.0; num_pairs],
            aggregates: PairedAggregates::new(num_restraints),
            replica_local: ensemble.then(|| vec![0.0; num_restraints]),
            warmup_product: 0.0,
            sum_violation: 0.0,
        }
    }

    #[inline]
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    #[inline]
    pub fn running_averages(&self) -> &[f64] {
        &self.running_inv_cube
    }

    #[inline]
    pub fn aggregates(&self) -> &PairedAggregates {
        &self.aggregates
    }

    #[inline]
    pub fn replica_local(&self) -> &[f64] {
        match &self.replica_local {
            Some(local) => local,
            None => self.aggregates.instantaneous(),
        }
    }

    /// `warmupFactor · decayFactor` of the last aggregation; the next durable warm-up factor.
    #[inline]
    pub fn warmup_product(&self) -> f64 {
        self.warmup_product
    }

    #[inline]
    pub fn sum_violation(&self) -> f64 {
        self.sum_violation
    }
}
