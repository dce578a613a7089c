/// Cooperating replicas of one system that average their restraint aggregates.
///
/// Both methods are collectives: every replica must call them in the same order with
/// buffers of the same length, or the reduction mismatches.
pub trait EnsembleContext {
    fn num_replicas(&self) -> usize;

    /// Element-wise sum of `buffer` over all replicas, written back in place.
    fn sum(&self, buffer: &mut [f64]);

    /// Whether every replica passed the same `value`.
    fn agrees_on(&self, value: usize) -> bool;
}

/// An ensemble whose replicas all hold the same data as this process.
///
/// Reduction multiplies by the replica count. Useful for single-process runs that want
/// ensemble bookkeeping without a communicator, and as a test double.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdenticalReplicas {
    replicas: usize,
}

impl IdenticalReplicas {
    pub fn new(replicas: usize) -> Self {
        Self { replicas }
    }
}

impl EnsembleContext for IdenticalReplicas {
    fn num_replicas(&self) -> usize {
        self.replicas
    }

    fn sum(&self, buffer: &mut [f64]) {
        let n = self.replicas as f64;
        buffer.iter_mut().for_each(|v| *v *= n);
    }

    fn agrees_on(&self, _value: usize) -> bool {
        true
    }
}
