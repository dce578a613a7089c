use super::error::EngineError;
use serde::{Deserialize, Serialize};

const HEADER_BYTES: usize = 8;
const VALUE_BYTES: usize = 8;

/// Cross-step state of time-averaged restraints, owned by the caller's checkpoint state.
///
/// Stages only ever read it; the values change exclusively through
/// [`crate::engine::tasks::synchronize`], once per integration step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DurableHistory {
    warmup_factor: f64,
    running_inv_cube: Vec<f64>,
}

impl DurableHistory {
    pub(crate) fn new(num_pairs: usize) -> Self {
        Self {
            warmup_factor: 1.0,
            running_inv_cube: vec![0.0; num_pairs],
        }
    }

    /// Rebuilds a history from previously checkpointed values.
    pub fn from_parts(warmup_factor: f64, running_inv_cube: Vec<f64>) -> Self {
        Self {
            warmup_factor,
            running_inv_cube,
        }
    }

    #[inline]
    pub fn warmup_factor(&self) -> f64 {
        self.warmup_factor
    }

    #[inline]
    pub fn running_averages(&self) -> &[f64] {
        &self.running_inv_cube
    }

    #[inline]
    pub fn num_pairs(&self) -> usize {
        self.running_inv_cube.len()
    }

    pub(crate) fn commit(&mut self, warmup_factor: f64, running_inv_cube: &[f64]) {
        self.warmup_factor = warmup_factor;
        self.running_inv_cube.copy_from_slice(running_inv_cube);
    }

    /// Little-endian checkpoint image: pair count (`u64`), warm-up factor, then one `f64`
    /// per pair in table order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes =
            Vec::with_capacity(HEADER_BYTES + VALUE_BYTES * (1 + self.running_inv_cube.len()));
        bytes.extend_from_slice(&(self.running_inv_cube.len() as u64).to_le_bytes());
        bytes.extend_from_slice(&self.warmup_factor.to_le_bytes());
        for value in &self.running_inv_cube {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EngineError> {
        let (header, body) = bytes.split_first_chunk::<HEADER_BYTES>().ok_or_else(|| {
            EngineError::Checkpoint(format!("{} bytes is shorter than the header", bytes.len()))
        })?;
        let num_pairs = u64::from_le_bytes(*header) as usize;
        let expected = num_pairs
            .checked_add(1)
            .and_then(|n| n.checked_mul(VALUE_BYTES))
            .ok_or_else(|| EngineError::Checkpoint(format!("pair count {num_pairs} overflows")))?;
        if body.len() != expected {
            return Err(EngineError::Checkpoint(format!(
                "expected {expected} payload bytes for {num_pairs} pairs, found {}",
                body.len()
            )));
        }

        let mut values = body.chunks_exact(VALUE_BYTES).map(|chunk| {
            let mut raw = [0u8; VALUE_BYTES];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        });
        let warmup_factor = values.next().unwrap_or(1.0);
        Ok(Self {
            warmup_factor,
            running_inv_cube: values.collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_history_starts_with_full_warmup_and_zero_averages() {
        let history = DurableHistory::new(3);
        assert_eq!(history.warmup_factor(), 1.0);
        assert_eq!(history.running_averages(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn commit_replaces_all_values() {
        let mut history = DurableHistory::new(2);
        history.commit(0.5, &[1.0, 2.0]);
        assert_eq!(history.warmup_factor(), 0.5);
        assert_eq!(history.running_averages(), &[1.0, 2.0]);
    }

    #[test]
    fn byte_image_restores_bit_identical_values() {
        let history = DurableHistory::from_parts(
            0.123_456_789_012_345_67,
            vec![1.0 / 3.0, f64::MIN_POSITIVE, 7.25e12, -0.0],
        );
        let restored = DurableHistory::from_bytes(&history.to_bytes()).unwrap();
        assert_eq!(
            restored.warmup_factor().to_bits(),
            history.warmup_factor().to_bits()
        );
        let bits = |h: &DurableHistory| -> Vec<u64> {
            h.running_averages().iter().map(|v| v.to_bits()).collect()
        };
        let (saved_bits, restored_bits) = (bits(&history), bits(&restored));
        assert_eq!(saved_bits, restored_bits);
    }

    #[test]
    fn byte_image_of_empty_history_has_header_and_warmup_only() {
        let bytes = DurableHistory::new(0).to_bytes();
        assert_eq!(bytes.len(), HEADER_BYTES + VALUE_BYTES);
        assert_eq!(DurableHistory::from_bytes(&bytes).unwrap().num_pairs(), 0);
    }

    #[test]
    fn from_bytes_rejects_truncated_input() {
        let mut bytes = DurableHistory::new(4).to_bytes();
        bytes.truncate(bytes.len() - 3);
        assert!(matches!(
            DurableHistory::from_bytes(&bytes),
            Err(EngineError::Checkpoint(_))
        ));
        assert!(matches!(
            DurableHistory::from_bytes(&[1, 2, 3]),
            Err(EngineError::Checkpoint(_))
        ));
    }

    #[test]
    fn toml_round_trip_preserves_values() {
        let history = DurableHistory::from_parts(0.75, vec![8.0, 1.0 / 3.0]);
        let text = toml::to_string(&history).unwrap();
        let restored: DurableHistory = toml::from_str(&text).unwrap();
        assert_eq!(restored, history);
    }
}
