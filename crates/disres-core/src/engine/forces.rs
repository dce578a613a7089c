use super::error::EngineError;
use nalgebra::Vector3;

/// Caller-owned force accumulators. Contributions are added, never assigned.
#[derive(Debug)]
pub struct ForceBuffers<'a> {
    pub forces: &'a mut [Vector3<f64>],
    pub shift_forces: &'a mut [Vector3<f64>],
}

impl<'a> ForceBuffers<'a> {
    pub fn new(forces: &'a mut [Vector3<f64>], shift_forces: &'a mut [Vector3<f64>]) -> Self {
        Self {
            forces,
            shift_forces,
        }
    }

    /// Fails unless atom `max_atom` and shift cell `max_shift` both fit the buffers.
    ///
    /// Called once before any contribution is added, so a rejected pass leaves both
    /// accumulators exactly as the caller passed them in.
    pub(crate) fn ensure_capacity(
        &self,
        max_atom: Option<usize>,
        max_shift: usize,
    ) -> Result<(), EngineError> {
        if let Some(atom) = max_atom {
            if atom >= self.forces.len() {
                return Err(EngineError::ForceBufferTooShort {
                    atom,
                    len: self.forces.len(),
                });
            }
        }
        if max_shift >= self.shift_forces.len() {
            return Err(EngineError::ShiftBufferTooShort {
                required: max_shift + 1,
                len: self.shift_forces.len(),
            });
        }
        Ok(())
    }

    /// Applies `f_ij` to atom `a`, `-f_ij` to atom `b`, and records the pair in the shift
    /// accumulator at `shift` with the opposite sign at `central`.
    ///
    /// Indices must have passed [`Self::ensure_capacity`].
    #[inline]
    pub(crate) fn add_pair(
        &mut self,
        atom_a: usize,
        atom_b: usize,
        shift: usize,
        central: usize,
        f_ij: Vector3<f64>,
    ) {
        self.forces[atom_a] += f_ij;
        self.forces[atom_b] -= f_ij;
        self.shift_forces[shift] += f_ij;
        self.shift_forces[central] -= f_ij;
    }
}
