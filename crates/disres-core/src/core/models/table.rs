use super::restraint::{Bounds, PairRecord, RestraintKind};
use std::collections::HashSet;
use std::ops::Range;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum TableError {
    #[error(
        "Restraint label {label} reappears at pair {index} after other labels; \
         pairs of one restraint must be contiguous"
    )]
    NonContiguousLabel { label: i64, index: usize },
    #[error(
        "Pair {index} of restraint label {label} has parameters differing from \
         the first pair of that restraint"
    )]
    InconsistentParameters { label: i64, index: usize },
    #[error("Restraint label {label} has invalid bounds {bounds:?}")]
    InvalidBounds { label: i64, bounds: Bounds },
    #[error("Restraint label {label} has non-finite force constant factor {factor}")]
    InvalidForceConstantFactor { label: i64, factor: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pair {
    pub atom_a: usize,
    pub atom_b: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Restraint {
    pub label: i64,
    pub bounds: Bounds,
    pub force_constant_factor: f64,
    pub kind: RestraintKind,
    pairs: Range<usize>,
}

impl Restraint {
    /// Indices of this restraint's pairs in the owning [`RestraintTable`].
    #[inline]
    pub fn pair_range(&self) -> Range<usize> {
        self.pairs.clone()
    }

    #[inline]
    pub fn num_pairs(&self) -> usize {
        self.pairs.len()
    }
}

/// Dense, immutable arena of restraints and their atom pairs.
///
/// Pairs keep the order of the input records, so pair index `p` here is also the index
/// of that pair's running average in the durable history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestraintTable {
    restraints: Vec<Restraint>,
    pairs: Vec<Pair>,
}

impl RestraintTable {
    pub fn build(records: &[PairRecord]) -> Result<Self, TableError> {
        let mut restraints: Vec<Restraint> = Vec::new();
        let mut pairs = Vec::with_capacity(records.len());
        let mut seen_labels = HashSet::new();
        let mut first_of_group: Option<&PairRecord> = None;

        for (index, record) in records.iter().enumerate() {
            match first_of_group {
                Some(first) if first.label == record.label => {
                    if !first.same_parameters(record) {
                        return Err(TableError::InconsistentParameters {
                            label: record.label,
                            index,
                        });
                    }
                }
                _ => {
                    if !seen_labels.insert(record.label) {
                        return Err(TableError::NonContiguousLabel {
                            label: record.label,
                            index,
                        });
                    }
                    if !record.bounds.is_valid() {
                        return Err(TableError::InvalidBounds {
                            label: record.label,
                            bounds: record.bounds,
                        });
                    }
                    if !record.force_constant_factor.is_finite() {
                        return Err(TableError::InvalidForceConstantFactor {
                            label: record.label,
                            factor: record.force_constant_factor,
                        });
                    }
                    restraints.push(Restraint {
                        label: record.label,
                        bounds: record.bounds,
                        force_constant_factor: record.force_constant_factor,
                        kind: record.kind,
                        pairs: index..index,
                    });
                    first_of_group = Some(record);
                }
            }

            if let Some(current) = restraints.last_mut() {
                current.pairs.end = index + 1;
            }
            pairs.push(Pair {
                atom_a: record.atom_a,
                atom_b: record.atom_b,
            });
        }

        Ok(Self { restraints, pairs })
    }

    #[inline]
    pub fn restraints(&self) -> &[Restraint] {
        &self.restraints
    }

    #[inline]
    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    #[inline]
    pub fn num_restraints(&self) -> usize {
        self.restraints.len()
    }

    #[inline]
    pub fn num_pairs(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.restraints.is_empty()
    }

    /// Largest atom index referenced by any pair, if there are pairs at all.
    pub fn max_atom_index(&self) -> Option<usize> {
        self.pairs.iter().map(|p| p.atom_a.max(p.atom_b)).max()
    }
}
