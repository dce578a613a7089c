use thiserror::Error;

use super::config::ConfigError;
use crate::core::models::table::TableError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid restraint configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Invalid restraint definitions: {source}")]
    Table {
        #[from]
        source: TableError,
    },

    #[error("Replicas disagree on {what}: this replica has {local}")]
    ReplicaMismatch { what: &'static str, local: usize },

    #[error("Invalid ensemble size {0}; at least one replica is required")]
    EmptyEnsemble(usize),

    #[error("Ensemble changed since initialization: expected {expected:?} replicas, got {found:?}")]
    EnsembleChanged {
        expected: Option<usize>,
        found: Option<usize>,
    },

    #[error("Pair {pair} references atom {atom}, but only {num_atoms} positions were supplied")]
    AtomOutOfRange {
        pair: usize,
        atom: usize,
        num_atoms: usize,
    },

    #[error("Force buffer has {len} entries, but the restraints reference atom {atom}")]
    ForceBufferTooShort { atom: usize, len: usize },

    #[error("Shift-force buffer has {len} cells, but the periodic boundary needs {required}")]
    ShiftBufferTooShort { required: usize, len: usize },

    #[error(
        "Durable history holds {found} pair averages, but the restraint table has {expected} pairs"
    )]
    HistoryMismatch { expected: usize, found: usize },

    #[error("Time averaging is enabled but no durable history was supplied")]
    MissingHistory,

    #[error("Corrupt history checkpoint: {0}")]
    Checkpoint(String),
}
