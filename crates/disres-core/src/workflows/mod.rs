//! # Workflows Module
//!
//! High-level entry points that tie the [`crate::engine`] stages together.
//!
//! - **Integration Step** ([`step`]) - one complete restraint evaluation, from aggregation
//!   to the history update, in the order the stages require.

pub mod step;
