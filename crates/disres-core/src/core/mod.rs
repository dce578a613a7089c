//! # Core Module
//!
//! Stateless building blocks of the restraint engine.
//!
//! - **Geometry** ([`geometry`]) - minimum-image displacements and shift-cell indices
//! - **Restraint Definitions** ([`models`]) - pair records and the dense restraint table
//! - **Potential Numerics** ([`forcefield`]) - aggregation, averaging and violation helpers

pub mod forcefield;
pub mod geometry;
pub mod models;
