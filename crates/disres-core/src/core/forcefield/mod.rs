//! # Force Field Module
//!
//! Pure numerics of the distance-restraint potential.
//!
//! ## Key Components
//!
//! - [`potentials`] - r⁻⁶ aggregation, the warm-up corrected running average of r⁻³ and the
//!   flat-bottomed violation test
//! - [`term`] - [`term::RestraintTerm`], the energy and violation totals of one evaluation

pub mod potentials;
pub mod term;
