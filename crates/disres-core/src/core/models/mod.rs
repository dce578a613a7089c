//! Static restraint definitions.
//!
//! [`restraint`] holds the per-pair records supplied by the caller and [`table`] turns
//! them into the dense [`table::RestraintTable`] that every per-step stage indexes into.

pub mod restraint;
pub mod table;
