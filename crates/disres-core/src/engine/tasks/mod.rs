//! The three per-step stages of restraint evaluation.
//!
//! Within one integration step they run strictly in order: [`aggregate`] computes the
//! aggregates from positions and the durable history, [`evaluate`] turns them into energy
//! and forces, and [`synchronize`] finally stores the new averages. The first two may be
//! repeated; only the last one writes the durable history.

pub mod aggregate;
pub mod evaluate;
pub mod synchronize;
