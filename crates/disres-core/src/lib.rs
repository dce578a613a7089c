//! # disres
//!
//! Time- and ensemble-averaged distance restraints for molecular dynamics, as used to
//! impose NOE-derived distance bounds on pairs of particles.
//!
//! ## Architecture
//!
//! The library follows a three-layer layout:
//!
//! - **[`core`]: The Foundation.** Stateless pieces: restraint records and the dense
//!   `RestraintTable`, minimum-image geometry, and the pure numerics of r⁻⁶ aggregation,
//!   warm-up corrected running averages and flat-bottomed violations.
//!
//! - **[`engine`]: The Logic Core.** `DistanceRestraints` owns the immutable parameters
//!   and a private working copy of all per-step buffers, and exposes the three stages
//!   (aggregate, evaluate, synchronize). The caller owns the `DurableHistory` that carries
//!   running averages across steps and restarts.
//!
//! - **[`workflows`]: The Public API.** `workflows::step::run` performs one integration
//!   step with the stages in their required order.

pub mod core;
pub mod engine;
pub mod workflows;
