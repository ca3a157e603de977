//! Custody schedule computations.
//!
//! # Responsibility
//! - Hold the static pattern catalog.
//! - Map calendar dates to custodians and describe holiday handling.
//!
//! # Invariants
//! - Everything in this module is pure and synchronous.
//! - Holiday overrides are informational and never change `resolve` output.

pub mod calendar;
pub mod catalog;
pub mod holiday;
pub mod resolver;
