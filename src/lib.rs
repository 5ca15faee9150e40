//! ghostsignal: pattern signals and gale tracking over a live outcome feed.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`]. The [`worker`] owns the engine and
//! drives it from a feed.

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
pub mod worker;
