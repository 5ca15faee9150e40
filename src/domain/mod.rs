//! Core domain types and logic: the signal detection and gale-tracking engine.

pub mod outcome;
pub mod window;
pub mod strategy;
pub mod matcher;
pub mod registry;
pub mod gate;
pub mod gale;
pub mod engine;
pub mod signal;
pub mod summary;
pub mod config_validation;
pub mod error;
