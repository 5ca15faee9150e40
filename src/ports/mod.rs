//! Port traits for the engine's external collaborators.

pub mod config_port;
pub mod feed_port;
pub mod notify_port;
pub mod result_log_port;
pub mod strategy_port;
