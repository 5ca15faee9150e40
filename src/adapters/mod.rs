//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
#[cfg(feature = "live")]
pub mod http_feed_adapter;
pub mod ini_strategy_adapter;
pub mod log_notifier;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
#[cfg(feature = "live")]
pub mod telegram_adapter;
