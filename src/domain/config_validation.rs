//! Configuration validation.
//!
//! Validates the worker config before the polling loop starts.

use crate::domain::error::GhostError;
use crate::domain::outcome::ColorScheme;
use crate::ports::config_port::ConfigPort;

pub const MAX_FEED_RETRIES: i64 = 10;

pub fn validate_worker_config(config: &dyn ConfigPort) -> Result<(), GhostError> {
    validate_feed_url(config)?;
    validate_color_source(config)?;
    validate_poll_interval(config)?;
    validate_timeout(config)?;
    validate_retries(config)?;
    validate_strategy_source(config)?;
    Ok(())
}

fn validate_feed_url(config: &dyn ConfigPort) -> Result<(), GhostError> {
    match config.get_string("feed", "url") {
        Some(url) if url.starts_with("http://") || url.starts_with("https://") => Ok(()),
        Some(_) => Err(GhostError::ConfigInvalid {
            section: "feed".to_string(),
            key: "url".to_string(),
            reason: "url must start with http:// or https://".to_string(),
        }),
        None => Err(GhostError::ConfigMissing {
            section: "feed".to_string(),
            key: "url".to_string(),
        }),
    }
}

fn validate_color_source(config: &dyn ConfigPort) -> Result<(), GhostError> {
    match config.get_string("feed", "color_source") {
        None => Ok(()),
        Some(s) if ColorScheme::parse(&s).is_some() => Ok(()),
        Some(s) => Err(GhostError::ConfigInvalid {
            section: "feed".to_string(),
            key: "color_source".to_string(),
            reason: format!("unknown color source '{s}', expected color_id or roll"),
        }),
    }
}

fn validate_poll_interval(config: &dyn ConfigPort) -> Result<(), GhostError> {
    let value = config.get_int("feed", "poll_interval_ms", 1000);
    if value <= 0 {
        return Err(GhostError::ConfigInvalid {
            section: "feed".to_string(),
            key: "poll_interval_ms".to_string(),
            reason: "poll_interval_ms must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_timeout(config: &dyn ConfigPort) -> Result<(), GhostError> {
    let value = config.get_int("feed", "timeout_secs", 5);
    if value <= 0 {
        return Err(GhostError::ConfigInvalid {
            section: "feed".to_string(),
            key: "timeout_secs".to_string(),
            reason: "timeout_secs must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_retries(config: &dyn ConfigPort) -> Result<(), GhostError> {
    let value = config.get_int("feed", "max_retries", 3);
    if !(0..=MAX_FEED_RETRIES).contains(&value) {
        return Err(GhostError::ConfigInvalid {
            section: "feed".to_string(),
            key: "max_retries".to_string(),
            reason: format!("max_retries must be between 0 and {MAX_FEED_RETRIES}"),
        });
    }
    Ok(())
}

fn validate_strategy_source(config: &dyn ConfigPort) -> Result<(), GhostError> {
    let file = config.get_string("strategies", "file");
    let db = config.get_string("sqlite", "path");

    match (file, db) {
        (Some(f), _) if !f.trim().is_empty() => Ok(()),
        (_, Some(p)) if !p.trim().is_empty() => Ok(()),
        _ => Err(GhostError::ConfigMissing {
            section: "strategies".to_string(),
            key: "file".to_string(),
        }),
    }
}
