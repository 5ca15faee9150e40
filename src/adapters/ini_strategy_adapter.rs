//! Strategy store backed by an INI file, one `[strategy.<id>]` section each.
//!
//! ```ini
//! [strategy.s1]
//! owner = u1
//! name = Double black
//! kind = color_sequence
//! pattern = black, black
//! target = red
//! max_gales = 2
//! enabled = true
//! ```
//!
//! Section and key names are case-insensitive and read back lowercased, so
//! `[strategy.S1]` yields the id `s1`. Values keep their case.

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::error::GhostError;
use crate::domain::strategy::{
    DEFAULT_MAX_GALES, StrategyDefinition, StrategyKind, Target, parse_pattern,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::strategy_port::StrategyPort;
use std::path::{Path, PathBuf};

pub const SECTION_PREFIX: &str = "strategy.";

/// Build every strategy defined in `config`, in section order.
pub fn strategies_from_config(config: &dyn ConfigPort) -> Vec<StrategyDefinition> {
    config
        .sections()
        .into_iter()
        .filter_map(|section| {
            let id = section.strip_prefix(SECTION_PREFIX)?.to_string();
            Some(strategy_from_section(config, &section, &id))
        })
        .collect()
}

fn strategy_from_section(config: &dyn ConfigPort, section: &str, id: &str) -> StrategyDefinition {
    let max_gales = config.get_int(section, "max_gales", DEFAULT_MAX_GALES as i64);
    StrategyDefinition {
        id: id.to_string(),
        owner_id: config.get_string(section, "owner").unwrap_or_default(),
        name: config
            .get_string(section, "name")
            .unwrap_or_else(|| id.to_string()),
        kind: StrategyKind::parse(&config.get_string(section, "kind").unwrap_or_default()),
        pattern: parse_pattern(&config.get_string(section, "pattern").unwrap_or_default()),
        target: config
            .get_string(section, "target")
            .as_deref()
            .and_then(Target::parse),
        max_gales: u32::try_from(max_gales).unwrap_or(DEFAULT_MAX_GALES),
        enabled: config.get_bool(section, "enabled", true),
    }
}

/// Re-reads the file on every load, so edits apply from the next tick.
pub struct IniStrategyAdapter {
    path: PathBuf,
}

impl IniStrategyAdapter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl StrategyPort for IniStrategyAdapter {
    fn load_strategies(&self) -> Result<Vec<StrategyDefinition>, GhostError> {
        let config =
            FileConfigAdapter::from_file(&self.path).map_err(|e| GhostError::StrategyLoad {
                source_name: self.path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(strategies_from_config(&config))
    }
}
