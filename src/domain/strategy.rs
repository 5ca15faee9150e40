//! Strategy definitions: a pattern over recent outcomes plus the target to signal.
//!
//! Definitions are kept close to how they are stored, so an unknown kind or a
//! bad pattern token survives loading and is rejected per strategy by
//! [`StrategyDefinition::check`] at match time.

use super::error::EngineError;
use super::outcome::{Color, MAX_ROLL, Outcome};
use super::window::WINDOW_CAPACITY;
use serde::Deserialize;
use std::fmt;

pub const DEFAULT_MAX_GALES: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyKind {
    ColorSequence,
    NumberSequence,
    Unknown(String),
}

impl StrategyKind {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "color_sequence" => StrategyKind::ColorSequence,
            "number_sequence" => StrategyKind::NumberSequence,
            other => StrategyKind::Unknown(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternElement {
    Color(Color),
    Wildcard,
    Number(u8),
    Unrecognized(String),
}

impl PatternElement {
    pub fn parse_token(token: &str) -> Self {
        let token = token.trim();
        if token == "*" {
            return PatternElement::Wildcard;
        }
        if let Some(color) = Color::parse(token) {
            return PatternElement::Color(color);
        }
        match token.parse::<u8>() {
            Ok(n) if n <= MAX_ROLL => PatternElement::Number(n),
            _ => PatternElement::Unrecognized(token.to_string()),
        }
    }

    fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Self::parse_token(s),
            serde_json::Value::Number(n) => match n.as_u64() {
                Some(v) if v <= MAX_ROLL as u64 => PatternElement::Number(v as u8),
                _ => PatternElement::Unrecognized(n.to_string()),
            },
            other => PatternElement::Unrecognized(other.to_string()),
        }
    }
}

impl fmt::Display for PatternElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternElement::Color(c) => write!(f, "{c}"),
            PatternElement::Wildcard => f.write_str("*"),
            PatternElement::Number(n) => write!(f, "{n}"),
            PatternElement::Unrecognized(raw) => write!(f, "?{raw}"),
        }
    }
}

/// Comma-separated pattern text, e.g. `black, black, *` or `8, 8`.
pub fn parse_pattern(text: &str) -> Vec<PatternElement> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    text.split(',').map(PatternElement::parse_token).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Color(Color),
    Number(u8),
}

impl Target {
    pub fn parse(text: &str) -> Option<Self> {
        match PatternElement::parse_token(text) {
            PatternElement::Color(c) => Some(Target::Color(c)),
            PatternElement::Number(n) => Some(Target::Number(n)),
            _ => None,
        }
    }

    fn from_json(value: &serde_json::Value) -> Option<Self> {
        match PatternElement::from_json(value) {
            PatternElement::Color(c) => Some(Target::Color(c)),
            PatternElement::Number(n) => Some(Target::Number(n)),
            _ => None,
        }
    }

    /// Color equality for color targets, exact number equality for number targets.
    pub fn is_hit(&self, outcome: &Outcome) -> bool {
        match self {
            Target::Color(c) => outcome.color == *c,
            Target::Number(n) => outcome.number == *n,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Color(c) => write!(f, "{c}"),
            Target::Number(n) => write!(f, "{n}"),
        }
    }
}

/// The JSON `config` document a strategy row carries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StrategyConfig {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub sequence: Vec<serde_json::Value>,
    pub signal: Option<serde_json::Value>,
    pub gales: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyDefinition {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub kind: StrategyKind,
    pub pattern: Vec<PatternElement>,
    pub target: Option<Target>,
    pub max_gales: u32,
    pub enabled: bool,
}

impl StrategyDefinition {
    pub fn from_config(id: &str, owner_id: &str, name: &str, config: &StrategyConfig) -> Self {
        Self {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            kind: StrategyKind::parse(config.kind.as_deref().unwrap_or_default()),
            pattern: config.sequence.iter().map(PatternElement::from_json).collect(),
            target: config.signal.as_ref().and_then(Target::from_json),
            max_gales: config.gales.unwrap_or(DEFAULT_MAX_GALES),
            enabled: true,
        }
    }

    /// Validate the definition, returning its target when well formed.
    pub fn check(&self) -> Result<Target, EngineError> {
        let malformed = |reason: String| EngineError::MalformedStrategy {
            strategy_id: self.id.clone(),
            reason,
        };

        if self.pattern.is_empty() {
            return Err(malformed("empty pattern".into()));
        }
        if self.pattern.len() > WINDOW_CAPACITY {
            return Err(malformed(format!(
                "pattern length {} exceeds window capacity {}",
                self.pattern.len(),
                WINDOW_CAPACITY
            )));
        }
        let target = self
            .target
            .ok_or_else(|| malformed("missing target".into()))?;

        match &self.kind {
            StrategyKind::Unknown(kind) => Err(malformed(format!("unknown kind '{kind}'"))),
            StrategyKind::ColorSequence => {
                if let Some(bad) = self
                    .pattern
                    .iter()
                    .find(|e| !matches!(e, PatternElement::Color(_) | PatternElement::Wildcard))
                {
                    return Err(malformed(format!("'{bad}' is not a color or wildcard")));
                }
                match target {
                    Target::Color(_) => Ok(target),
                    Target::Number(_) => Err(malformed("color sequence needs a color target".into())),
                }
            }
            StrategyKind::NumberSequence => {
                if let Some(bad) = self
                    .pattern
                    .iter()
                    .find(|e| !matches!(e, PatternElement::Number(_)))
                {
                    return Err(malformed(format!("'{bad}' is not a roll number")));
                }
                match target {
                    Target::Number(_) => Ok(target),
                    Target::Color(_) => Err(malformed("number sequence needs a number target".into())),
                }
            }
        }
    }
}
