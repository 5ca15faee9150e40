//! Turning tick results into result-log records and owner notices.

use super::engine::TickResult;
use super::gale::Resolution;
use super::matcher::Match;
use super::outcome::Outcome;
use super::strategy::Target;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    Launched,
    Win,
    White,
    Loss,
}

impl ResultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultKind::Launched => "LAUNCHED",
            ResultKind::Win => "WIN",
            ResultKind::White => "WHITE",
            ResultKind::Loss => "LOSS",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_uppercase().as_str() {
            "LAUNCHED" => Some(ResultKind::Launched),
            "WIN" => Some(ResultKind::Win),
            "WHITE" => Some(ResultKind::White),
            "LOSS" => Some(ResultKind::Loss),
            _ => None,
        }
    }
}

impl From<Resolution> for ResultKind {
    fn from(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Win => ResultKind::Win,
            Resolution::White => ResultKind::White,
            Resolution::Loss => ResultKind::Loss,
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One append-only entry of the result log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub strategy_id: String,
    pub owner_id: String,
    pub result: ResultKind,
    pub raw_payload: String,
}

/// A message addressed to a strategy owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub owner_id: String,
    pub text: String,
}

#[derive(Serialize)]
struct Payload<'a> {
    strategy_name: &'a str,
    target: String,
    gales: u32,
    outcome: &'a Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    sequence: Option<Vec<String>>,
}

fn payload_json(payload: &Payload<'_>) -> String {
    serde_json::to_string(payload).unwrap_or_else(|_| "{}".to_string())
}

fn sequence_labels(m: &Match) -> Vec<String> {
    m.matched
        .iter()
        .map(|o| match m.target {
            Target::Color(_) => o.color.to_string(),
            Target::Number(_) => o.number.to_string(),
        })
        .collect()
}

/// Backslash-escape the characters Telegram's legacy Markdown treats as markup.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Result-log records for everything a tick opened or resolved.
pub fn records_for(tick: &TickResult) -> Vec<ResultRecord> {
    let Some(outcome) = tick.outcome.as_ref() else {
        return Vec::new();
    };

    let opened = tick.opened.iter().map(|m| ResultRecord {
        strategy_id: m.strategy_id.clone(),
        owner_id: m.owner_id.clone(),
        result: ResultKind::Launched,
        raw_payload: payload_json(&Payload {
            strategy_name: &m.strategy_name,
            target: m.target.to_string(),
            gales: m.max_gales,
            outcome,
            sequence: Some(sequence_labels(m)),
        }),
    });

    let resolved = tick.resolved.iter().map(|r| ResultRecord {
        strategy_id: r.strategy_id.clone(),
        owner_id: r.owner_id.clone(),
        result: r.resolution.into(),
        raw_payload: payload_json(&Payload {
            strategy_name: &r.strategy_name,
            target: r.target.to_string(),
            gales: r.gales_used,
            outcome,
            sequence: None,
        }),
    });

    opened.chain(resolved).collect()
}

/// Owner notices for a tick: opened signals, gale steps and resolutions.
pub fn notices_for(tick: &TickResult) -> Vec<Notice> {
    let mut notices = Vec::new();

    for m in &tick.opened {
        notices.push(Notice {
            owner_id: m.owner_id.clone(),
            text: format!(
                "🎯 *Signal* ➜ {}\nStrategy: {}\nSequence detected: {}",
                m.target,
                escape_markdown(&m.strategy_name),
                sequence_labels(m).join(" - ")
            ),
        });
    }

    for a in &tick.advanced {
        notices.push(Notice {
            owner_id: a.owner_id.clone(),
            text: format!("🔁 Gale {}/{} ➜ {}", a.gale, a.max_gales, a.target),
        });
    }

    for r in &tick.resolved {
        let headline = match r.resolution {
            Resolution::Win => "✅ WIN",
            Resolution::White => "⚪ WHITE",
            Resolution::Loss => "❌ LOSS",
        };
        let gale_note = if r.gales_used == 0 {
            "first entry".to_string()
        } else {
            format!("gale {}", r.gales_used)
        };
        notices.push(Notice {
            owner_id: r.owner_id.clone(),
            text: format!(
                "{headline}\nStrategy: {} ({gale_note})",
                escape_markdown(&r.strategy_name)
            ),
        });
    }

    notices
}
