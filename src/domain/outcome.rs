//! Observed game outcomes and the feed color mapping.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Highest roll number the game produces.
pub const MAX_ROLL: u8 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Red,
    Black,
}

impl Color {
    /// Parse a color name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "white" => Some(Color::White),
            "red" => Some(Color::Red),
            "black" => Some(Color::Black),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Color::White => "WHITE",
            Color::Red => "RED",
            Color::Black => "BLACK",
        };
        f.write_str(name)
    }
}

/// One observed game result. Immutable once decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub number: u8,
    pub color: Color,
    pub observed_at: DateTime<Utc>,
}

/// A raw head record as delivered by a feed, before color decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRecord {
    pub number: i64,
    pub color_id: i64,
    pub observed_at: DateTime<Utc>,
}

/// How an outcome's color is derived from a feed record.
///
/// The two mappings seen in the wild disagree on which field is
/// authoritative, so the choice is configuration rather than code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
    /// Trust the feed's color id: 0 white, 1 black, 2 red.
    #[default]
    ColorId,
    /// Derive from the roll number: 0 white, 1-7 red, 8-14 black.
    RollNumber,
}

impl ColorScheme {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "color_id" | "colorid" => Some(ColorScheme::ColorId),
            "roll" | "roll_number" => Some(ColorScheme::RollNumber),
            _ => None,
        }
    }

    pub fn color_of(&self, number: u8, color_id: i64) -> Option<Color> {
        match self {
            ColorScheme::ColorId => match color_id {
                0 => Some(Color::White),
                1 => Some(Color::Black),
                2 => Some(Color::Red),
                _ => None,
            },
            ColorScheme::RollNumber => match number {
                0 => Some(Color::White),
                1..=7 => Some(Color::Red),
                8..=MAX_ROLL => Some(Color::Black),
                _ => None,
            },
        }
    }

    /// Decode a feed record into an [`Outcome`].
    pub fn decode(&self, record: &FeedRecord) -> Result<Outcome, String> {
        let number = u8::try_from(record.number)
            .ok()
            .filter(|n| *n <= MAX_ROLL)
            .ok_or_else(|| format!("roll number {} out of range 0..={}", record.number, MAX_ROLL))?;
        let color = self
            .color_of(number, record.color_id)
            .ok_or_else(|| format!("unknown color id {}", record.color_id))?;
        Ok(Outcome {
            number,
            color,
            observed_at: record.observed_at,
        })
    }
}
