//! Suffix pattern matching of strategies against the outcome window.

use super::error::EngineError;
use super::outcome::Outcome;
use super::strategy::{PatternElement, StrategyDefinition, Target};
use super::window::OutcomeWindow;

/// A strategy whose pattern matched the most recent outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub strategy_id: String,
    pub owner_id: String,
    pub strategy_name: String,
    pub matched: Vec<Outcome>,
    pub target: Target,
    pub max_gales: u32,
}

impl Match {
    pub fn key(&self) -> (String, String) {
        (self.owner_id.clone(), self.strategy_id.clone())
    }
}

fn element_matches(element: &PatternElement, outcome: &Outcome) -> bool {
    match element {
        PatternElement::Wildcard => true,
        PatternElement::Color(c) => outcome.color == *c,
        PatternElement::Number(n) => outcome.number == *n,
        PatternElement::Unrecognized(_) => false,
    }
}

/// Match one strategy against the window tail.
///
/// Only the trailing `L` outcomes are compared, position by position.
pub fn evaluate_strategy(
    window: &OutcomeWindow,
    strategy: &StrategyDefinition,
) -> Result<Option<Match>, EngineError> {
    let target = strategy.check()?;
    let tail = window.tail(strategy.pattern.len())?;

    let matched = strategy
        .pattern
        .iter()
        .zip(tail.iter())
        .all(|(element, outcome)| element_matches(element, outcome));

    if !matched {
        return Ok(None);
    }

    Ok(Some(Match {
        strategy_id: strategy.id.clone(),
        owner_id: strategy.owner_id.clone(),
        strategy_name: strategy.name.clone(),
        matched: tail,
        target,
        max_gales: strategy.max_gales,
    }))
}

/// Match every enabled strategy, in input order.
///
/// Strategies that cannot be evaluated contribute nothing; a malformed one is
/// logged and the rest proceed.
pub fn match_strategies(window: &OutcomeWindow, strategies: &[StrategyDefinition]) -> Vec<Match> {
    let mut matches = Vec::new();
    for strategy in strategies.iter().filter(|s| s.enabled) {
        match evaluate_strategy(window, strategy) {
            Ok(Some(m)) => matches.push(m),
            Ok(None) => {}
            Err(EngineError::InsufficientHistory { have, need }) => {
                tracing::trace!(strategy = %strategy.id, have, need, "not enough history yet");
            }
            Err(e @ EngineError::MalformedStrategy { .. }) => {
                tracing::warn!(owner = %strategy.owner_id, "skipping strategy: {e}");
            }
        }
    }
    matches
}
