//! Strategy store port trait.

use crate::domain::error::GhostError;
use crate::domain::strategy::StrategyDefinition;

pub trait StrategyPort {
    /// A read snapshot of every stored strategy, taken once per tick.
    fn load_strategies(&self) -> Result<Vec<StrategyDefinition>, GhostError>;
}
