//! Outcome feed port trait.

use crate::domain::error::GhostError;
use crate::domain::outcome::FeedRecord;

pub trait FeedPort {
    /// The feed's current head. Repeated calls may return the same record.
    fn latest(&self) -> Result<FeedRecord, GhostError>;
}
