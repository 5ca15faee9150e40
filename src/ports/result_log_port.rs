//! Append-only result log port trait.

use crate::domain::error::GhostError;
use crate::domain::signal::ResultRecord;

pub trait ResultLogPort {
    fn append(&self, record: &ResultRecord) -> Result<(), GhostError>;
}
