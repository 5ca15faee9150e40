//! Notification delivery port traits.

use crate::domain::error::GhostError;

/// Delivers a text to a strategy owner. Delivery outcome never feeds back into
/// engine state.
pub trait NotifyPort {
    fn notify(&self, owner_id: &str, text: &str) -> Result<(), GhostError>;
}

/// Resolves the delivery channels registered for an owner.
pub trait ChannelPort {
    fn channels_for(&self, owner_id: &str) -> Result<Vec<String>, GhostError>;
}
