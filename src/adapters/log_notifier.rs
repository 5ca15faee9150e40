//! Notifier that writes notices to the log instead of delivering them.

use crate::domain::error::GhostError;
use crate::ports::notify_port::NotifyPort;

#[derive(Debug, Default)]
pub struct LogNotifier;

impl NotifyPort for LogNotifier {
    fn notify(&self, owner_id: &str, text: &str) -> Result<(), GhostError> {
        tracing::info!(owner = owner_id, "notice: {}", text.replace('\n', " | "));
        Ok(())
    }
}
