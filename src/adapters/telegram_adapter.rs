//! Telegram Bot API delivery.

use crate::domain::error::GhostError;
use crate::ports::notify_port::{ChannelPort, NotifyPort};
use serde::Serialize;
use std::time::Duration;

const API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

/// The same channel list for every owner, from `[telegram] chat_ids`.
pub struct FixedChannels {
    channels: Vec<String>,
}

impl FixedChannels {
    pub fn new(channels: Vec<String>) -> Self {
        Self { channels }
    }

    /// Parse a comma separated id list, skipping blanks.
    pub fn parse(list: &str) -> Self {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

impl ChannelPort for FixedChannels {
    fn channels_for(&self, _owner_id: &str) -> Result<Vec<String>, GhostError> {
        Ok(self.channels.clone())
    }
}

pub struct TelegramNotifier {
    http: reqwest::blocking::Client,
    bot_token: String,
    api_base: String,
    channels: Box<dyn ChannelPort>,
}

impl TelegramNotifier {
    pub fn new(
        bot_token: &str,
        channels: Box<dyn ChannelPort>,
        timeout: Duration,
    ) -> Result<Self, GhostError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GhostError::Notify {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            bot_token: bot_token.to_string(),
            api_base: API_BASE.to_string(),
            channels,
        })
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    fn send(&self, chat_id: &str, text: &str) -> Result<(), String> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: "Markdown",
        };

        let resp = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .map_err(|e| e.to_string())?;
        if !resp.status().is_success() {
            return Err(format!("HTTP {}", resp.status()));
        }
        Ok(())
    }
}

impl NotifyPort for TelegramNotifier {
    /// Sends to every channel of the owner. One failing channel does not stop
    /// delivery to the rest; the failures are reported together.
    fn notify(&self, owner_id: &str, text: &str) -> Result<(), GhostError> {
        let channels = self.channels.channels_for(owner_id)?;
        if channels.is_empty() {
            tracing::debug!(owner = owner_id, "no validated channels, notice dropped");
            return Ok(());
        }

        let failures: Vec<String> = channels
            .iter()
            .filter_map(|chat_id| {
                self.send(chat_id, text)
                    .err()
                    .map(|e| format!("{chat_id}: {e}"))
            })
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(GhostError::Notify {
                reason: failures.join("; "),
            })
        }
    }
}
