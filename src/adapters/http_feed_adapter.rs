//! Live outcome feed over HTTP.
//!
//! The endpoint returns a JSON array, newest first:
//! `[{"roll": 11, "color": 1, "created_at": "2024-05-01T12:00:00.000Z"}, ...]`.
//! Only the head element is read. Transient failures (connect, timeout,
//! non-success status) are retried with exponential backoff.

use crate::domain::error::GhostError;
use crate::domain::outcome::FeedRecord;
use crate::ports::feed_port::FeedPort;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct FeedEntry {
    roll: i64,
    color: i64,
    created_at: String,
}

/// Parse a feed response body into its head record.
pub fn parse_feed_body(body: &str) -> Result<FeedRecord, GhostError> {
    let entries: Vec<FeedEntry> = serde_json::from_str(body).map_err(|e| GhostError::Feed {
        reason: format!("unexpected feed format: {e}"),
    })?;
    let head = entries.into_iter().next().ok_or_else(|| GhostError::Feed {
        reason: "feed returned no outcomes".to_string(),
    })?;
    let observed_at = DateTime::parse_from_rfc3339(&head.created_at)
        .map_err(|e| GhostError::Feed {
            reason: format!("invalid created_at '{}': {e}", head.created_at),
        })?
        .with_timezone(&Utc);

    Ok(FeedRecord {
        number: head.roll,
        color_id: head.color,
        observed_at,
    })
}

pub struct HttpFeedAdapter {
    client: reqwest::blocking::Client,
    url: String,
    max_retries: u32,
    base_delay: Duration,
}

impl HttpFeedAdapter {
    pub fn new(url: &str, timeout: Duration, max_retries: u32) -> Result<Self, GhostError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GhostError::Feed {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            url: url.to_string(),
            max_retries,
            base_delay: Duration::from_millis(250),
        })
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    fn fetch_with_retry(&self) -> Result<String, GhostError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                tracing::debug!(attempt, ?delay, "retrying feed request");
                std::thread::sleep(delay);
            }

            match self.client.get(&self.url).send() {
                Ok(resp) => {
                    let status = resp.status();
                    if !status.is_success() {
                        last_error = Some(format!("HTTP {status} from {}", self.url));
                        continue;
                    }
                    return resp.text().map_err(|e| GhostError::Feed {
                        reason: format!("failed to read feed body: {e}"),
                    });
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(e.to_string());
                        continue;
                    }
                    return Err(GhostError::Feed {
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(GhostError::Feed {
            reason: last_error.unwrap_or_else(|| "max retries exceeded".to_string()),
        })
    }
}

impl FeedPort for HttpFeedAdapter {
    fn latest(&self) -> Result<FeedRecord, GhostError> {
        let body = self.fetch_with_retry()?;
        parse_feed_body(&body)
    }
}
