//! CSV files: recorded feeds for replay, and an append-only result log.

use crate::domain::error::GhostError;
use crate::domain::outcome::FeedRecord;
use crate::domain::signal::{ResultKind, ResultRecord};
use crate::ports::result_log_port::ResultLogPort;
use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

const RESULT_HEADER: [&str; 5] = ["recorded_at", "strategy_id", "owner_id", "result", "raw_payload"];

fn feed_error(reason: String) -> GhostError {
    GhostError::Feed { reason }
}

/// Read a recorded feed: `observed_at,number,color_id` with an RFC 3339 timestamp.
pub fn read_feed_records<P: AsRef<Path>>(path: P) -> Result<Vec<FeedRecord>, GhostError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|e| feed_error(format!("failed to read {}: {}", path.display(), e)))?;

    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut records = Vec::new();

    for (line, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| feed_error(format!("CSV parse error: {}", e)))?;
        let row = line + 2;

        let observed_str = record
            .get(0)
            .ok_or_else(|| feed_error(format!("row {row}: missing observed_at column")))?;
        let observed_at = DateTime::parse_from_rfc3339(observed_str.trim())
            .map_err(|e| feed_error(format!("row {row}: invalid observed_at: {e}")))?
            .with_timezone(&Utc);

        let number: i64 = record
            .get(1)
            .ok_or_else(|| feed_error(format!("row {row}: missing number column")))?
            .trim()
            .parse()
            .map_err(|e| feed_error(format!("row {row}: invalid number: {e}")))?;

        let color_id: i64 = record
            .get(2)
            .ok_or_else(|| feed_error(format!("row {row}: missing color_id column")))?
            .trim()
            .parse()
            .map_err(|e| feed_error(format!("row {row}: invalid color_id: {e}")))?;

        records.push(FeedRecord {
            number,
            color_id,
            observed_at,
        });
    }

    Ok(records)
}

pub struct CsvResultLog {
    path: PathBuf,
}

impl CsvResultLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Read back every record in the log. A missing file is an empty log.
    pub fn read_all(&self) -> Result<Vec<ResultRecord>, GhostError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut rdr = csv::Reader::from_path(&self.path).map_err(|e| GhostError::Database {
            reason: format!("failed to open {}: {}", self.path.display(), e),
        })?;

        let mut records = Vec::new();
        for result in rdr.records() {
            let row = result.map_err(|e| GhostError::DatabaseQuery {
                reason: format!("CSV parse error: {}", e),
            })?;
            let field = |i: usize| row.get(i).unwrap_or_default().to_string();
            let result = ResultKind::parse(&field(3)).ok_or_else(|| GhostError::DatabaseQuery {
                reason: format!("unknown result '{}'", field(3)),
            })?;
            records.push(ResultRecord {
                strategy_id: field(1),
                owner_id: field(2),
                result,
                raw_payload: field(4),
            });
        }
        Ok(records)
    }
}

impl ResultLogPort for CsvResultLog {
    fn append(&self, record: &ResultRecord) -> Result<(), GhostError> {
        let needs_header = fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        let write_err = |e: csv::Error| GhostError::DatabaseQuery {
            reason: format!("failed to write {}: {}", self.path.display(), e),
        };

        if needs_header {
            wtr.write_record(RESULT_HEADER).map_err(write_err)?;
        }
        wtr.write_record([
            Utc::now().to_rfc3339().as_str(),
            record.strategy_id.as_str(),
            record.owner_id.as_str(),
            record.result.as_str(),
            record.raw_payload.as_str(),
        ])
        .map_err(write_err)?;
        wtr.flush()?;
        Ok(())
    }
}
