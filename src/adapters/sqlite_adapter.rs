//! SQLite store: strategies, the signal result log and owner channels.

use crate::domain::error::GhostError;
use crate::domain::signal::{ResultKind, ResultRecord};
use crate::domain::strategy::{StrategyConfig, StrategyDefinition};
use crate::ports::config_port::ConfigPort;
use crate::ports::notify_port::ChannelPort;
use crate::ports::result_log_port::ResultLogPort;
use crate::ports::strategy_port::StrategyPort;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

fn pool_error(e: r2d2::Error) -> GhostError {
    GhostError::Database {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> GhostError {
    GhostError::DatabaseQuery {
        reason: e.to_string(),
    }
}

/// Cloning shares the underlying pool.
#[derive(Clone)]
pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, GhostError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| GhostError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, GhostError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, GhostError> {
        self.pool.get().map_err(pool_error)
    }

    pub fn initialize_schema(&self) -> Result<(), GhostError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS strategies (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL DEFAULT '',
                config TEXT,
                enabled INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE TABLE IF NOT EXISTS signal_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                strategy_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                result TEXT NOT NULL,
                raw_payload TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_signal_results_strategy ON signal_results(strategy_id);
            CREATE TABLE IF NOT EXISTS telegram_channels (
                user_id TEXT NOT NULL,
                channel_id TEXT NOT NULL,
                validated_at TEXT,
                PRIMARY KEY (user_id, channel_id)
            );",
        )
        .map_err(query_error)?;

        Ok(())
    }

    /// Insert or replace a strategy row; `config` is the JSON strategy document.
    pub fn upsert_strategy(
        &self,
        id: &str,
        owner_id: &str,
        name: &str,
        config: &str,
        enabled: bool,
    ) -> Result<(), GhostError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO strategies (id, user_id, name, config, enabled)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, owner_id, name, config, enabled],
        )
        .map_err(query_error)?;
        Ok(())
    }

    /// Register a delivery channel; only validated channels receive notices.
    pub fn register_channel(
        &self,
        owner_id: &str,
        channel_id: &str,
        validated: bool,
    ) -> Result<(), GhostError> {
        let conn = self.conn()?;
        let validated_at = validated.then(|| chrono::Utc::now().to_rfc3339());
        conn.execute(
            "INSERT OR REPLACE INTO telegram_channels (user_id, channel_id, validated_at)
             VALUES (?1, ?2, ?3)",
            params![owner_id, channel_id, validated_at],
        )
        .map_err(query_error)?;
        Ok(())
    }

    pub fn results(&self) -> Result<Vec<ResultRecord>, GhostError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT strategy_id, user_id, result, raw_payload
                 FROM signal_results ORDER BY id ASC",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(query_error)?;

        let mut records = Vec::new();
        for row in rows {
            let (strategy_id, owner_id, result, raw_payload) = row.map_err(query_error)?;
            let result = ResultKind::parse(&result).ok_or_else(|| GhostError::DatabaseQuery {
                reason: format!("unknown result '{result}' for strategy {strategy_id}"),
            })?;
            records.push(ResultRecord {
                strategy_id,
                owner_id,
                result,
                raw_payload,
            });
        }
        Ok(records)
    }
}

impl StrategyPort for SqliteAdapter {
    fn load_strategies(&self) -> Result<Vec<StrategyDefinition>, GhostError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, name, config, enabled
                 FROM strategies ORDER BY created_at ASC, id ASC",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, bool>(4)?,
                ))
            })
            .map_err(query_error)?;

        let mut strategies = Vec::new();
        for row in rows {
            let (id, owner_id, name, config, enabled) = row.map_err(query_error)?;
            let config = match config.as_deref().map(serde_json::from_str::<StrategyConfig>) {
                Some(Ok(c)) => c,
                Some(Err(e)) => {
                    tracing::warn!(strategy = %id, "unreadable strategy config: {e}");
                    StrategyConfig::default()
                }
                None => StrategyConfig::default(),
            };
            let mut strategy = StrategyDefinition::from_config(&id, &owner_id, &name, &config);
            strategy.enabled = enabled;
            strategies.push(strategy);
        }
        Ok(strategies)
    }
}

impl ResultLogPort for SqliteAdapter {
    fn append(&self, record: &ResultRecord) -> Result<(), GhostError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO signal_results (strategy_id, user_id, result, raw_payload)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.strategy_id,
                record.owner_id,
                record.result.as_str(),
                record.raw_payload
            ],
        )
        .map_err(query_error)?;
        Ok(())
    }
}

impl ChannelPort for SqliteAdapter {
    fn channels_for(&self, owner_id: &str) -> Result<Vec<String>, GhostError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT channel_id FROM telegram_channels
                 WHERE user_id = ?1 AND validated_at IS NOT NULL
                 ORDER BY channel_id",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map(params![owner_id], |row| row.get(0))
            .map_err(query_error)?;

        let mut channels = Vec::new();
        for row in rows {
            channels.push(row.map_err(query_error)?);
        }
        Ok(channels)
    }
}
