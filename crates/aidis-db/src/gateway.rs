// aidis-db/src/gateway.rs
// ============================================================================
// Module: Database Gateway
// Description: Pooled Postgres access with retry and circuit breaking.
// Purpose: The single path to the database for every tool handler.
// Dependencies: aidis-core, aidis-config, sqlx, tokio, tracing
// ============================================================================

//! ## Overview
//! Handlers never open connections: they hand the gateway a SQL string and
//! bound parameters, and the gateway enforces the breaker, retries
//! transient failures with exponential backoff, and logs every query with
//! its correlation id. Parameters are never logged; the SQL is truncated.
//! Queries over one second log at warn, over five seconds at error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;
use std::time::Instant;

use aidis_config::DatabaseConfig;
use aidis_core::CorrelationId;
use aidis_core::ToolError;
use chrono::DateTime;
use chrono::Utc;
use serde_json::Value;
use sqlx::Postgres;
use sqlx::Transaction;
use sqlx::postgres::PgArguments;
use sqlx::postgres::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::postgres::PgRow;
use sqlx::query::Query;
use thiserror::Error;
use uuid::Uuid;

use crate::breaker::CircuitBreaker;

/// Longest SQL prefix included in query logs.
const MAX_LOGGED_SQL: usize = 120;
/// Query duration that logs at warn.
const SLOW_QUERY_WARN: Duration = Duration::from_secs(1);
/// Query duration that logs at error.
const SLOW_QUERY_ERROR: Duration = Duration::from_secs(5);

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Database gateway errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Breaker is open; the database was not touched.
    #[error("database circuit breaker is open")]
    CircuitOpen,
    /// Call exceeded a deadline.
    #[error("database timeout: {0}")]
    Timeout(String),
    /// Uniqueness constraint violated.
    #[error("unique violation: {0}")]
    UniqueViolation(String),
    /// Connection could not be established.
    #[error("database connection failed: {0}")]
    Connection(String),
    /// Row decoding failed.
    #[error("row decode failed: {0}")]
    Decode(String),
    /// Any other database failure.
    #[error("database error: {0}")]
    Query(String),
}

impl From<DbError> for ToolError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::CircuitOpen => Self::CircuitOpen,
            DbError::Timeout(message) => Self::Timeout(message),
            DbError::UniqueViolation(message) => Self::AlreadyExists(message),
            DbError::Connection(message) | DbError::Decode(message) | DbError::Query(message) => {
                Self::Internal(message)
            }
        }
    }
}

// ============================================================================
// SECTION: Parameters
// ============================================================================

/// Bound query parameter.
///
/// Owned values keep retried attempts independent of caller lifetimes.
#[derive(Debug, Clone)]
pub enum SqlParam {
    /// UUID value.
    Uuid(Uuid),
    /// Optional UUID value.
    OptUuid(Option<Uuid>),
    /// Text value.
    Text(String),
    /// Optional text value.
    OptText(Option<String>),
    /// 64-bit integer value.
    Int(i64),
    /// Optional 64-bit integer value.
    OptInt(Option<i64>),
    /// Double-precision float value.
    Float(f64),
    /// Optional double-precision float value.
    OptFloat(Option<f64>),
    /// Boolean value.
    Bool(bool),
    /// JSONB value.
    Json(Value),
    /// Optional JSONB value; `None` binds SQL NULL, not JSON null.
    OptJson(Option<Value>),
    /// Text array value.
    TextArray(Vec<String>),
    /// UUID array value.
    UuidArray(Vec<Uuid>),
    /// Timestamp value.
    Timestamp(DateTime<Utc>),
    /// Optional timestamp value.
    OptTimestamp(Option<DateTime<Utc>>),
}

/// Binds parameters onto a query in declaration order.
fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[SqlParam],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            SqlParam::Uuid(value) => query.bind(*value),
            SqlParam::OptUuid(value) => query.bind(*value),
            SqlParam::Text(value) => query.bind(value.clone()),
            SqlParam::OptText(value) => query.bind(value.clone()),
            SqlParam::Int(value) => query.bind(*value),
            SqlParam::OptInt(value) => query.bind(*value),
            SqlParam::Float(value) => query.bind(*value),
            SqlParam::OptFloat(value) => query.bind(*value),
            SqlParam::Bool(value) => query.bind(*value),
            SqlParam::Json(value) => query.bind(value.clone()),
            SqlParam::OptJson(value) => query.bind(value.clone()),
            SqlParam::TextArray(value) => query.bind(value.clone()),
            SqlParam::UuidArray(value) => query.bind(value.clone()),
            SqlParam::Timestamp(value) => query.bind(*value),
            SqlParam::OptTimestamp(value) => query.bind(*value),
        };
    }
    query
}

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// Pooled, breaker-protected database gateway.
pub struct DbGateway {
    /// Connection pool; the only pool in the process.
    pool: PgPool,
    /// Circuit breaker shared by all callers.
    breaker: CircuitBreaker,
    /// Retry attempts for transient failures.
    retry_attempts: u32,
    /// Base delay for retry backoff.
    retry_base_delay: Duration,
}

impl DbGateway {
    /// Connects the pool, retrying transient startup failures.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Connection`] when the pool cannot be opened
    /// within the retry budget.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbError> {
        let attempts = config.retry_attempts.max(1);
        let mut last_error = String::new();
        for attempt in 0..attempts {
            match PgPoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(config.connect_timeout)
                .connect(&config.url)
                .await
            {
                Ok(pool) => {
                    tracing::info!(attempt, "database pool connected");
                    return Ok(Self {
                        pool,
                        breaker: CircuitBreaker::new(
                            config.breaker_threshold,
                            config.breaker_recovery,
                        ),
                        retry_attempts: attempts,
                        retry_base_delay: config.retry_base_delay,
                    });
                }
                Err(error) => {
                    last_error = error.to_string();
                    tracing::warn!(attempt, error = %last_error, "database connect failed");
                    if attempt + 1 < attempts {
                        tokio::time::sleep(backoff_delay(config.retry_base_delay, attempt)).await;
                    }
                }
            }
        }
        Err(DbError::Connection(last_error))
    }

    /// Creates a gateway whose pool connects on first use.
    ///
    /// Startup normally goes through [`Self::connect`] so a dead database
    /// fails fast; lazy construction exists for tests and tooling.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Connection`] when the URL is malformed.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .connect_lazy(&config.url)
            .map_err(|error| DbError::Connection(error.to_string()))?;
        Ok(Self {
            pool,
            breaker: CircuitBreaker::new(config.breaker_threshold, config.breaker_recovery),
            retry_attempts: config.retry_attempts.max(1),
            retry_base_delay: config.retry_base_delay,
        })
    }

    /// Fetches all rows for a query.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] when the breaker is open or the query fails
    /// after the retry budget.
    pub async fn fetch_all(
        &self,
        correlation_id: &CorrelationId,
        sql: &str,
        params: &[SqlParam],
    ) -> Result<Vec<PgRow>, DbError> {
        self.with_retry(correlation_id, sql, || {
            let query = bind_params(sqlx::query(sql), params);
            let pool = self.pool.clone();
            async move {
                let rows = query.fetch_all(&pool).await?;
                let count = u64::try_from(rows.len()).unwrap_or(u64::MAX);
                Ok((rows, count))
            }
        })
        .await
    }

    /// Fetches at most one row for a query.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] when the breaker is open or the query fails
    /// after the retry budget.
    pub async fn fetch_optional(
        &self,
        correlation_id: &CorrelationId,
        sql: &str,
        params: &[SqlParam],
    ) -> Result<Option<PgRow>, DbError> {
        self.with_retry(correlation_id, sql, || {
            let query = bind_params(sqlx::query(sql), params);
            let pool = self.pool.clone();
            async move {
                let row = query.fetch_optional(&pool).await?;
                let count = u64::from(row.is_some());
                Ok((row, count))
            }
        })
        .await
    }

    /// Executes a statement and returns the affected row count.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] when the breaker is open or the statement fails
    /// after the retry budget.
    pub async fn execute(
        &self,
        correlation_id: &CorrelationId,
        sql: &str,
        params: &[SqlParam],
    ) -> Result<u64, DbError> {
        self.with_retry(correlation_id, sql, || {
            let query = bind_params(sqlx::query(sql), params);
            let pool = self.pool.clone();
            async move {
                let result = query.execute(&pool).await?;
                let count = result.rows_affected();
                Ok((count, count))
            }
        })
        .await
    }

    /// Runs a transactional closure.
    ///
    /// The closure executes exactly once; retries apply only to the
    /// single-statement helpers.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] when the breaker is open, the transaction cannot
    /// begin or commit, or the closure fails.
    pub async fn with_tx<T, F, Fut>(
        &self,
        correlation_id: &CorrelationId,
        op: F,
    ) -> Result<T, DbError>
    where
        F: FnOnce(Transaction<'static, Postgres>) -> Fut,
        Fut: Future<Output = Result<(Transaction<'static, Postgres>, T), DbError>>,
    {
        self.breaker.try_acquire().map_err(|()| DbError::CircuitOpen)?;
        let started = Instant::now();
        let tx = match self.pool.begin().await {
            Ok(tx) => tx,
            Err(error) => {
                self.breaker.on_failure();
                return Err(map_error(&error));
            }
        };
        match op(tx).await {
            Ok((tx, value)) => match tx.commit().await {
                Ok(()) => {
                    self.breaker.on_success();
                    log_query(correlation_id, "BEGIN..COMMIT", started.elapsed(), 0);
                    Ok(value)
                }
                Err(error) => {
                    self.breaker.on_failure();
                    Err(map_error(&error))
                }
            },
            Err(error) => {
                // Rollback happens when the transaction drops.
                self.breaker.on_failure();
                Err(error)
            }
        }
    }

    /// Probes database health with a trivial query.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] when the probe fails.
    pub async fn health_probe(&self, correlation_id: &CorrelationId) -> Result<(), DbError> {
        self.fetch_all(correlation_id, "SELECT 1", &[]).await.map(|_| ())
    }

    /// Returns the breaker protecting this gateway.
    #[must_use]
    pub const fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Shared retry loop for the single-statement helpers.
    async fn with_retry<T, F, Fut>(
        &self,
        correlation_id: &CorrelationId,
        sql: &str,
        op: F,
    ) -> Result<T, DbError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<(T, u64), sqlx::Error>>,
    {
        let pass = self.breaker.try_acquire().map_err(|()| DbError::CircuitOpen)?;
        let mut attempt: u32 = 0;
        loop {
            let started = Instant::now();
            match op().await {
                Ok((value, row_count)) => {
                    self.breaker.on_success();
                    log_query(correlation_id, sql, started.elapsed(), row_count);
                    return Ok(value);
                }
                Err(error) => {
                    let transient = is_transient(&error);
                    tracing::warn!(
                        correlation_id = %correlation_id,
                        attempt,
                        transient,
                        error = %error,
                        sql = %truncate_sql(sql),
                        "query attempt failed"
                    );
                    if transient && !pass.probe && attempt + 1 < self.retry_attempts {
                        let delay = backoff_delay(self.retry_base_delay, attempt);
                        attempt += 1;
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    self.breaker.on_failure();
                    return Err(map_error(&error));
                }
            }
        }
    }
}

// ============================================================================
// SECTION: Transaction Helpers
// ============================================================================

/// Fetches all rows inside a transaction.
///
/// # Errors
///
/// Returns [`DbError`] when the query fails.
pub async fn tx_fetch_all(
    tx: &mut Transaction<'static, Postgres>,
    sql: &str,
    params: &[SqlParam],
) -> Result<Vec<PgRow>, DbError> {
    bind_params(sqlx::query(sql), params)
        .fetch_all(&mut **tx)
        .await
        .map_err(|error| map_error(&error))
}

/// Fetches at most one row inside a transaction.
///
/// # Errors
///
/// Returns [`DbError`] when the query fails.
pub async fn tx_fetch_optional(
    tx: &mut Transaction<'static, Postgres>,
    sql: &str,
    params: &[SqlParam],
) -> Result<Option<PgRow>, DbError> {
    bind_params(sqlx::query(sql), params)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|error| map_error(&error))
}

/// Executes a statement inside a transaction.
///
/// # Errors
///
/// Returns [`DbError`] when the statement fails.
pub async fn tx_execute(
    tx: &mut Transaction<'static, Postgres>,
    sql: &str,
    params: &[SqlParam],
) -> Result<u64, DbError> {
    bind_params(sqlx::query(sql), params)
        .execute(&mut **tx)
        .await
        .map(|result| result.rows_affected())
        .map_err(|error| map_error(&error))
}

// ============================================================================
// SECTION: Classification and Logging
// ============================================================================

/// Computes the delay before retry number `attempt + 1`.
#[must_use]
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2_u32.saturating_pow(attempt.min(16)))
}

/// Returns true for failures worth retrying.
fn is_transient(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut => true,
        sqlx::Error::Database(db) => matches!(
            db.code().as_deref(),
            // Serialization failure, deadlock, cannot-connect, connection exceptions.
            Some("40001" | "40P01" | "57P03" | "08000" | "08003" | "08006")
        ),
        _ => false,
    }
}

/// Maps a sqlx error onto the gateway taxonomy.
fn map_error(error: &sqlx::Error) -> DbError {
    match error {
        sqlx::Error::PoolTimedOut => DbError::Timeout("connection acquire timed out".to_string()),
        sqlx::Error::ColumnDecode {
            ..
        } => DbError::Decode(error.to_string()),
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            DbError::UniqueViolation(db.message().to_string())
        }
        sqlx::Error::Io(io) => DbError::Connection(io.to_string()),
        _ => DbError::Query(error.to_string()),
    }
}

/// Truncates SQL for logging.
fn truncate_sql(sql: &str) -> String {
    let flattened: String = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if flattened.len() <= MAX_LOGGED_SQL {
        flattened
    } else {
        let mut prefix: String = flattened.chars().take(MAX_LOGGED_SQL).collect();
        prefix.push('…');
        prefix
    }
}

/// Emits the per-query log line. Parameters are never logged.
fn log_query(correlation_id: &CorrelationId, sql: &str, elapsed: Duration, row_count: u64) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    let sql = truncate_sql(sql);
    if elapsed >= SLOW_QUERY_ERROR {
        tracing::error!(correlation_id = %correlation_id, duration_ms, row_count, sql = %sql, "very slow query");
    } else if elapsed >= SLOW_QUERY_WARN {
        tracing::warn!(correlation_id = %correlation_id, duration_ms, row_count, sql = %sql, "slow query");
    } else {
        tracing::debug!(correlation_id = %correlation_id, duration_ms, row_count, sql = %sql, "query completed");
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        reason = "Test-only assertions."
    )]

    use std::time::Duration;

    use aidis_core::ToolError;

    use super::DbError;
    use super::backoff_delay;
    use super::is_transient;
    use super::truncate_sql;

    #[test]
    fn backoff_doubles_per_attempt() {
        let base = Duration::from_secs(1);
        assert_eq!(backoff_delay(base, 0), Duration::from_secs(1));
        assert_eq!(backoff_delay(base, 1), Duration::from_secs(2));
        assert_eq!(backoff_delay(base, 2), Duration::from_secs(4));
    }

    #[test]
    fn io_and_pool_timeouts_are_transient() {
        let io = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset",
        ));
        assert!(is_transient(&io));
        assert!(is_transient(&sqlx::Error::PoolTimedOut));
    }

    #[test]
    fn row_not_found_is_not_transient() {
        assert!(!is_transient(&sqlx::Error::RowNotFound));
    }

    #[test]
    fn sql_is_truncated_and_flattened_for_logs() {
        let long = format!("SELECT {}\n  FROM contexts", "x, ".repeat(100));
        let logged = truncate_sql(&long);
        assert!(logged.chars().count() <= 121);
        assert!(!logged.contains('\n'));
        assert_eq!(truncate_sql("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn gateway_errors_map_onto_the_tool_taxonomy() {
        assert!(matches!(ToolError::from(DbError::CircuitOpen), ToolError::CircuitOpen));
        assert!(matches!(
            ToolError::from(DbError::UniqueViolation("dup".into())),
            ToolError::AlreadyExists(_)
        ));
        assert!(matches!(
            ToolError::from(DbError::Timeout("t".into())),
            ToolError::Timeout(_)
        ));
        assert!(matches!(
            ToolError::from(DbError::Query("q".into())),
            ToolError::Internal(_)
        ));
    }
}
