//! SQLite database module for settlement storage
//!
//! ## Tables
//!
//! - `spending_events` - reader payments, tagged with settlement month (read-only)
//! - `chapter_unlocks` - unlock record -> chapter resolution (read-only)
//! - `chapters` - staff attribution and word counts (read-only)
//! - `contracts` - revenue-share contracts with validity windows (read-only)
//! - `settlement_lines` - this engine's output, replaced per month
//!
//! The schema is fixed and versioned with the crate; there is no runtime
//! column introspection. Money columns are fixed-point decimal TEXT.

pub mod chapters;
pub mod contracts;
pub mod diesel_schema;
pub mod models;
pub mod settlement_lines;
pub mod spending;

use std::path::Path;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use tracing::{debug, info};

use crate::error::SettleError;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Open or create the settlement database and initialize its schema
pub fn open(db_path: &Path) -> Result<DbPool, SettleError> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    info!("Opening SQLite database at {:?}", db_path);

    let manager = ConnectionManager::<SqliteConnection>::new(db_path.to_string_lossy());
    let pool = Pool::builder()
        .build(manager)
        .map_err(|e| SettleError::Pool(format!("Failed to build pool: {}", e)))?;

    let mut conn = get_conn(&pool)?;

    // Enable WAL mode for better concurrent read performance
    conn.batch_execute("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
        .map_err(|e| SettleError::Internal(format!("Failed to set PRAGMA: {}", e)))?;

    init_schema(&mut conn)?;

    Ok(pool)
}

/// Open an in-memory database (for testing)
pub fn open_in_memory() -> Result<DbPool, SettleError> {
    debug!("Opening in-memory SQLite database");

    // Each pooled connection would see its own in-memory database, so the
    // pool is capped at a single connection.
    let manager = ConnectionManager::<SqliteConnection>::new(":memory:");
    let pool = Pool::builder()
        .max_size(1)
        .build(manager)
        .map_err(|e| SettleError::Pool(format!("Failed to build pool: {}", e)))?;

    let mut conn = get_conn(&pool)?;
    init_schema(&mut conn)?;

    Ok(pool)
}

/// Get a connection from the pool
pub fn get_conn(pool: &DbPool) -> Result<DbConn, SettleError> {
    pool.get()
        .map_err(|e| SettleError::Pool(format!("Failed to get connection: {}", e)))
}

/// Initialize database schema
pub fn init_schema(conn: &mut SqliteConnection) -> Result<(), SettleError> {
    diesel::sql_query(
        r#"
        CREATE TABLE IF NOT EXISTS spending_events (
            id TEXT PRIMARY KEY NOT NULL,
            novel_id TEXT NOT NULL,
            amount_usd TEXT NOT NULL,
            source_type TEXT NOT NULL,
            source_id TEXT NOT NULL,
            spend_time TEXT NOT NULL,
            settlement_month TEXT NOT NULL
        )
        "#,
    )
    .execute(conn)
    .map_err(|e| SettleError::Internal(format!("Failed to create spending_events: {}", e)))?;

    diesel::sql_query(
        r#"
        CREATE TABLE IF NOT EXISTS chapter_unlocks (
            id TEXT PRIMARY KEY NOT NULL,
            chapter_id TEXT NOT NULL
        )
        "#,
    )
    .execute(conn)
    .map_err(|e| SettleError::Internal(format!("Failed to create chapter_unlocks: {}", e)))?;

    diesel::sql_query(
        r#"
        CREATE TABLE IF NOT EXISTS chapters (
            id TEXT PRIMARY KEY NOT NULL,
            novel_id TEXT NOT NULL,
            editor_id TEXT,
            chief_editor_id TEXT,
            review_status TEXT NOT NULL DEFAULT 'draft',
            is_released INTEGER NOT NULL DEFAULT 0,
            word_count INTEGER,
            body TEXT
        )
        "#,
    )
    .execute(conn)
    .map_err(|e| SettleError::Internal(format!("Failed to create chapters: {}", e)))?;

    diesel::sql_query(
        r#"
        CREATE TABLE IF NOT EXISTS contracts (
            id TEXT PRIMARY KEY NOT NULL,
            novel_id TEXT NOT NULL,
            editor_id TEXT NOT NULL,
            role TEXT NOT NULL,
            share_type TEXT NOT NULL,
            share_percent TEXT NOT NULL,
            status TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT,
            start_chapter_id TEXT,
            end_chapter_id TEXT
        )
        "#,
    )
    .execute(conn)
    .map_err(|e| SettleError::Internal(format!("Failed to create contracts: {}", e)))?;

    diesel::sql_query(
        r#"
        CREATE TABLE IF NOT EXISTS settlement_lines (
            id TEXT PRIMARY KEY NOT NULL,
            editor_id TEXT NOT NULL,
            role TEXT NOT NULL,
            novel_id TEXT NOT NULL,
            month TEXT NOT NULL,
            source_spend_id TEXT NOT NULL,
            source_type TEXT NOT NULL,
            chapter_id TEXT,
            chapter_count_total INTEGER NOT NULL DEFAULT 0,
            chapter_count_editor INTEGER NOT NULL DEFAULT 0,
            total_word_count INTEGER NOT NULL DEFAULT 0,
            editor_word_count INTEGER NOT NULL DEFAULT 0,
            gross_income_usd TEXT NOT NULL,
            editor_share_percent TEXT NOT NULL,
            contract_share_percent TEXT NOT NULL,
            editor_income_usd TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(conn)
    .map_err(|e| SettleError::Internal(format!("Failed to create settlement_lines: {}", e)))?;

    // Indexes
    diesel::sql_query(
        "CREATE INDEX IF NOT EXISTS idx_spending_events_month ON spending_events(settlement_month)",
    )
    .execute(conn)
    .map_err(|e| SettleError::Internal(format!("Failed to create index: {}", e)))?;

    diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_chapters_novel ON chapters(novel_id)")
        .execute(conn)
        .map_err(|e| SettleError::Internal(format!("Failed to create index: {}", e)))?;

    diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_contracts_novel ON contracts(novel_id)")
        .execute(conn)
        .map_err(|e| SettleError::Internal(format!("Failed to create index: {}", e)))?;

    diesel::sql_query(
        "CREATE INDEX IF NOT EXISTS idx_settlement_lines_month ON settlement_lines(month)",
    )
    .execute(conn)
    .map_err(|e| SettleError::Internal(format!("Failed to create index: {}", e)))?;

    // Safety net against double-insertion; delete-then-insert remains the
    // correctness mechanism for reruns.
    diesel::sql_query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_settlement_lines_source_editor_role \
         ON settlement_lines(source_spend_id, editor_id, role)",
    )
    .execute(conn)
    .map_err(|e| SettleError::Internal(format!("Failed to create index: {}", e)))?;

    debug!("Settlement schema initialized");
    Ok(())
}
