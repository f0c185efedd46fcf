//! Diesel model definitions for settlement tables
//!
//! - Queryable structs: for SELECT queries (reading data)
//! - Insertable structs: for INSERT queries (settlement lines, and test seeding
//!   of the read-only source tables)
//!
//! SQLite stores timestamps and dates as ISO-8601 TEXT and money as
//! fixed-point decimal TEXT; see `settle::decimal` for the serialization
//! rules.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::diesel_schema::*;

/// Get current UTC timestamp as ISO 8601 string for SQLite TEXT columns
pub fn current_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

// ============================================================================
// Domain Constants
// ============================================================================

/// Spending event source types
pub mod source_types {
    /// Payment unlocking one specific chapter
    pub const CHAPTER_UNLOCK: &str = "chapter_unlock";
    /// Payment for time-based whole-novel access
    pub const SUBSCRIPTION: &str = "subscription";
}

/// Editorial staff roles
pub mod roles {
    pub const EDITOR: &str = "editor";
    pub const CHIEF_EDITOR: &str = "chief_editor";

    pub fn is_valid(role: &str) -> bool {
        role == EDITOR || role == CHIEF_EDITOR
    }
}

/// Contract share types; only percent-of-book contracts are settleable
pub mod share_types {
    pub const PERCENT_OF_BOOK: &str = "percent_of_book";
}

/// Contract lifecycle states
pub mod contract_statuses {
    pub const ACTIVE: &str = "active";
}

/// Chapter review states
pub mod review_statuses {
    pub const APPROVED: &str = "approved";
}

// ============================================================================
// Source Models (read-only inputs)
// ============================================================================

/// One reader payment from the spending ledger
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = spending_events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SpendingEvent {
    pub id: String,
    pub novel_id: String,
    /// Exact decimal as fixed-point TEXT
    pub amount_usd: String,
    pub source_type: String,
    /// Unlock record id for chapter_unlock sources, subscription id otherwise
    pub source_id: String,
    pub spend_time: String,
    /// First-of-month date (YYYY-MM-01)
    pub settlement_month: String,
}

/// Unlock record resolving a chapter_unlock payment to its chapter
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = chapter_unlocks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ChapterUnlock {
    pub id: String,
    pub chapter_id: String,
}

/// Chapter row with staff attribution and word count
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = chapters)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Chapter {
    pub id: String,
    pub novel_id: String,
    pub editor_id: Option<String>,
    pub chief_editor_id: Option<String>,
    pub review_status: String,
    pub is_released: i32,
    pub word_count: Option<i64>,
    /// Fallback length source when word_count is unset or zero
    pub body: Option<String>,
}

impl Chapter {
    /// Stored word count if present and nonzero, else the character count
    /// of the body, else 0.
    pub fn effective_word_count(&self) -> i64 {
        match self.word_count {
            Some(n) if n > 0 => n,
            _ => self
                .body
                .as_ref()
                .map(|b| b.chars().count() as i64)
                .unwrap_or(0),
        }
    }
}

/// Revenue-share contract between a staff member and a novel
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = contracts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Contract {
    pub id: String,
    pub novel_id: String,
    /// Staff member holding the contract
    pub editor_id: String,
    pub role: String,
    pub share_type: String,
    /// Fraction of gross revenue (0..1) as fixed-point TEXT
    pub share_percent: String,
    pub status: String,
    pub start_date: String,
    pub end_date: Option<String>,
    /// Chapter-range bounds; loaded but never used to filter allocation
    pub start_chapter_id: Option<String>,
    pub end_chapter_id: Option<String>,
}

// ============================================================================
// Output Model
// ============================================================================

/// One settlement line: the share of one spending event attributed to one
/// staff member. The month's lines are fully replaced on every recompute.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = settlement_lines)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SettlementLine {
    pub id: String,
    /// Staff member receiving the share
    pub editor_id: String,
    pub role: String,
    pub novel_id: String,
    /// Month key (YYYY-MM-01), the replacement scope
    pub month: String,
    pub source_spend_id: String,
    pub source_type: String,
    /// Set for chapter-unlock lines only
    pub chapter_id: Option<String>,
    pub chapter_count_total: i64,
    pub chapter_count_editor: i64,
    pub total_word_count: i64,
    pub editor_word_count: i64,
    /// Event amount, 6 decimal places
    pub gross_income_usd: String,
    /// Effective share (contract share x word ratio), 4 decimal places
    pub editor_share_percent: String,
    /// Raw contract share, 4 decimal places
    pub contract_share_percent: String,
    /// gross x contract share x word ratio, 6 decimal places
    pub editor_income_usd: String,
    pub created_at: String,
}
