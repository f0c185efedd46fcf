//! Chapter and unlock-record queries
//!
//! Both tables are owned by the chapter-editing side of the platform and are
//! read-only here. The effective word count rule lives on the `Chapter`
//! model.

use diesel::prelude::*;

use super::diesel_schema::{chapter_unlocks, chapters};
use super::models::{review_statuses, Chapter, ChapterUnlock};
use crate::error::SettleError;

/// Batch-load unlock records by id
pub fn unlocks_by_ids(
    conn: &mut SqliteConnection,
    ids: &[&str],
) -> Result<Vec<ChapterUnlock>, SettleError> {
    if ids.is_empty() {
        return Ok(vec![]);
    }
    chapter_unlocks::table
        .filter(chapter_unlocks::id.eq_any(ids))
        .load(conn)
        .map_err(|e| SettleError::Internal(format!("Unlock query failed: {}", e)))
}

/// Batch-load chapters by id
pub fn chapters_by_ids(
    conn: &mut SqliteConnection,
    ids: &[&str],
) -> Result<Vec<Chapter>, SettleError> {
    if ids.is_empty() {
        return Ok(vec![]);
    }
    chapters::table
        .filter(chapters::id.eq_any(ids))
        .load(conn)
        .map_err(|e| SettleError::Internal(format!("Chapter query failed: {}", e)))
}

/// All approved, released chapters for a set of novels. These are the
/// chapters that participate in subscription word-count pools.
pub fn released_approved_for_novels(
    conn: &mut SqliteConnection,
    novel_ids: &[&str],
) -> Result<Vec<Chapter>, SettleError> {
    if novel_ids.is_empty() {
        return Ok(vec![]);
    }
    chapters::table
        .filter(chapters::novel_id.eq_any(novel_ids))
        .filter(chapters::review_status.eq(review_statuses::APPROVED))
        .filter(chapters::is_released.eq(1))
        .load(conn)
        .map_err(|e| SettleError::Internal(format!("Chapter pool query failed: {}", e)))
}
