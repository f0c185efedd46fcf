//! Contract queries
//!
//! Loads the active percent-of-book contracts that could apply to a
//! settlement month. Dates are ISO-8601 TEXT, so string comparison matches
//! date order. The end-date side of the validity window and the per-role
//! tie-break are applied by `settle::resolver`.

use diesel::prelude::*;

use super::diesel_schema::contracts;
use super::models::{contract_statuses, share_types, Contract};
use crate::error::SettleError;

/// Active percent-of-book contracts for the given novels that started on or
/// before `day`, most recently started first.
pub fn active_started_by(
    conn: &mut SqliteConnection,
    novel_ids: &[&str],
    day: &str,
) -> Result<Vec<Contract>, SettleError> {
    if novel_ids.is_empty() {
        return Ok(vec![]);
    }
    contracts::table
        .filter(contracts::novel_id.eq_any(novel_ids))
        .filter(contracts::share_type.eq(share_types::PERCENT_OF_BOOK))
        .filter(contracts::status.eq(contract_statuses::ACTIVE))
        .filter(contracts::start_date.le(day))
        .order(contracts::start_date.desc())
        .load(conn)
        .map_err(|e| SettleError::Internal(format!("Contract query failed: {}", e)))
}
