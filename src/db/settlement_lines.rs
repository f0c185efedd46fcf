//! Settlement line persistence
//!
//! The month's lines are replaced atomically: delete everything for the
//! month key, then insert the new lines in bounded batches, all inside one
//! transaction. Any failure rolls the whole replacement back and leaves the
//! prior month data untouched.

use diesel::prelude::*;
use tracing::debug;

use super::diesel_schema::settlement_lines;
use super::models::SettlementLine;
use crate::error::SettleError;

/// Replace all settlement lines for a month. Returns the number of rows
/// inserted. `batch_size` bounds the rows per INSERT statement.
pub fn replace_month(
    conn: &mut SqliteConnection,
    month_key: &str,
    lines: &[SettlementLine],
    batch_size: usize,
) -> Result<usize, SettleError> {
    let batch = batch_size.max(1);

    conn.transaction::<usize, SettleError, _>(|conn| {
        let deleted =
            diesel::delete(settlement_lines::table.filter(settlement_lines::month.eq(month_key)))
                .execute(conn)
                .map_err(|e| {
                    SettleError::Internal(format!("Failed to purge month {}: {}", month_key, e))
                })?;
        debug!("Purged {} prior settlement lines for {}", deleted, month_key);

        let mut inserted = 0usize;
        for chunk in lines.chunks(batch) {
            inserted += diesel::insert_into(settlement_lines::table)
                .values(chunk)
                .execute(conn)
                .map_err(|e| {
                    SettleError::Internal(format!("Failed to insert settlement lines: {}", e))
                })?;
        }
        Ok(inserted)
    })
}

/// Load a month's settlement lines in a deterministic order
pub fn lines_for_month(
    conn: &mut SqliteConnection,
    month_key: &str,
) -> Result<Vec<SettlementLine>, SettleError> {
    settlement_lines::table
        .filter(settlement_lines::month.eq(month_key))
        .order((
            settlement_lines::source_spend_id.asc(),
            settlement_lines::role.asc(),
            settlement_lines::editor_id.asc(),
        ))
        .load(conn)
        .map_err(|e| SettleError::Internal(format!("Settlement line query failed: {}", e)))
}

/// Delete a single line by id
pub fn delete_line(conn: &mut SqliteConnection, id: &str) -> Result<(), SettleError> {
    let deleted = diesel::delete(settlement_lines::table.filter(settlement_lines::id.eq(id)))
        .execute(conn)
        .map_err(|e| SettleError::Internal(format!("Failed to delete line: {}", e)))?;

    if deleted == 0 {
        return Err(SettleError::NotFound(id.to_string()));
    }
    Ok(())
}
