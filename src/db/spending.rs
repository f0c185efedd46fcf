//! Spending ledger reads
//!
//! The spending ledger is captured by the payment pipeline and is read-only
//! here. One month's settleable events are loaded in time order and split by
//! source type. An empty month is a valid result, not an error.

use diesel::prelude::*;
use tracing::{debug, warn};

use super::diesel_schema::spending_events;
use super::models::{source_types, SpendingEvent};
use crate::error::SettleError;
use crate::settle::month::SettlementMonth;

/// One month of settleable spending, split by source type
#[derive(Debug, Default)]
pub struct MonthSpending {
    pub unlocks: Vec<SpendingEvent>,
    pub subscriptions: Vec<SpendingEvent>,
}

impl MonthSpending {
    pub fn total(&self) -> usize {
        self.unlocks.len() + self.subscriptions.len()
    }
}

/// Load all spending events for the given settlement month
pub fn load_month_events(
    conn: &mut SqliteConnection,
    month: &SettlementMonth,
) -> Result<MonthSpending, SettleError> {
    let rows: Vec<SpendingEvent> = spending_events::table
        .filter(spending_events::settlement_month.eq(month.key()))
        .order(spending_events::spend_time.asc())
        .load(conn)
        .map_err(|e| SettleError::Internal(format!("Spending query failed: {}", e)))?;

    let mut split = MonthSpending::default();
    for ev in rows {
        if ev.source_type == source_types::CHAPTER_UNLOCK {
            split.unlocks.push(ev);
        } else if ev.source_type == source_types::SUBSCRIPTION {
            split.subscriptions.push(ev);
        } else {
            warn!(
                "Spending event {} has unknown source type '{}', skipping",
                ev.id, ev.source_type
            );
        }
    }

    debug!(
        "Loaded {} unlock and {} subscription events for {}",
        split.unlocks.len(),
        split.subscriptions.len(),
        month
    );
    Ok(split)
}
