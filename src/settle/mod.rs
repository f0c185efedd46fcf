//! Settlement pipeline
//!
//! One idempotent "recompute this month" operation: read the month's
//! spending, resolve chapter and contract context, allocate revenue shares,
//! and replace the month's settlement lines atomically. Per-record data gaps
//! are demoted to warn-and-skip; only pool or transaction failures abort the
//! run.

pub mod allocate;
pub mod decimal;
pub mod month;
pub mod resolver;
pub mod subscription_pool;
pub mod unlock_context;

use std::collections::BTreeSet;

use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::{self, settlement_lines, spending, DbPool};
use crate::error::SettleError;
use self::allocate::{allocate_subscription, allocate_unlock, Allocation};
use self::month::SettlementMonth;
use self::unlock_context::UnlockContext;

/// Summary returned by a full-month recompute
#[derive(Debug, Clone, Serialize)]
pub struct MonthSummary {
    pub month: String,
    pub total_spending_events: usize,
    pub total_editor_income_usd: Decimal,
    pub records_inserted: usize,
    pub unlock_lines: usize,
    pub subscription_lines: usize,
    pub skipped_events: usize,
}

/// The settlement engine: owns the pool and recomputes whole months.
///
/// Each invocation is one sequential logical operation. Concurrent runs for
/// the same month race on delete-then-insert and must be serialized by the
/// caller; runs for different months are independent.
pub struct SettlementEngine {
    pool: DbPool,
    insert_batch_size: usize,
}

impl SettlementEngine {
    pub fn new(pool: DbPool, config: &Config) -> Self {
        Self {
            pool,
            insert_batch_size: config.insert_batch_size,
        }
    }

    /// Recompute one settlement month ("YYYY-MM"), fully replacing its
    /// settlement lines. Safe to rerun after upstream corrections.
    pub fn recompute_month(&self, month: &str) -> Result<MonthSummary, SettleError> {
        // Rejected before any destructive step
        let month: SettlementMonth = month.parse()?;

        let mut conn = db::get_conn(&self.pool)?;
        info!("Recomputing settlement for {}", month);

        let summary = conn.transaction::<MonthSummary, SettleError, _>(|conn| {
            self.recompute_in_tx(conn, &month)
        })?;

        info!(
            "Settlement for {} complete: {} lines from {} events ({} skipped), total editor income {}",
            summary.month,
            summary.records_inserted,
            summary.total_spending_events,
            summary.skipped_events,
            summary.total_editor_income_usd
        );
        Ok(summary)
    }

    fn recompute_in_tx(
        &self,
        conn: &mut SqliteConnection,
        month: &SettlementMonth,
    ) -> Result<MonthSummary, SettleError> {
        let spending = spending::load_month_events(conn, month)?;

        let unlock_ctx = UnlockContext::load(conn, &spending.unlocks)?;

        let sub_novels: BTreeSet<&str> = spending
            .subscriptions
            .iter()
            .map(|e| e.novel_id.as_str())
            .collect();
        let sub_novel_ids: Vec<&str> = sub_novels.iter().copied().collect();
        let pools = subscription_pool::load_pools(conn, &sub_novel_ids)?;

        let contract_novels: BTreeSet<&str> =
            unlock_ctx.novel_ids().chain(sub_novels.iter().copied()).collect();
        let contract_novel_ids: Vec<&str> = contract_novels.into_iter().collect();
        let contracts = resolver::resolve_contracts(conn, &contract_novel_ids, month.first_day())?;

        let month_key = month.key();
        let mut lines = Vec::new();
        let mut unlock_lines = 0usize;
        let mut subscription_lines = 0usize;
        let mut skipped_events = 0usize;
        let mut total_income = Decimal::ZERO;

        for ev in &spending.unlocks {
            match allocate_unlock(ev, &unlock_ctx, &contracts, &month_key) {
                Allocation::Lines(batch) => {
                    unlock_lines += batch.len();
                    total_income += summed_income(&batch)?;
                    lines.extend(batch);
                }
                Allocation::Skipped(reason) => {
                    warn!("Skipped chapter-unlock event {}: {}", ev.id, reason);
                    skipped_events += 1;
                }
            }
        }

        for ev in &spending.subscriptions {
            match allocate_subscription(ev, &pools, &contracts, &month_key) {
                Allocation::Lines(batch) => {
                    subscription_lines += batch.len();
                    total_income += summed_income(&batch)?;
                    lines.extend(batch);
                }
                Allocation::Skipped(reason) => {
                    warn!(
                        "Skipped subscription event {} for novel {}: {}",
                        ev.id, ev.novel_id, reason
                    );
                    skipped_events += 1;
                }
            }
        }

        // The replacement runs even when the month has no lines, so a month
        // whose events were retracted upstream ends up empty after a rerun.
        let records_inserted =
            settlement_lines::replace_month(conn, &month_key, &lines, self.insert_batch_size)?;

        Ok(MonthSummary {
            month: month.label(),
            total_spending_events: spending.total(),
            total_editor_income_usd: total_income,
            records_inserted,
            unlock_lines,
            subscription_lines,
            skipped_events,
        })
    }
}

/// Sum the as-persisted incomes so the summary matches the stored rows
fn summed_income(batch: &[crate::db::models::SettlementLine]) -> Result<Decimal, SettleError> {
    let mut total = Decimal::ZERO;
    for line in batch {
        total += decimal::parse_decimal(&line.editor_income_usd, "editor_income_usd")?;
    }
    Ok(total)
}
