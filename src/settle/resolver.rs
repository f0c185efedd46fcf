//! Contract resolution for a settlement month
//!
//! Per novel, finds the one active percent-of-book contract per role whose
//! [start_date, end_date] window covers the month's first day. Ties are
//! broken by the most recently started contract. The contract's share
//! applies to every staff member in that role for the novel; the staff on a
//! settlement line always comes from the chapter or pool, not from the
//! contract row.

use std::collections::HashMap;

use chrono::NaiveDate;
use diesel::prelude::*;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::db::contracts;
use crate::db::models::roles;
use crate::error::SettleError;
use crate::settle::decimal::parse_decimal;

/// A window-matching contract with its share parsed for arithmetic
#[derive(Debug, Clone)]
pub struct ResolvedContract {
    pub contract_id: String,
    pub share_percent: Decimal,
}

/// Per-novel winning contract per role
#[derive(Debug, Clone, Default)]
pub struct NovelContracts {
    pub editor: Option<ResolvedContract>,
    pub chief_editor: Option<ResolvedContract>,
}

impl NovelContracts {
    pub fn for_role(&self, role: &str) -> Option<&ResolvedContract> {
        match role {
            roles::EDITOR => self.editor.as_ref(),
            roles::CHIEF_EDITOR => self.chief_editor.as_ref(),
            _ => None,
        }
    }
}

/// Resolve contracts for the given novels on the settlement month's first day
pub fn resolve_contracts(
    conn: &mut SqliteConnection,
    novel_ids: &[&str],
    day: NaiveDate,
) -> Result<HashMap<String, NovelContracts>, SettleError> {
    if novel_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let day_str = day.format("%Y-%m-%d").to_string();
    let candidates = contracts::active_started_by(conn, novel_ids, &day_str)?;

    // Candidates arrive most-recently-started first, so the first window
    // match per (novel, role) wins ties.
    let mut resolved: HashMap<String, NovelContracts> = HashMap::new();
    for c in &candidates {
        if let Some(end) = &c.end_date {
            if end.as_str() < day_str.as_str() {
                continue;
            }
        }

        let share = match parse_decimal(&c.share_percent, "share_percent") {
            Ok(v) => v,
            Err(_) => {
                warn!(
                    "Contract {} has unparseable share percent '{}', ignoring",
                    c.id, c.share_percent
                );
                continue;
            }
        };

        let entry = resolved.entry(c.novel_id.clone()).or_default();
        let slot = match c.role.as_str() {
            roles::EDITOR => &mut entry.editor,
            roles::CHIEF_EDITOR => &mut entry.chief_editor,
            other => {
                warn!("Contract {} has unknown role '{}', ignoring", c.id, other);
                continue;
            }
        };
        if slot.is_none() {
            debug!(
                "Novel {} {} contract {} (share {})",
                c.novel_id, c.role, c.id, share
            );
            *slot = Some(ResolvedContract {
                contract_id: c.id.clone(),
                share_percent: share,
            });
        }
    }

    Ok(resolved)
}
