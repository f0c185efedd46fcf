//! Revenue allocation
//!
//! Pure functions from loaded context to settlement lines; no database
//! access. Skip/continue semantics are explicit in the per-record
//! `Allocation` outcome instead of being buried in error handling: a data
//! gap skips one event (or one role), never the run.

use std::collections::HashMap;
use std::fmt;

use rust_decimal::Decimal;
use tracing::warn;
use uuid::Uuid;

use crate::db::models::{current_timestamp, roles, source_types, SettlementLine, SpendingEvent};
use crate::settle::decimal::{money_string, percent_string, word_ratio};
use crate::settle::resolver::NovelContracts;
use crate::settle::subscription_pool::NovelPool;
use crate::settle::unlock_context::UnlockContext;

/// Outcome of allocating one spending event
#[derive(Debug)]
pub enum Allocation {
    /// Zero or more lines; a staff role without a contract simply emits none
    Lines(Vec<SettlementLine>),
    /// The whole event was skipped
    Skipped(SkipReason),
}

/// Why an event produced no allocation at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Unlock record or its chapter could not be resolved
    UnlockNotResolved,
    /// The event amount is not a valid decimal
    BadAmount,
    /// No pool was built for the event's novel
    NoPool,
    /// The novel's released word pool is zero
    EmptyPool,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            SkipReason::UnlockNotResolved => "unlock record or chapter could not be resolved",
            SkipReason::BadAmount => "amount is not a valid decimal",
            SkipReason::NoPool => "no word-count pool for novel",
            SkipReason::EmptyPool => "released word pool is zero",
        };
        write!(f, "{}", msg)
    }
}

/// Direct 1:1 (or 1:2) attribution for a chapter-unlock event. Each role is
/// gated independently by staff assignment and contract existence.
pub fn allocate_unlock(
    event: &SpendingEvent,
    ctx: &UnlockContext,
    contracts: &HashMap<String, NovelContracts>,
    month_key: &str,
) -> Allocation {
    let Some(chapter) = ctx.chapter_for_unlock(&event.source_id) else {
        return Allocation::Skipped(SkipReason::UnlockNotResolved);
    };
    let Ok(amount) = event.amount_usd.trim().parse::<Decimal>() else {
        return Allocation::Skipped(SkipReason::BadAmount);
    };

    let novel_contracts = contracts.get(&chapter.novel_id);
    let staff_by_role = [
        (roles::EDITOR, chapter.editor_id.as_deref()),
        (roles::CHIEF_EDITOR, chapter.chief_editor_id.as_deref()),
    ];

    let mut lines = Vec::with_capacity(2);
    for (role, staff) in staff_by_role {
        let Some(staff_id) = staff else { continue };
        let Some(contract) = novel_contracts.and_then(|c| c.for_role(role)) else {
            warn!(
                "Chapter {} has {} {} but novel {} has no active {} contract, no line emitted",
                chapter.chapter_id, role, staff_id, chapter.novel_id, role
            );
            continue;
        };

        let income = amount * contract.share_percent;
        lines.push(SettlementLine {
            id: Uuid::new_v4().to_string(),
            editor_id: staff_id.to_string(),
            role: role.to_string(),
            novel_id: chapter.novel_id.clone(),
            month: month_key.to_string(),
            source_spend_id: event.id.clone(),
            source_type: source_types::CHAPTER_UNLOCK.to_string(),
            chapter_id: Some(chapter.chapter_id.clone()),
            chapter_count_total: 1,
            chapter_count_editor: 1,
            total_word_count: chapter.effective_word_count,
            editor_word_count: chapter.effective_word_count,
            gross_income_usd: money_string(amount),
            editor_share_percent: percent_string(contract.share_percent),
            contract_share_percent: percent_string(contract.share_percent),
            editor_income_usd: money_string(income),
            created_at: current_timestamp(),
        });
    }
    Allocation::Lines(lines)
}

/// Word-count-weighted fan-out for a subscription event. One event can
/// produce many lines; each role fans out independently under its own
/// contract.
pub fn allocate_subscription(
    event: &SpendingEvent,
    pools: &HashMap<String, NovelPool>,
    contracts: &HashMap<String, NovelContracts>,
    month_key: &str,
) -> Allocation {
    let Some(pool) = pools.get(&event.novel_id) else {
        return Allocation::Skipped(SkipReason::NoPool);
    };
    if pool.total_word_count <= 0 {
        return Allocation::Skipped(SkipReason::EmptyPool);
    }
    let Ok(amount) = event.amount_usd.trim().parse::<Decimal>() else {
        return Allocation::Skipped(SkipReason::BadAmount);
    };

    let novel_contracts = contracts.get(&event.novel_id);
    let staff_by_role = [
        (roles::EDITOR, &pool.editors),
        (roles::CHIEF_EDITOR, &pool.chief_editors),
    ];

    let mut lines = Vec::new();
    for (role, staff_counts) in staff_by_role {
        if staff_counts.is_empty() {
            continue;
        }
        let Some(contract) = novel_contracts.and_then(|c| c.for_role(role)) else {
            warn!(
                "Novel {} has {} word counts but no active {} contract, no lines emitted",
                event.novel_id, role, role
            );
            continue;
        };

        for (staff_id, counts) in staff_counts {
            if counts.word_count <= 0 {
                continue;
            }
            let ratio = word_ratio(counts.word_count, pool.total_word_count);
            let effective_share = contract.share_percent * ratio;
            let income = amount * effective_share;

            lines.push(SettlementLine {
                id: Uuid::new_v4().to_string(),
                editor_id: staff_id.clone(),
                role: role.to_string(),
                novel_id: event.novel_id.clone(),
                month: month_key.to_string(),
                source_spend_id: event.id.clone(),
                source_type: source_types::SUBSCRIPTION.to_string(),
                chapter_id: None,
                chapter_count_total: pool.total_chapter_count,
                chapter_count_editor: counts.chapter_count,
                total_word_count: pool.total_word_count,
                editor_word_count: counts.word_count,
                gross_income_usd: money_string(amount),
                editor_share_percent: percent_string(effective_share),
                contract_share_percent: percent_string(contract.share_percent),
                editor_income_usd: money_string(income),
                created_at: current_timestamp(),
            });
        }
    }
    Allocation::Lines(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settle::resolver::ResolvedContract;
    use crate::settle::subscription_pool::StaffCounts;
    use crate::settle::unlock_context::ChapterInfo;

    const MONTH: &str = "2025-11-01";

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn event(id: &str, source_type: &str, source_id: &str, amount: &str) -> SpendingEvent {
        SpendingEvent {
            id: id.to_string(),
            novel_id: "novel-1".to_string(),
            amount_usd: amount.to_string(),
            source_type: source_type.to_string(),
            source_id: source_id.to_string(),
            spend_time: "2025-11-05T12:00:00Z".to_string(),
            settlement_month: MONTH.to_string(),
        }
    }

    fn unlock_ctx(editor: Option<&str>, chief: Option<&str>) -> UnlockContext {
        let mut ctx = UnlockContext::default();
        ctx.insert_for_test(
            "unlock-1",
            ChapterInfo {
                chapter_id: "ch-1".to_string(),
                novel_id: "novel-1".to_string(),
                editor_id: editor.map(str::to_string),
                chief_editor_id: chief.map(str::to_string),
                effective_word_count: 2500,
            },
        );
        ctx
    }

    fn contracts(editor_share: Option<&str>, chief_share: Option<&str>) -> HashMap<String, NovelContracts> {
        let mut map = HashMap::new();
        map.insert(
            "novel-1".to_string(),
            NovelContracts {
                editor: editor_share.map(|s| ResolvedContract {
                    contract_id: "c-ed".to_string(),
                    share_percent: dec(s),
                }),
                chief_editor: chief_share.map(|s| ResolvedContract {
                    contract_id: "c-chief".to_string(),
                    share_percent: dec(s),
                }),
            },
        );
        map
    }

    #[test]
    fn unlock_emits_one_line_per_contracted_role() {
        let ev = event("ev-1", source_types::CHAPTER_UNLOCK, "unlock-1", "10.00");
        let ctx = unlock_ctx(Some("editor-a"), Some("chief-a"));
        let contracts = contracts(Some("0.05"), Some("0.03"));

        let Allocation::Lines(lines) = allocate_unlock(&ev, &ctx, &contracts, MONTH) else {
            panic!("expected lines");
        };
        assert_eq!(lines.len(), 2);

        let editor_line = lines.iter().find(|l| l.role == roles::EDITOR).unwrap();
        assert_eq!(editor_line.editor_id, "editor-a");
        assert_eq!(editor_line.editor_income_usd, "0.500000");
        assert_eq!(editor_line.gross_income_usd, "10.000000");
        assert_eq!(editor_line.contract_share_percent, "0.0500");
        assert_eq!(editor_line.chapter_count_total, 1);
        assert_eq!(editor_line.chapter_id.as_deref(), Some("ch-1"));

        let chief_line = lines.iter().find(|l| l.role == roles::CHIEF_EDITOR).unwrap();
        assert_eq!(chief_line.editor_id, "chief-a");
        assert_eq!(chief_line.editor_income_usd, "0.300000");
    }

    #[test]
    fn unlock_roles_are_gated_independently() {
        let ev = event("ev-1", source_types::CHAPTER_UNLOCK, "unlock-1", "10.00");

        // Editor assigned but no editor contract; chief has both
        let ctx = unlock_ctx(Some("editor-a"), Some("chief-a"));
        let only_chief = contracts(None, Some("0.03"));
        let Allocation::Lines(lines) = allocate_unlock(&ev, &ctx, &only_chief, MONTH) else {
            panic!("expected lines");
        };
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].role, roles::CHIEF_EDITOR);

        // No chief assigned at all
        let ctx = unlock_ctx(Some("editor-a"), None);
        let both = contracts(Some("0.05"), Some("0.03"));
        let Allocation::Lines(lines) = allocate_unlock(&ev, &ctx, &both, MONTH) else {
            panic!("expected lines");
        };
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].role, roles::EDITOR);
    }

    #[test]
    fn unlock_skips_unresolved_and_bad_amount() {
        let ctx = unlock_ctx(Some("editor-a"), None);
        let contracts = contracts(Some("0.05"), None);

        let ev = event("ev-1", source_types::CHAPTER_UNLOCK, "unlock-missing", "10.00");
        assert!(matches!(
            allocate_unlock(&ev, &ctx, &contracts, MONTH),
            Allocation::Skipped(SkipReason::UnlockNotResolved)
        ));

        let ev = event("ev-2", source_types::CHAPTER_UNLOCK, "unlock-1", "ten");
        assert!(matches!(
            allocate_unlock(&ev, &ctx, &contracts, MONTH),
            Allocation::Skipped(SkipReason::BadAmount)
        ));
    }

    fn pool_two_editors() -> HashMap<String, NovelPool> {
        let mut editors = HashMap::new();
        editors.insert("editor-a".to_string(), StaffCounts { word_count: 3000, chapter_count: 1 });
        editors.insert("editor-b".to_string(), StaffCounts { word_count: 1000, chapter_count: 1 });
        let mut pools = HashMap::new();
        pools.insert(
            "novel-1".to_string(),
            NovelPool {
                total_word_count: 4000,
                total_chapter_count: 2,
                editors,
                chief_editors: HashMap::new(),
            },
        );
        pools
    }

    #[test]
    fn subscription_fans_out_by_word_ratio() {
        let ev = event("ev-1", source_types::SUBSCRIPTION, "sub-1", "100.00");
        let pools = pool_two_editors();
        let contracts = contracts(Some("0.10"), None);

        let Allocation::Lines(lines) = allocate_subscription(&ev, &pools, &contracts, MONTH)
        else {
            panic!("expected lines");
        };
        assert_eq!(lines.len(), 2);

        let line_a = lines.iter().find(|l| l.editor_id == "editor-a").unwrap();
        assert_eq!(line_a.editor_income_usd, "7.500000");
        assert_eq!(line_a.editor_share_percent, "0.0750");
        assert_eq!(line_a.contract_share_percent, "0.1000");
        assert_eq!(line_a.editor_word_count, 3000);
        assert_eq!(line_a.total_word_count, 4000);
        assert!(line_a.chapter_id.is_none());

        let line_b = lines.iter().find(|l| l.editor_id == "editor-b").unwrap();
        assert_eq!(line_b.editor_income_usd, "2.500000");

        // Conservation: editor-role lines sum to amount x contract share
        let total: Decimal = lines
            .iter()
            .map(|l| l.editor_income_usd.parse::<Decimal>().unwrap())
            .sum();
        assert_eq!(total, dec("10.00"));
    }

    #[test]
    fn subscription_zero_pool_skips_whole_event() {
        let ev = event("ev-1", source_types::SUBSCRIPTION, "sub-1", "100.00");
        let mut pools = HashMap::new();
        pools.insert("novel-1".to_string(), NovelPool::default());
        let contracts = contracts(Some("0.10"), None);

        assert!(matches!(
            allocate_subscription(&ev, &pools, &contracts, MONTH),
            Allocation::Skipped(SkipReason::EmptyPool)
        ));

        let no_pools: HashMap<String, NovelPool> = HashMap::new();
        assert!(matches!(
            allocate_subscription(&ev, &no_pools, &contracts, MONTH),
            Allocation::Skipped(SkipReason::NoPool)
        ));
    }

    #[test]
    fn subscription_without_contract_emits_nothing() {
        let ev = event("ev-1", source_types::SUBSCRIPTION, "sub-1", "100.00");
        let pools = pool_two_editors();
        let no_contracts: HashMap<String, NovelContracts> = HashMap::new();

        let Allocation::Lines(lines) = allocate_subscription(&ev, &pools, &no_contracts, MONTH)
        else {
            panic!("expected lines");
        };
        assert!(lines.is_empty(), "no contract means no lines, not an error");
    }
}
