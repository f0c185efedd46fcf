//! Request-scoped context for chapter-unlock attribution
//!
//! Resolves each unlock-type spending event's source id to its chapter and
//! the chapter's attributable staff and word count, in two batch queries.
//! Unresolvable unlock records or chapters are logged here; the allocator
//! skips their events and the batch continues.

use std::collections::HashMap;

use diesel::prelude::*;
use tracing::{debug, warn};

use crate::db::chapters;
use crate::db::models::{Chapter, SpendingEvent};
use crate::error::SettleError;

/// Staff and word-count context for one unlockable chapter
#[derive(Debug, Clone)]
pub struct ChapterInfo {
    pub chapter_id: String,
    pub novel_id: String,
    pub editor_id: Option<String>,
    pub chief_editor_id: Option<String>,
    pub effective_word_count: i64,
}

/// Resolved unlock-id -> chapter context for one batch of unlock events
#[derive(Debug, Default)]
pub struct UnlockContext {
    by_source: HashMap<String, ChapterInfo>,
}

impl UnlockContext {
    /// Batch-resolve the given unlock events' source ids to chapter context
    pub fn load(
        conn: &mut SqliteConnection,
        events: &[SpendingEvent],
    ) -> Result<Self, SettleError> {
        if events.is_empty() {
            return Ok(Self::default());
        }

        let source_ids: Vec<&str> = events.iter().map(|e| e.source_id.as_str()).collect();
        let unlocks = chapters::unlocks_by_ids(conn, &source_ids)?;
        let unlock_map: HashMap<&str, &str> = unlocks
            .iter()
            .map(|u| (u.id.as_str(), u.chapter_id.as_str()))
            .collect();

        for ev in events {
            if !unlock_map.contains_key(ev.source_id.as_str()) {
                warn!(
                    "Unlock record {} for spending event {} not found, event will be skipped",
                    ev.source_id, ev.id
                );
            }
        }

        let chapter_ids: Vec<&str> = unlock_map.values().copied().collect();
        let chapter_rows = chapters::chapters_by_ids(conn, &chapter_ids)?;
        let chapter_map: HashMap<&str, &Chapter> =
            chapter_rows.iter().map(|c| (c.id.as_str(), c)).collect();

        let mut by_source = HashMap::new();
        for unlock in &unlocks {
            match chapter_map.get(unlock.chapter_id.as_str()) {
                Some(ch) => {
                    by_source.insert(
                        unlock.id.clone(),
                        ChapterInfo {
                            chapter_id: ch.id.clone(),
                            novel_id: ch.novel_id.clone(),
                            editor_id: ch.editor_id.clone(),
                            chief_editor_id: ch.chief_editor_id.clone(),
                            effective_word_count: ch.effective_word_count(),
                        },
                    );
                }
                None => {
                    warn!(
                        "Chapter {} referenced by unlock {} not found, event will be skipped",
                        unlock.chapter_id, unlock.id
                    );
                }
            }
        }

        debug!(
            "Resolved {} of {} unlock events to chapters",
            by_source.len(),
            events.len()
        );
        Ok(Self { by_source })
    }

    /// Chapter context for an unlock source id, if it resolved
    pub fn chapter_for_unlock(&self, source_id: &str) -> Option<&ChapterInfo> {
        self.by_source.get(source_id)
    }

    /// Novels referenced by resolved unlock events
    pub fn novel_ids(&self) -> impl Iterator<Item = &str> {
        self.by_source.values().map(|c| c.novel_id.as_str())
    }

    #[cfg(test)]
    pub(crate) fn insert_for_test(&mut self, source_id: &str, info: ChapterInfo) {
        self.by_source.insert(source_id.to_string(), info);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::db::diesel_schema::{chapter_unlocks, chapters as chapters_table};
    use crate::db::models::{source_types, ChapterUnlock};

    fn event(id: &str, source_id: &str) -> SpendingEvent {
        SpendingEvent {
            id: id.to_string(),
            novel_id: "novel-1".to_string(),
            amount_usd: "10.00".to_string(),
            source_type: source_types::CHAPTER_UNLOCK.to_string(),
            source_id: source_id.to_string(),
            spend_time: "2025-11-01T00:00:00Z".to_string(),
            settlement_month: "2025-11-01".to_string(),
        }
    }

    fn seed(conn: &mut SqliteConnection) {
        diesel::insert_into(chapters_table::table)
            .values(&Chapter {
                id: "ch-1".to_string(),
                novel_id: "novel-1".to_string(),
                editor_id: Some("editor-a".to_string()),
                chief_editor_id: Some("chief-a".to_string()),
                review_status: "approved".to_string(),
                is_released: 1,
                word_count: Some(2500),
                body: None,
            })
            .execute(conn)
            .unwrap();
        diesel::insert_into(chapter_unlocks::table)
            .values(&[
                ChapterUnlock {
                    id: "unlock-1".to_string(),
                    chapter_id: "ch-1".to_string(),
                },
                ChapterUnlock {
                    id: "unlock-dangling".to_string(),
                    chapter_id: "ch-missing".to_string(),
                },
            ])
            .execute(conn)
            .unwrap();
    }

    #[test]
    fn resolves_unlocks_to_chapter_context() {
        let pool = db::open_in_memory().unwrap();
        let mut conn = db::get_conn(&pool).unwrap();
        seed(&mut conn);

        let ctx = UnlockContext::load(&mut conn, &[event("ev-1", "unlock-1")]).unwrap();
        let info = ctx.chapter_for_unlock("unlock-1").unwrap();
        assert_eq!(info.chapter_id, "ch-1");
        assert_eq!(info.novel_id, "novel-1");
        assert_eq!(info.editor_id.as_deref(), Some("editor-a"));
        assert_eq!(info.effective_word_count, 2500);
    }

    #[test]
    fn missing_unlock_and_chapter_leave_gaps_without_error() {
        let pool = db::open_in_memory().unwrap();
        let mut conn = db::get_conn(&pool).unwrap();
        seed(&mut conn);

        let ctx = UnlockContext::load(
            &mut conn,
            &[
                event("ev-1", "unlock-1"),
                event("ev-2", "unlock-missing"),
                event("ev-3", "unlock-dangling"),
            ],
        )
        .unwrap();

        assert!(ctx.chapter_for_unlock("unlock-1").is_some());
        assert!(ctx.chapter_for_unlock("unlock-missing").is_none());
        assert!(ctx.chapter_for_unlock("unlock-dangling").is_none());
        assert_eq!(ctx.novel_ids().count(), 1);
    }
}
