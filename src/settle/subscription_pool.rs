//! Per-novel word-count pools for subscription fan-out
//!
//! For each novel with subscription spending, aggregates its approved and
//! released chapters into a total word count plus per-staff word and chapter
//! counts. A chapter with no assigned staff still counts toward the totals,
//! diluting everyone's ratio, but appears in no per-staff map.

use std::collections::HashMap;

use diesel::prelude::*;
use tracing::debug;

use crate::db::chapters;
use crate::error::SettleError;

/// Word/chapter tallies for one staff member within a novel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaffCounts {
    pub word_count: i64,
    pub chapter_count: i64,
}

/// Aggregated approved/released chapter counts for one novel
#[derive(Debug, Clone, Default)]
pub struct NovelPool {
    pub total_word_count: i64,
    pub total_chapter_count: i64,
    pub editors: HashMap<String, StaffCounts>,
    pub chief_editors: HashMap<String, StaffCounts>,
}

/// Build pools for every novel in `novel_ids`. Novels with no approved,
/// released chapters get an empty pool, which the allocator treats as a
/// zero-pool skip.
pub fn load_pools(
    conn: &mut SqliteConnection,
    novel_ids: &[&str],
) -> Result<HashMap<String, NovelPool>, SettleError> {
    if novel_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = chapters::released_approved_for_novels(conn, novel_ids)?;

    let mut pools: HashMap<String, NovelPool> = HashMap::new();
    for ch in &rows {
        let words = ch.effective_word_count();
        let pool = pools.entry(ch.novel_id.clone()).or_default();
        pool.total_word_count += words;
        pool.total_chapter_count += 1;

        if let Some(editor) = ch.editor_id.as_deref().filter(|s| !s.is_empty()) {
            let counts = pool.editors.entry(editor.to_string()).or_default();
            counts.word_count += words;
            counts.chapter_count += 1;
        }
        if let Some(chief) = ch.chief_editor_id.as_deref().filter(|s| !s.is_empty()) {
            let counts = pool.chief_editors.entry(chief.to_string()).or_default();
            counts.word_count += words;
            counts.chapter_count += 1;
        }
    }

    for id in novel_ids {
        pools.entry((*id).to_string()).or_default();
    }

    debug!("Built subscription pools for {} novels", pools.len());
    Ok(pools)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::db::diesel_schema::chapters as chapters_table;
    use crate::db::models::Chapter;

    fn seed_chapter(
        conn: &mut SqliteConnection,
        id: &str,
        editor: Option<&str>,
        chief: Option<&str>,
        words: i64,
    ) {
        diesel::insert_into(chapters_table::table)
            .values(&Chapter {
                id: id.to_string(),
                novel_id: "novel-1".to_string(),
                editor_id: editor.map(str::to_string),
                chief_editor_id: chief.map(str::to_string),
                review_status: "approved".to_string(),
                is_released: 1,
                word_count: Some(words),
                body: None,
            })
            .execute(conn)
            .unwrap();
    }

    #[test]
    fn aggregates_per_staff_and_totals() {
        let pool = db::open_in_memory().unwrap();
        let mut conn = db::get_conn(&pool).unwrap();

        seed_chapter(&mut conn, "ch-1", Some("editor-a"), Some("chief-a"), 3000);
        seed_chapter(&mut conn, "ch-2", Some("editor-b"), Some("chief-a"), 1000);

        let pools = load_pools(&mut conn, &["novel-1"]).unwrap();
        let novel = &pools["novel-1"];

        assert_eq!(novel.total_word_count, 4000);
        assert_eq!(novel.total_chapter_count, 2);
        assert_eq!(novel.editors["editor-a"].word_count, 3000);
        assert_eq!(novel.editors["editor-b"].word_count, 1000);
        assert_eq!(novel.chief_editors["chief-a"].word_count, 4000);
        assert_eq!(novel.chief_editors["chief-a"].chapter_count, 2);
    }

    #[test]
    fn unassigned_chapter_dilutes_ratios() {
        let pool = db::open_in_memory().unwrap();
        let mut conn = db::get_conn(&pool).unwrap();

        seed_chapter(&mut conn, "ch-1", Some("editor-a"), None, 3000);
        seed_chapter(&mut conn, "ch-2", None, None, 1000);

        let pools = load_pools(&mut conn, &["novel-1"]).unwrap();
        let novel = &pools["novel-1"];

        assert_eq!(novel.total_word_count, 4000, "unassigned words count toward the total");
        assert_eq!(novel.editors.len(), 1);
        assert_eq!(novel.editors["editor-a"].word_count, 3000);
        assert!(novel.chief_editors.is_empty());
    }

    #[test]
    fn novel_without_chapters_gets_empty_pool() {
        let pool = db::open_in_memory().unwrap();
        let mut conn = db::get_conn(&pool).unwrap();

        let pools = load_pools(&mut conn, &["novel-ghost"]).unwrap();
        assert_eq!(pools["novel-ghost"].total_word_count, 0);
    }
}
