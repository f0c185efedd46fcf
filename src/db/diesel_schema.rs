// Table definitions for the settlement database.
//
// Source tables (spending_events, chapter_unlocks, chapters, contracts) are
// owned by other parts of the publishing system and are read-only here.
// settlement_lines is the only table this engine writes.

diesel::table! {
    spending_events (id) {
        id -> Text,
        novel_id -> Text,
        amount_usd -> Text,
        source_type -> Text,
        source_id -> Text,
        spend_time -> Text,
        settlement_month -> Text,
    }
}

diesel::table! {
    chapter_unlocks (id) {
        id -> Text,
        chapter_id -> Text,
    }
}

diesel::table! {
    chapters (id) {
        id -> Text,
        novel_id -> Text,
        editor_id -> Nullable<Text>,
        chief_editor_id -> Nullable<Text>,
        review_status -> Text,
        is_released -> Integer,
        word_count -> Nullable<BigInt>,
        body -> Nullable<Text>,
    }
}

diesel::table! {
    contracts (id) {
        id -> Text,
        novel_id -> Text,
        editor_id -> Text,
        role -> Text,
        share_type -> Text,
        share_percent -> Text,
        status -> Text,
        start_date -> Text,
        end_date -> Nullable<Text>,
        start_chapter_id -> Nullable<Text>,
        end_chapter_id -> Nullable<Text>,
    }
}

diesel::table! {
    settlement_lines (id) {
        id -> Text,
        editor_id -> Text,
        role -> Text,
        novel_id -> Text,
        month -> Text,
        source_spend_id -> Text,
        source_type -> Text,
        chapter_id -> Nullable<Text>,
        chapter_count_total -> BigInt,
        chapter_count_editor -> BigInt,
        total_word_count -> BigInt,
        editor_word_count -> BigInt,
        gross_income_usd -> Text,
        editor_share_percent -> Text,
        contract_share_percent -> Text,
        editor_income_usd -> Text,
        created_at -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    spending_events,
    chapter_unlocks,
    chapters,
    contracts,
    settlement_lines,
);
