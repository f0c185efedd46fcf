//! Fixed-precision decimal helpers
//!
//! Money and share percentages are `rust_decimal` values end to end; SQLite
//! stores them as fixed-point TEXT (currency at 6 decimal places, percentages
//! at 4) so repeated recomputation never drifts. Binary floating point never
//! touches money.

use rust_decimal::Decimal;

use crate::error::SettleError;

/// Decimal places for serialized currency values
pub const MONEY_SCALE: u32 = 6;
/// Decimal places for serialized share percentages
pub const PERCENT_SCALE: u32 = 4;

/// Parse a decimal TEXT column value
pub fn parse_decimal(raw: &str, what: &str) -> Result<Decimal, SettleError> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|e| SettleError::InvalidInput(format!("Bad {} value '{}': {}", what, raw, e)))
}

/// Serialize a currency value at fixed 6 decimal places
pub fn money_string(value: Decimal) -> String {
    format!("{:.prec$}", value.round_dp(MONEY_SCALE), prec = MONEY_SCALE as usize)
}

/// Serialize a share percentage at fixed 4 decimal places
pub fn percent_string(value: Decimal) -> String {
    format!("{:.prec$}", value.round_dp(PERCENT_SCALE), prec = PERCENT_SCALE as usize)
}

/// Word-count ratio as an exact decimal; zero when the pool is empty
pub fn word_ratio(editor_words: i64, total_words: i64) -> Decimal {
    if total_words <= 0 {
        return Decimal::ZERO;
    }
    Decimal::from(editor_words) / Decimal::from(total_words)
}
