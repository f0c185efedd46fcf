//! Settlement month identifier

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::SettleError;

/// A calendar settlement month, parsed from "YYYY-MM".
///
/// Internally pinned to the first day of the month, which doubles as the
/// month key stored on spending events and settlement lines ("YYYY-MM-01").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SettlementMonth(NaiveDate);

impl SettlementMonth {
    /// First day of the month, used for contract window checks
    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    /// Month key as stored in the database (YYYY-MM-01)
    pub fn key(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    /// Human-facing label (YYYY-MM)
    pub fn label(&self) -> String {
        self.0.format("%Y-%m").to_string()
    }
}

impl FromStr for SettlementMonth {
    type Err = SettleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.len() != 7 {
            return Err(SettleError::InvalidMonth(s.to_string()));
        }
        let date = NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d")
            .map_err(|_| SettleError::InvalidMonth(s.to_string()))?;
        Ok(Self(date))
    }
}

impl fmt::Display for SettlementMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_month() {
        let month: SettlementMonth = "2025-11".parse().unwrap();
        assert_eq!(month.key(), "2025-11-01");
        assert_eq!(month.label(), "2025-11");
        assert_eq!(month.first_day(), NaiveDate::from_ymd_opt(2025, 11, 1).unwrap());
    }

    #[test]
    fn rejects_malformed_input() {
        assert!("2025-13".parse::<SettlementMonth>().is_err());
        assert!("2025-00".parse::<SettlementMonth>().is_err());
        assert!("2025-1".parse::<SettlementMonth>().is_err());
        assert!("2025-11-01".parse::<SettlementMonth>().is_err());
        assert!("november".parse::<SettlementMonth>().is_err());
        assert!("".parse::<SettlementMonth>().is_err());
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let month: SettlementMonth = " 2025-11 ".parse().unwrap();
        assert_eq!(month.label(), "2025-11");
    }
}
