//! royalty-settle - Monthly editorial revenue-share settlement engine
//!
//! Computes and persists, for one calendar month, how reader payments on a
//! serialized-fiction platform are shared with the editorial staff (editors
//! and chief editors) who worked on each title.
//!
//! ## Inputs and output
//!
//! - **Spending ledger** (read-only): one row per reader payment, tagged
//!   with its settlement month and source type (chapter unlock or
//!   subscription)
//! - **Unlock, chapter and contract records** (read-only): owned by the
//!   rest of the publishing system
//! - **Settlement lines** (output): one row per (spending event, staff
//!   member) with a nonzero allocation, fully replaced per month
//!
//! ## Pipeline
//!
//! spending reader -> context loaders (chapter unlock, subscription pool)
//! -> contract resolver -> allocators -> persister, all inside one SQLite
//! transaction per month.
//!
//! Reruns are idempotent: each recompute purges the month's lines and
//! regenerates them from current source data, so the engine is safely
//! repeatable after upstream corrections. Money is exact decimal end to
//! end; settlement values serialize as fixed-point TEXT.

pub mod config;
pub mod db;
pub mod error;
pub mod settle;

pub use config::Config;
pub use db::{DbConn, DbPool};
pub use error::SettleError;
pub use settle::month::SettlementMonth;
pub use settle::{MonthSummary, SettlementEngine};
