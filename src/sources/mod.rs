//! Roster sources
//!
//! A roster source turns an external table into typed [`RosterRecord`]s.
//! The production source reads the first worksheet of a spreadsheet
//! workbook; anything implementing [`RosterSource`] can stand in for it.
//!
//! [`RosterRecord`]: crate::models::RosterRecord

pub mod spreadsheet;
pub mod traits;

pub use spreadsheet::{ColumnMapping, SpreadsheetRosterSource, records_from_rows};
pub use traits::RosterSource;
