//! Roster source trait definitions

use async_trait::async_trait;

use crate::errors::RosterResult;
use crate::models::RosterRecord;

/// External tabular source of roster records
///
/// Implementations read the whole table on every call and return records in
/// table order. They hold no cache of their own; freshness is the
/// [`RosterCache`](crate::services::RosterCache)'s job.
#[async_trait]
pub trait RosterSource: Send + Sync {
    /// Read every record from the source
    async fn load(&self) -> RosterResult<Vec<RosterRecord>>;

    /// Human-readable location, used in logs
    fn describe(&self) -> String;
}
