//! Roster records and immutable snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::utils::normalize;

/// One row of the external roster
///
/// The three known columns are typed; every other column is carried
/// through untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRecord {
    pub participant_name: String,
    pub team_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl RosterRecord {
    pub fn new<P: Into<String>, T: Into<String>>(participant_name: P, team_name: T) -> Self {
        Self {
            participant_name: participant_name.into(),
            team_name: team_name.into(),
            organization_name: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_organization<O: Into<String>>(mut self, organization_name: O) -> Self {
        self.organization_name = Some(organization_name.into());
        self
    }

    pub fn with_extra<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Whether this record matches an already-normalized (participant, team) pair
    ///
    /// Both fields must match; a participant-only match is not a match.
    pub fn matches_normalized(&self, participant: &str, team: &str) -> bool {
        normalize(&self.participant_name) == participant && normalize(&self.team_name) == team
    }
}

/// Point-in-time copy of the roster
///
/// Never mutated after construction; a refresh builds a new snapshot and
/// swaps the shared reference.
#[derive(Debug, Clone, Serialize)]
pub struct RosterSnapshot {
    records: Vec<RosterRecord>,
    loaded_at: DateTime<Utc>,
}

impl RosterSnapshot {
    pub fn new(records: Vec<RosterRecord>, loaded_at: DateTime<Utc>) -> Self {
        Self { records, loaded_at }
    }

    pub fn records(&self) -> &[RosterRecord] {
        &self.records
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record, in table order, whose normalized participant and team
    /// names equal the normalized inputs
    pub fn find(&self, participant_name: &str, team_name: &str) -> Option<&RosterRecord> {
        let participant = normalize(participant_name);
        let team = normalize(team_name);
        self.records
            .iter()
            .find(|record| record.matches_normalized(&participant, &team))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(records: Vec<RosterRecord>) -> RosterSnapshot {
        RosterSnapshot::new(records, Utc::now())
    }

    #[test]
    fn test_find_normalizes_both_sides() {
        let roster = snapshot(vec![RosterRecord::new("  Jane  DOE", "Team Alpha ")]);
        let found = roster.find("jane   doe", "TEAM alpha");
        assert_eq!(found.map(|r| r.participant_name.as_str()), Some("  Jane  DOE"));
    }

    #[test]
    fn test_find_requires_both_fields() {
        let roster = snapshot(vec![
            RosterRecord::new("Jane Doe", "Team Alpha"),
            RosterRecord::new("John Roe", "Team Beta"),
        ]);
        assert!(roster.find("Jane Doe", "Team Beta").is_none());
        assert!(roster.find("John Roe", "Team Alpha").is_none());
        assert!(roster.find("Jane Doe", "").is_none());
    }

    #[test]
    fn test_find_returns_first_in_table_order() {
        let roster = snapshot(vec![
            RosterRecord::new("Jane Doe", "Team Alpha").with_organization("First College"),
            RosterRecord::new("JANE DOE", "team alpha").with_organization("Second College"),
        ]);
        let found = roster.find("jane doe", "team alpha").unwrap();
        assert_eq!(found.organization_name.as_deref(), Some("First College"));
    }

    #[test]
    fn test_empty_snapshot_finds_nothing() {
        let roster = snapshot(Vec::new());
        assert!(roster.is_empty());
        assert!(roster.find("Jane Doe", "Team Alpha").is_none());
    }

    #[test]
    fn test_record_serialization_skips_empty_fields() {
        let record = RosterRecord::new("Jane Doe", "Team Alpha");
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("organization_name").is_none());
        assert!(json.get("extra").is_none());

        let record = record.with_extra("Email", "jane@example.com");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["extra"]["Email"], "jane@example.com");
    }
}
