//! Spreadsheet-backed roster source
//!
//! Reads the first worksheet of an `.xlsx`/`.xls`/`.ods` workbook. The first
//! row is the header; every later row becomes one record. Cells are coerced
//! to strings. Header matching goes through [`normalize`], so "Team  name"
//! in the workbook matches a configured "Team Name".

use async_trait::async_trait;
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::RosterSource;
use crate::config::defaults::{
    DEFAULT_ORGANIZATION_COLUMN, DEFAULT_PARTICIPANT_COLUMN, DEFAULT_TEAM_COLUMN,
};
use crate::errors::{RosterError, RosterResult};
use crate::models::RosterRecord;
use crate::utils::{is_blank, normalize};

/// Header names of the columns the roster needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub participant: String,
    pub team: String,
    /// Optional; when configured but absent from the header, records carry
    /// no organization
    pub organization: Option<String>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            participant: DEFAULT_PARTICIPANT_COLUMN.to_string(),
            team: DEFAULT_TEAM_COLUMN.to_string(),
            organization: Some(DEFAULT_ORGANIZATION_COLUMN.to_string()),
        }
    }
}

/// Resolved header positions
struct ColumnIndices {
    participant: usize,
    team: usize,
    organization: Option<usize>,
}

impl ColumnIndices {
    fn resolve(header: &[String], columns: &ColumnMapping) -> RosterResult<Self> {
        let find = |name: &str| {
            let wanted = normalize(name);
            header.iter().position(|cell| normalize(cell) == wanted)
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| RosterError::MissingColumn {
                column: name.to_string(),
            })
        };

        let organization = match &columns.organization {
            Some(name) => {
                let index = find(name);
                if index.is_none() {
                    warn!(column = %name, "Organization column not present in roster header");
                }
                index
            }
            None => None,
        };

        Ok(Self {
            participant: require(&columns.participant)?,
            team: require(&columns.team)?,
            organization,
        })
    }

    fn is_known(&self, index: usize) -> bool {
        index == self.participant || index == self.team || Some(index) == self.organization
    }
}

/// Build records from a header row followed by data rows
///
/// Fully blank rows are skipped. Rows with a blank participant or team name
/// are skipped with a warning. Columns other than the mapped ones are kept
/// in [`RosterRecord::extra`] under their trimmed header text.
pub fn records_from_rows<I>(rows: I, columns: &ColumnMapping) -> RosterResult<Vec<RosterRecord>>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut rows = rows.into_iter();
    let header = rows.next().unwrap_or_default();
    let indices = ColumnIndices::resolve(&header, columns)?;

    let cell = |row: &[String], index: usize| row.get(index).cloned().unwrap_or_default();

    let mut records = Vec::new();
    for (offset, row) in rows.enumerate() {
        // Row numbers as shown by spreadsheet software (header is row 1)
        let row_number = offset + 2;

        if row.iter().all(|value| is_blank(value)) {
            continue;
        }

        let participant_name = cell(&row, indices.participant);
        let team_name = cell(&row, indices.team);
        if is_blank(&participant_name) || is_blank(&team_name) {
            warn!(row = row_number, "Skipping roster row without participant or team name");
            continue;
        }

        let organization_name = indices
            .organization
            .map(|index| cell(&row, index))
            .filter(|value| !is_blank(value));

        let extra: BTreeMap<String, String> = header
            .iter()
            .enumerate()
            .filter(|(index, name)| !indices.is_known(*index) && !is_blank(name))
            .map(|(index, name)| (name.trim().to_string(), cell(&row, index)))
            .collect();

        records.push(RosterRecord {
            participant_name,
            team_name,
            organization_name,
            extra,
        });
    }

    Ok(records)
}

/// String form of a spreadsheet cell
///
/// Whole-number floats lose their trailing ".0" so numeric team names
/// compare the way they read in the sheet.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(value) => value.clone(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        other => other.to_string(),
    }
}

fn parse_workbook(
    bytes: Vec<u8>,
    path: &str,
    columns: &ColumnMapping,
) -> RosterResult<Vec<RosterRecord>> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| RosterError::parse(path, e))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| RosterError::NoWorksheet {
            path: path.to_string(),
        })?
        .map_err(|e| RosterError::parse(path, e))?;

    debug!(path, rows = range.height(), columns = range.width(), "Parsed roster worksheet");

    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>());
    records_from_rows(rows, columns)
}

/// Roster source backed by a workbook on disk
#[derive(Debug, Clone)]
pub struct SpreadsheetRosterSource {
    path: PathBuf,
    columns: ColumnMapping,
}

impl SpreadsheetRosterSource {
    pub fn new<P: Into<PathBuf>>(path: P, columns: ColumnMapping) -> Self {
        Self {
            path: path.into(),
            columns,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RosterSource for SpreadsheetRosterSource {
    async fn load(&self) -> RosterResult<Vec<RosterRecord>> {
        let path = self.path.display().to_string();
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| RosterError::io(&path, e))?;

        let columns = self.columns.clone();
        let worker_path = path.clone();
        let records =
            tokio::task::spawn_blocking(move || parse_workbook(bytes, &worker_path, &columns))
                .await
                .map_err(|e| RosterError::ReloadAborted {
                    message: e.to_string(),
                })??;

        info!(path = %path, records = records.len(), "Loaded roster from workbook");
        Ok(records)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
