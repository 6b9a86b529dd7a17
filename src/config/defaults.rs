//! Configuration default values
//!
//! Layout geometry defaults live next to the layout engine in
//! `crate::layout`; this module covers file locations and roster behaviour.
use std::time::Duration;

// Config file
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
pub const CONFIG_FILE_ENV: &str = "CONFIG_FILE";

// Roster defaults
pub const DEFAULT_ROSTER_PATH: &str = "./data/roster.xlsx";
pub const DEFAULT_ROSTER_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_PARTICIPANT_COLUMN: &str = "Participant Name";
pub const DEFAULT_TEAM_COLUMN: &str = "Team Name";
pub const DEFAULT_ORGANIZATION_COLUMN: &str = "Organization Name";

// Certificate asset defaults
pub const DEFAULT_TEMPLATE_PATH: &str = "./data/certificate_template.pdf";
pub const DEFAULT_FONT_PATH: &str = "./data/fonts/certificate.ttf";
pub const DEFAULT_CACHE_ASSETS: bool = false;
