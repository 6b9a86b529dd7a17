use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use defaults::*;

use crate::layout::{
    CertificateLayout, DEFAULT_MAX_WIDTH_FRACTION, LayoutPreset, OverflowPolicy, Rgb,
};
use crate::services::StaleRosterPolicy;
use crate::sources::ColumnMapping;

/// Where the roster comes from and how long a loaded copy stays fresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    #[serde(default = "default_roster_path")]
    pub path: PathBuf,
    /// Snapshot lifetime before the next lookup reloads it
    #[serde(default = "default_roster_ttl", with = "duration_serde::duration")]
    pub ttl: Duration,
    /// Behaviour when a reload fails
    #[serde(default)]
    pub stale_policy: StaleRosterPolicy,
    #[serde(default = "default_participant_column")]
    pub participant_column: String,
    #[serde(default = "default_team_column")]
    pub team_column: String,
    /// Header of the organization column. An omitted key means the default
    /// header; an empty string means the roster has no organization column.
    #[serde(
        default = "default_organization_column",
        skip_serializing_if = "Option::is_none"
    )]
    pub organization_column: Option<String>,
}

fn default_roster_path() -> PathBuf {
    PathBuf::from(DEFAULT_ROSTER_PATH)
}
fn default_roster_ttl() -> Duration {
    DEFAULT_ROSTER_TTL
}
fn default_participant_column() -> String {
    DEFAULT_PARTICIPANT_COLUMN.to_string()
}
fn default_team_column() -> String {
    DEFAULT_TEAM_COLUMN.to_string()
}
fn default_organization_column() -> Option<String> {
    Some(DEFAULT_ORGANIZATION_COLUMN.to_string())
}

impl RosterConfig {
    pub fn columns(&self) -> ColumnMapping {
        ColumnMapping {
            participant: self.participant_column.clone(),
            team: self.team_column.clone(),
            organization: self
                .organization_column
                .clone()
                .filter(|column| !column.trim().is_empty()),
        }
    }
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            path: default_roster_path(),
            ttl: default_roster_ttl(),
            stale_policy: StaleRosterPolicy::default(),
            participant_column: default_participant_column(),
            team_column: default_team_column(),
            organization_column: default_organization_column(),
        }
    }
}

/// Template, font and layout used to render certificates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateConfig {
    #[serde(default = "default_template_path")]
    pub template_path: PathBuf,
    #[serde(default = "default_font_path")]
    pub font_path: PathBuf,
    #[serde(default)]
    pub layout: LayoutPreset,
    /// Share of the page width a line of text may use
    #[serde(default = "default_max_width_fraction")]
    pub max_width_fraction: f32,
    #[serde(default)]
    pub overflow: OverflowPolicy,
    /// RGB components in 0.0-1.0
    #[serde(default = "default_text_color")]
    pub text_color: [f32; 3],
    /// Read template and font once at startup instead of per request
    #[serde(default = "default_cache_assets")]
    pub cache_assets: bool,
}

fn default_template_path() -> PathBuf {
    PathBuf::from(DEFAULT_TEMPLATE_PATH)
}
fn default_font_path() -> PathBuf {
    PathBuf::from(DEFAULT_FONT_PATH)
}
fn default_max_width_fraction() -> f32 {
    DEFAULT_MAX_WIDTH_FRACTION
}
fn default_text_color() -> [f32; 3] {
    [0.0, 0.0, 0.0]
}
fn default_cache_assets() -> bool {
    DEFAULT_CACHE_ASSETS
}

impl CertificateConfig {
    pub fn text_color(&self) -> Rgb {
        let [r, g, b] = self.text_color;
        Rgb(r, g, b)
    }

    /// Layout engine settings derived from the preset and overrides
    pub fn layout(&self) -> CertificateLayout {
        CertificateLayout::from_preset(self.layout)
            .with_max_width_fraction(self.max_width_fraction)
            .with_overflow(self.overflow)
            .with_color(self.text_color())
    }
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            template_path: default_template_path(),
            font_path: default_font_path(),
            layout: LayoutPreset::default(),
            max_width_fraction: default_max_width_fraction(),
            overflow: OverflowPolicy::default(),
            text_color: default_text_color(),
            cache_assets: default_cache_assets(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub roster: RosterConfig,
    #[serde(default)]
    pub certificate: CertificateConfig,
}

impl Config {
    /// Load from `$CONFIG_FILE`, or `config.toml` when it is unset
    pub fn load() -> Result<Self> {
        let config_file = config_file_path(std::env::var(CONFIG_FILE_ENV).ok());
        let config = Self::load_from_file(&config_file)?;
        info!("Configuration loaded from: {}", config_file);
        Ok(config)
    }

    pub fn load_from_file<P: AsRef<Path>>(config_file: P) -> Result<Self> {
        let config_file = config_file.as_ref();
        let config = if config_file.exists() {
            let contents = std::fs::read_to_string(config_file)?;
            toml::from_str(&contents)?
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file.display());
            default_config
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.roster.ttl.is_zero() {
            bail!("roster.ttl must be greater than zero");
        }
        for (name, column) in [
            ("roster.participant_column", &self.roster.participant_column),
            ("roster.team_column", &self.roster.team_column),
        ] {
            if column.trim().is_empty() {
                bail!("{name} must not be empty");
            }
        }

        let fraction = self.certificate.max_width_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            bail!("certificate.max_width_fraction must be in (0, 1], got {fraction}");
        }
        if !self.certificate.text_color().is_valid() {
            bail!(
                "certificate.text_color components must be in [0, 1], got {:?}",
                self.certificate.text_color
            );
        }
        Ok(())
    }
}

fn config_file_path(from_env: Option<String>) -> String {
    from_env
        .filter(|path| !path.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::load_from_file(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.roster.ttl, DEFAULT_ROSTER_TTL);
        assert_eq!(config.roster.stale_policy, StaleRosterPolicy::FailFast);

        let reloaded = Config::load_from_file(&path).unwrap();
        assert_eq!(reloaded.roster.ttl, config.roster.ttl);
        assert_eq!(reloaded.certificate.layout, LayoutPreset::TeamOnly);
        assert_eq!(
            reloaded.roster.organization_column.as_deref(),
            Some(DEFAULT_ORGANIZATION_COLUMN)
        );
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[roster]
path = "/srv/roster.xlsx"
ttl = "30s"
stale_policy = "serve_stale"

[certificate]
layout = "with_organization"
overflow = "reject"
text_color = [0.1, 0.2, 0.3]
"#,
        )
        .unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.roster.path, PathBuf::from("/srv/roster.xlsx"));
        assert_eq!(config.roster.ttl, Duration::from_secs(30));
        assert_eq!(config.roster.stale_policy, StaleRosterPolicy::ServeStale);
        assert_eq!(config.roster.team_column, DEFAULT_TEAM_COLUMN);
        assert_eq!(config.certificate.font_path, PathBuf::from(DEFAULT_FONT_PATH));

        let layout = config.certificate.layout();
        assert_eq!(layout.secondary.len(), 1);
        assert_eq!(layout.overflow, OverflowPolicy::Reject);
        assert_eq!(layout.color, Rgb(0.1, 0.2, 0.3));
        assert_eq!(layout.max_width_fraction, DEFAULT_MAX_WIDTH_FRACTION);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.roster.ttl = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.certificate.max_width_fraction = 0.0;
        assert!(config.validate().is_err());
        config.certificate.max_width_fraction = 1.5;
        assert!(config.validate().is_err());
        config.certificate.max_width_fraction = 1.0;
        assert!(config.validate().is_ok());

        let mut config = Config::default();
        config.certificate.text_color = [0.0, 2.0, 0.0];
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.roster.team_column = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_organization_column_disables_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[roster]\norganization_column = \"\"\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.roster.columns().organization, None);
        assert_eq!(config.roster.columns().team, DEFAULT_TEAM_COLUMN);

        let omitted = Config::default();
        assert_eq!(
            omitted.roster.columns().organization.as_deref(),
            Some(DEFAULT_ORGANIZATION_COLUMN)
        );
    }

    #[test]
    fn test_config_file_path_prefers_environment() {
        assert_eq!(config_file_path(Some("/etc/cert.toml".to_string())), "/etc/cert.toml");
        assert_eq!(config_file_path(Some(" ".to_string())), DEFAULT_CONFIG_FILE);
        assert_eq!(config_file_path(None), DEFAULT_CONFIG_FILE);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[roster]\nttl = \"0s\"\n").unwrap();
        assert!(Config::load_from_file(&path).is_err());
    }
}
