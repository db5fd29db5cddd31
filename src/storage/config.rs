//! Per-directory display settings (`config.json`).

use std::path::Path;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::schema::{self, Versioned};
use super::{ensure_dir, read_document, write_document, Layout, Result, StoreError};

pub const DEFAULT_TIMEZONE: &str = "US/Eastern";
pub const DEFAULT_SUMMARY_TITLE: &str = "Status Summary";

/// Display settings used when rendering markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "schema::current_version")]
    pub version: u32,
    /// IANA zone name, e.g. `US/Pacific` or `UTC`.
    pub timezone: String,
    pub summary_title: String,
    /// Free-form markdown placed right under the summary heading.
    #[serde(default)]
    pub overview_section_md: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: schema::SCHEMA_VERSION,
            timezone: DEFAULT_TIMEZONE.to_string(),
            summary_title: DEFAULT_SUMMARY_TITLE.to_string(),
            overview_section_md: None,
        }
    }
}

impl Versioned for Config {
    fn version(&self) -> u32 {
        self.version
    }
}

/// A partial config. Fields left as `None` keep their current value;
/// `Some(String::new())` sets the field to the empty string.
#[derive(Debug, Clone, Default)]
pub struct ConfigUpdate {
    pub timezone: Option<String>,
    pub summary_title: Option<String>,
    pub overview_section_md: Option<String>,
}

impl ConfigUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    pub fn summary_title(mut self, title: impl Into<String>) -> Self {
        self.summary_title = Some(title.into());
        self
    }

    pub fn overview_section_md(mut self, markdown: impl Into<String>) -> Self {
        self.overview_section_md = Some(markdown.into());
        self
    }

    fn apply(self, config: &mut Config) {
        if let Some(tz) = self.timezone {
            config.timezone = tz;
        }
        if let Some(title) = self.summary_title {
            config.summary_title = title;
        }
        if let Some(overview) = self.overview_section_md {
            config.overview_section_md = Some(overview);
        }
    }
}

/// Look up an IANA zone name.
pub fn resolve_timezone(name: &str) -> Option<Tz> {
    name.parse::<Tz>().ok()
}

/// The persisted config of `dir`, or the built-in default if none was written.
pub fn load_config(dir: impl AsRef<Path>) -> Result<Config> {
    let layout = Layout::new(dir.as_ref());
    Ok(read_document(&layout.config_file())?.unwrap_or_default())
}

/// Merge `update` into the current config of `dir` and persist the result.
pub fn define_config(dir: impl AsRef<Path>, update: ConfigUpdate) -> Result<Config> {
    let layout = Layout::new(dir.as_ref());

    if let Some(tz) = &update.timezone {
        if resolve_timezone(tz).is_none() {
            return Err(StoreError::InvalidArgument(format!("unknown timezone '{tz}'")));
        }
    }

    let mut config: Config = read_document(&layout.config_file())?.unwrap_or_default();
    update.apply(&mut config);
    config.version = schema::SCHEMA_VERSION;

    ensure_dir(layout.root())?;
    write_document(&layout.config_file(), &config)?;
    info!(
        dir = %layout.root().display(),
        timezone = %config.timezone,
        title = %config.summary_title,
        "config updated"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_config_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.timezone, "US/Eastern");
        assert_eq!(config.summary_title, "Status Summary");
        assert_eq!(config.overview_section_md, None);
        // The default is never persisted by a read.
        assert!(!dir.path().join("config.json").exists());
    }

    #[test]
    fn test_define_config_is_partial_merge() {
        let dir = tempfile::tempdir().unwrap();
        define_config(
            dir.path(),
            ConfigUpdate::new().timezone("UTC").summary_title("Y"),
        )
        .unwrap();
        define_config(dir.path(), ConfigUpdate::new().summary_title("X")).unwrap();

        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.timezone, "UTC");
        assert_eq!(config.summary_title, "X");
        assert_eq!(config.overview_section_md, None);
    }

    #[test]
    fn test_define_config_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out");
        define_config(&out, ConfigUpdate::new()).unwrap();
        assert!(out.join("config.json").is_file());
    }

    #[test]
    fn test_empty_overview_differs_from_absent() {
        let dir = tempfile::tempdir().unwrap();
        define_config(dir.path(), ConfigUpdate::new().overview_section_md("Intro")).unwrap();
        define_config(dir.path(), ConfigUpdate::new()).unwrap();
        assert_eq!(
            load_config(dir.path()).unwrap().overview_section_md.as_deref(),
            Some("Intro")
        );

        define_config(dir.path(), ConfigUpdate::new().overview_section_md("")).unwrap();
        assert_eq!(
            load_config(dir.path()).unwrap().overview_section_md.as_deref(),
            Some("")
        );
    }

    #[test]
    fn test_unknown_timezone_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err =
            define_config(dir.path(), ConfigUpdate::new().timezone("Mars/Olympus")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
        assert!(!dir.path().join("config.json").exists());
    }

    #[test]
    fn test_malformed_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.json"), "{ not json").unwrap();
        let err = load_config(dir.path()).unwrap_err();
        assert!(matches!(err, StoreError::MalformedDocument { .. }));
    }

    #[test]
    fn test_config_without_version_reads_as_current() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.json"),
            r#"{"timezone": "US/Pacific", "summary_title": "My Cool System", "overview_section_md": null}"#,
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.version, schema::SCHEMA_VERSION);
        assert_eq!(config.timezone, "US/Pacific");
    }
}
