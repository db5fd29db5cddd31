//! Test definitions (`tests/<test_id>.json`).

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::schema::{self, Versioned};
use super::{ensure_dir, list_json_files, read_document, write_document, Layout, Result, StoreError};
use crate::sanitize::sanitize;

/// Seconds without a report before a test counts as stale.
///
/// Only whole seconds are valid; every fallible conversion rejects
/// fractional or non-numeric input with [`StoreError::InvalidArgument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeoutSecs(i64);

impl TimeoutSecs {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for TimeoutSecs {
    fn from(secs: i64) -> Self {
        Self(secs)
    }
}

impl TryFrom<f64> for TimeoutSecs {
    type Error = StoreError;

    fn try_from(secs: f64) -> Result<Self> {
        // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
        if secs.fract() != 0.0 || !(i64::MIN as f64..i64::MAX as f64).contains(&secs) {
            return Err(StoreError::InvalidArgument(format!(
                "invalid timeout_secs value {secs}: must be an integer"
            )));
        }
        Ok(Self(secs as i64))
    }
}

impl FromStr for TimeoutSecs {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim().parse::<i64>().map(Self).map_err(|_| {
            StoreError::InvalidArgument(format!(
                "invalid timeout_secs value '{s}': must be an integer"
            ))
        })
    }
}

impl fmt::Display for TimeoutSecs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Static metadata of one named check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDefinition {
    #[serde(default = "schema::current_version")]
    pub version: u32,
    pub test_id: String,
    pub title: String,
    /// Markdown; blank lines become paragraph breaks.
    pub description: String,
    pub timeout_secs: TimeoutSecs,
}

impl Versioned for TestDefinition {
    fn version(&self) -> u32 {
        self.version
    }
}

/// Create or fully replace the definition of `test_id`.
pub fn define_test_definition(
    dir: impl AsRef<Path>,
    test_id: &str,
    title: &str,
    description: &str,
    timeout_secs: TimeoutSecs,
) -> Result<TestDefinition> {
    let layout = Layout::new(dir.as_ref());
    let test_id = sanitize(test_id);
    let definition = TestDefinition {
        version: schema::SCHEMA_VERSION,
        test_id,
        title: title.to_string(),
        description: description.to_string(),
        timeout_secs,
    };

    ensure_dir(&layout.tests_dir())?;
    write_document(&layout.definition_file(&definition.test_id), &definition)?;
    info!(test_id = %definition.test_id, title = %definition.title, "test defined");
    Ok(definition)
}

/// Every definition under `dir`, sorted by `test_id`.
pub fn load_definitions(dir: impl AsRef<Path>) -> Result<Vec<TestDefinition>> {
    let layout = Layout::new(dir.as_ref());
    let mut definitions = Vec::new();
    for path in list_json_files(&layout.tests_dir())? {
        if let Some(definition) = read_document::<TestDefinition>(&path)? {
            definitions.push(definition);
        }
    }
    definitions.sort_by(|a, b| a.test_id.cmp(&b.test_id));
    Ok(definitions)
}
