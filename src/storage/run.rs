//! Test runs (`tests/<test_id>/<run_id>.json`).
//!
//! A run id is the creation time in nanoseconds since the Unix epoch,
//! rendered as a zero-padded 20 digit decimal. The rendered form is both
//! the JSON value and the file stem, so lexical order of files, numeric
//! order of ids and chronological order all agree.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{info, warn};

use super::schema::{self, Versioned};
use super::{
    ensure_dir, list_dir, list_json_files, read_document, write_new_document, Layout, Result,
    StoreError,
};
use crate::sanitize::sanitize;

const RUN_ID_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(u64);

impl RunId {
    pub fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Current wall-clock time. Clocks before 1970 clamp to zero.
    pub fn now() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
            .unwrap_or(0);
        Self(nanos)
    }

    pub fn as_nanos(self) -> u64 {
        self.0
    }

    /// The id one nanosecond later, or `None` past the last representable id.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    pub fn timestamp(self) -> DateTime<Utc> {
        let secs = (self.0 / 1_000_000_000) as i64;
        let nanos = (self.0 % 1_000_000_000) as u32;
        DateTime::from_timestamp(secs, nanos).unwrap_or_default()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.0, width = RUN_ID_WIDTH)
    }
}

impl FromStr for RunId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != RUN_ID_WIDTH || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(StoreError::InvalidArgument(format!("invalid run id '{s}'")));
        }
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| StoreError::InvalidArgument(format!("run id '{s}' out of range")))
    }
}

impl Serialize for RunId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RunId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Outcome of one execution of a test. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRun {
    #[serde(default = "schema::current_version")]
    pub version: u32,
    pub test_id: String,
    pub run_id: RunId,
    /// Free-form; `OK` and `FAILED` are the usual values.
    pub state: String,
    pub log: String,
}

impl Versioned for TestRun {
    fn version(&self) -> u32 {
        self.version
    }
}

/// Record a new run of `test_id`.
///
/// The id is the current time, but always later than every run already
/// stored for the test. The document is created exclusively; if another
/// writer took the id first, the next nanosecond is tried. Fails with
/// [`StoreError::RunIdsExhausted`] once no later id exists.
pub fn report_test_run(
    dir: impl AsRef<Path>,
    test_id: &str,
    state: &str,
    log: &str,
) -> Result<TestRun> {
    let layout = Layout::new(dir.as_ref());
    let test_id = sanitize(test_id);
    let runs_dir = layout.runs_dir(&test_id);
    ensure_dir(&runs_dir)?;

    let exhausted = |test_id: &str| StoreError::RunIdsExhausted {
        test_id: test_id.to_string(),
    };

    let mut run_id = RunId::now();
    if let Some(newest) = newest_run_id(&runs_dir)? {
        if run_id <= newest {
            run_id = newest.next().ok_or_else(|| exhausted(&test_id))?;
        }
    }

    let mut run = TestRun {
        version: schema::SCHEMA_VERSION,
        test_id,
        run_id,
        state: state.to_string(),
        log: log.to_string(),
    };
    while !write_new_document(&layout.run_file(&run.test_id, run.run_id), &run)? {
        run.run_id = run.run_id.next().ok_or_else(|| exhausted(&run.test_id))?;
    }

    info!(test_id = %run.test_id, run_id = %run.run_id, state = %run.state, "test run reported");
    Ok(run)
}

/// Every run of `test_id`, oldest first.
pub fn load_runs(dir: impl AsRef<Path>, test_id: &str) -> Result<Vec<TestRun>> {
    let layout = Layout::new(dir.as_ref());
    let mut runs = Vec::new();
    for path in list_json_files(&layout.runs_dir(&sanitize(test_id)))? {
        if let Some(run) = read_document::<TestRun>(&path)? {
            runs.push(run);
        }
    }
    runs.sort_by_key(|run| run.run_id);
    Ok(runs)
}

/// The newest run of `test_id`, if it has any.
pub fn latest_run(dir: impl AsRef<Path>, test_id: &str) -> Result<Option<TestRun>> {
    Ok(load_runs(dir, test_id)?.pop())
}

/// Names of all per-test run directories, sorted.
pub fn list_run_test_ids(dir: impl AsRef<Path>) -> Result<Vec<String>> {
    let layout = Layout::new(dir.as_ref());
    Ok(list_dir(&layout.tests_dir())?
        .into_iter()
        .filter(|p| p.is_dir())
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
        .collect())
}

fn newest_run_id(runs_dir: &Path) -> Result<Option<RunId>> {
    let mut newest = None;
    for path in list_json_files(runs_dir)? {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        match stem.parse::<RunId>() {
            Ok(id) => newest = newest.max(Some(id)),
            Err(_) => warn!(path = %path.display(), "ignoring run file with unexpected name"),
        }
    }
    Ok(newest)
}
