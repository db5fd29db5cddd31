//! Plain-file JSON storage -- layout, document I/O, versioning.
//!
//! Everything lives under one output directory:
//!
//! ```text
//! <dir>/config.json
//! <dir>/tests/<test_id>.json
//! <dir>/tests/<test_id>/<run_id>.json
//! <dir>/md/tests/<test_id>.md
//! <dir>/md/tests/<test_id>/<run_id>.md
//! <dir>/summary.md
//! ```
//!
//! Nothing is cached. Each call reads what is on disk at that moment.

pub mod config;
pub mod definition;
pub mod run;
pub mod schema;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

pub use self::config::{define_config, load_config, Config, ConfigUpdate};
pub use self::definition::{define_test_definition, load_definitions, TestDefinition, TimeoutSecs};
pub use self::run::{latest_run, list_run_test_ids, load_runs, report_test_run, RunId, TestRun};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("malformed document {}: {source}", path.display())]
    MalformedDocument {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot serialize document {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no run ids left for test '{test_id}'")]
    RunIdsExhausted { test_id: String },

    #[error("document {} has schema version {found}, newest supported is {supported}", path.display())]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        supported: u32,
    },

    #[error("storage failure at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    fn serialize(path: &Path) -> impl FnOnce(serde_json::Error) -> Self + '_ {
        move |source| StoreError::Serialize {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn storage(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| StoreError::Storage {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Paths of every document and page under one output directory.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    pub fn tests_dir(&self) -> PathBuf {
        self.root.join("tests")
    }

    /// `test_id` must already be sanitized.
    pub fn definition_file(&self, test_id: &str) -> PathBuf {
        self.tests_dir().join(format!("{test_id}.json"))
    }

    pub fn runs_dir(&self, test_id: &str) -> PathBuf {
        self.tests_dir().join(test_id)
    }

    pub fn run_file(&self, test_id: &str, run_id: RunId) -> PathBuf {
        self.runs_dir(test_id).join(format!("{run_id}.json"))
    }

    pub fn markdown_tests_dir(&self) -> PathBuf {
        self.root.join("md").join("tests")
    }

    pub fn test_page(&self, test_id: &str) -> PathBuf {
        self.markdown_tests_dir().join(format!("{test_id}.md"))
    }

    pub fn run_page(&self, test_id: &str, run_id: RunId) -> PathBuf {
        self.markdown_tests_dir()
            .join(test_id)
            .join(format!("{run_id}.md"))
    }

    pub fn summary_page(&self) -> PathBuf {
        self.root.join("summary.md")
    }
}

/// Create `dir` and its parents if missing.
pub(crate) fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(StoreError::storage(dir))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `contents` next to `path` and rename it into place, so readers
/// never observe a half-written file.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let tmp = tmp_path(path);
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}

/// Serialize `doc` as pretty JSON and write it to `path`.
pub(crate) fn write_document<T: Serialize>(path: &Path, doc: &T) -> Result<()> {
    let json = to_json(path, doc)?;
    write_atomic(path, &json).map_err(StoreError::storage(path))?;
    debug!(path = %path.display(), "wrote document");
    Ok(())
}

/// Write `doc` to `path` only if nothing exists there yet. Returns
/// `Ok(false)` when the path is already taken.
///
/// Each call stages its bytes in its own temp file, so concurrent writers
/// racing for the same path never see each other's contents.
pub(crate) fn write_new_document<T: Serialize>(path: &Path, doc: &T) -> Result<bool> {
    let json = to_json(path, doc)?;
    let parent = path.parent().unwrap_or_else(|| Path::new("."));

    let mut staged = NamedTempFile::new_in(parent).map_err(StoreError::storage(parent))?;
    staged
        .write_all(&json)
        .map_err(StoreError::storage(staged.path()))?;

    match staged.persist_noclobber(path) {
        Ok(_) => {
            debug!(path = %path.display(), "wrote new document");
            Ok(true)
        }
        // The temp file is dropped, and removed, with the error.
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(StoreError::storage(path)(e.error)),
    }
}

fn to_json<T: Serialize>(path: &Path, doc: &T) -> Result<Vec<u8>> {
    let mut json = serde_json::to_vec_pretty(doc).map_err(StoreError::serialize(path))?;
    json.push(b'\n');
    Ok(json)
}

/// Read and decode the document at `path`. A missing file is `Ok(None)`.
pub(crate) fn read_document<T>(path: &Path) -> Result<Option<T>>
where
    T: DeserializeOwned + schema::Versioned,
{
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::storage(path)(e)),
    };
    let doc: T = serde_json::from_slice(&bytes).map_err(|source| StoreError::MalformedDocument {
        path: path.to_path_buf(),
        source,
    })?;
    schema::check_version(path, doc.version())?;
    debug!(path = %path.display(), "read document");
    Ok(Some(doc))
}

/// Sorted entries of `dir`. A missing directory has no entries.
pub(crate) fn list_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::storage(dir)(e)),
    };
    let mut paths = Vec::new();
    for entry in entries {
        paths.push(entry.map_err(StoreError::storage(dir))?.path());
    }
    paths.sort();
    Ok(paths)
}

/// Sorted `*.json` files directly inside `dir`.
pub(crate) fn list_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(list_dir(dir)?
        .into_iter()
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect())
}
