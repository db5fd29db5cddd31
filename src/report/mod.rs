//! Markdown generation from the JSON store.
//!
//! A pass always rebuilds every page from every stored document. Pages
//! are written in three tiers: one per run, one history page per test
//! definition, and the top-level `summary.md`.

pub mod pages;
pub mod time;

use std::path::Path;

use chrono_tz::Tz;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::sanitize::sanitize;
use crate::storage::config::resolve_timezone;
use crate::storage::{
    ensure_dir, latest_run, list_run_test_ids, load_config, load_definitions, load_runs,
    write_atomic, Config, Layout, StoreError, TestDefinition,
};

use self::pages::{render_run_page, render_summary, render_test_page, SummaryEntry, TimedRun};
use self::time::format_run_time;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("unknown timezone '{0}' in config")]
    UnknownTimezone(String),
}

/// Pages written by one generation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenerationSummary {
    pub run_pages: usize,
    pub test_pages: usize,
    /// Tests listed on `summary.md`; tests without runs are left out.
    pub summary_entries: usize,
}

/// Regenerate all markdown under `dir` from its stored documents.
///
/// Any unreadable or malformed document aborts the pass. Pages written
/// before the failure are left in place.
pub fn generate_markdown(dir: impl AsRef<Path>) -> Result<GenerationSummary, ReportError> {
    let layout = Layout::new(dir.as_ref());
    let config = load_config(layout.root())?;
    let tz = resolve_timezone(&config.timezone)
        .ok_or_else(|| ReportError::UnknownTimezone(config.timezone.clone()))?;

    ensure_dir(&layout.tests_dir())?;
    ensure_dir(&layout.markdown_tests_dir())?;

    let summary = GenerationSummary {
        run_pages: write_run_pages(&layout, tz)?,
        test_pages: write_test_pages(&layout, tz)?,
        summary_entries: write_summary_page(&layout, &config, tz)?,
    };
    info!(
        dir = %layout.root().display(),
        run_pages = summary.run_pages,
        test_pages = summary.test_pages,
        summary_entries = summary.summary_entries,
        "markdown generated"
    );
    Ok(summary)
}

fn write_page(path: &Path, contents: &str) -> Result<(), StoreError> {
    write_atomic(path, contents.as_bytes()).map_err(StoreError::storage(path))?;
    debug!(path = %path.display(), "wrote page");
    Ok(())
}

/// One page per stored run, including runs of tests that were never defined.
fn write_run_pages(layout: &Layout, tz: Tz) -> Result<usize, StoreError> {
    let mut written = 0;
    for test_id in list_run_test_ids(layout.root())? {
        if sanitize(&test_id) != test_id {
            warn!(%test_id, "skipping run directory with unsafe name");
            continue;
        }
        let runs = load_runs(layout.root(), &test_id)?;
        if runs.is_empty() {
            continue;
        }
        ensure_dir(&layout.markdown_tests_dir().join(&test_id))?;
        for run in &runs {
            let time = format_run_time(run.run_id, tz);
            let page = render_run_page(&test_id, TimedRun { run, time: &time });
            write_page(&layout.run_page(&test_id, run.run_id), &page)?;
            written += 1;
        }
    }
    Ok(written)
}

/// Stored definitions whose id can safely form a page path.
fn page_definitions(layout: &Layout) -> Result<Vec<TestDefinition>, StoreError> {
    let mut definitions = load_definitions(layout.root())?;
    definitions.retain(|definition| {
        let safe = sanitize(&definition.test_id) == definition.test_id;
        if !safe {
            warn!(test_id = %definition.test_id, "skipping definition with unsafe test id");
        }
        safe
    });
    Ok(definitions)
}

fn write_test_pages(layout: &Layout, tz: Tz) -> Result<usize, StoreError> {
    let definitions = page_definitions(layout)?;
    for definition in &definitions {
        let mut runs = load_runs(layout.root(), &definition.test_id)?;
        runs.reverse();
        let times: Vec<String> = runs.iter().map(|r| format_run_time(r.run_id, tz)).collect();
        let timed: Vec<TimedRun<'_>> = runs
            .iter()
            .zip(&times)
            .map(|(run, time)| TimedRun { run, time })
            .collect();
        let page = render_test_page(definition, &timed);
        write_page(&layout.test_page(&definition.test_id), &page)?;
    }
    Ok(definitions.len())
}

fn write_summary_page(layout: &Layout, config: &Config, tz: Tz) -> Result<usize, StoreError> {
    let definitions = page_definitions(layout)?;

    let mut latest = Vec::new();
    for definition in &definitions {
        match latest_run(layout.root(), &definition.test_id)? {
            Some(run) => {
                let time = format_run_time(run.run_id, tz);
                latest.push((definition, run, time));
            }
            None => debug!(test_id = %definition.test_id, "no runs yet, left off summary"),
        }
    }

    let entries: Vec<SummaryEntry<'_>> = latest
        .iter()
        .map(|(definition, run, time)| SummaryEntry {
            definition,
            latest: TimedRun { run, time },
        })
        .collect();
    write_page(&layout.summary_page(), &render_summary(config, &entries))?;
    Ok(entries.len())
}
