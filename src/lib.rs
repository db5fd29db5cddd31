//! statusreports -- record status checks, publish them as markdown.
//!
//! Test definitions and test runs are stored as JSON documents under an
//! output directory. [`generate_markdown`] turns everything stored there
//! into a browsable set of markdown pages topped by `summary.md`.
//!
//! ```no_run
//! use statusreports::{define_test_definition, generate_markdown, report_test_run};
//!
//! # fn main() -> anyhow::Result<()> {
//! define_test_definition("out", "system_a.subsystem_1", "A 1", "Checks A.", 60.into())?;
//! report_test_run("out", "system_a.subsystem_1", "OK", "all good")?;
//! generate_markdown("out")?;
//! # Ok(())
//! # }
//! ```

pub mod report;
pub mod sanitize;
pub mod storage;

pub use report::{generate_markdown, GenerationSummary, ReportError};
pub use sanitize::sanitize;
pub use storage::{
    define_config, define_test_definition, latest_run, list_run_test_ids, load_config,
    load_definitions, load_runs, report_test_run, Config, ConfigUpdate, RunId, StoreError,
    TestDefinition, TestRun, TimeoutSecs,
};
