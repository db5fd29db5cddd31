use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use statusreports::report::time::format_run_time;
use statusreports::storage::config::resolve_timezone;
use statusreports::{ConfigUpdate, TimeoutSecs};

#[derive(Parser)]
#[command(
    name = "statusreports",
    about = "Record status checks and publish them as a markdown report",
    version,
    long_about = None
)]
struct Cli {
    /// Output directory holding the JSON store and generated markdown
    #[arg(long, global = true, env = "STATUS_REPORTS_DIR", default_value = "status")]
    dir: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Update display settings; omitted options keep their current value
    Config {
        /// IANA timezone used for run times, e.g. US/Pacific
        #[arg(long)]
        timezone: Option<String>,

        /// Heading of the summary page
        #[arg(long)]
        title: Option<String>,

        /// Markdown shown under the summary heading
        #[arg(long, conflicts_with = "overview_file")]
        overview: Option<String>,

        /// Read the overview markdown from a file
        #[arg(long)]
        overview_file: Option<PathBuf>,
    },

    /// Print the effective display settings as JSON
    ShowConfig,

    /// Create or replace a test definition
    Define {
        /// Test identifier; unsafe characters become '_'
        #[arg(long)]
        id: String,

        /// Human-readable title
        #[arg(long)]
        title: String,

        /// Markdown description
        #[arg(long, default_value = "")]
        description: String,

        /// Whole seconds without a report before the test is stale
        #[arg(long)]
        timeout_secs: TimeoutSecs,
    },

    /// Record the outcome of one test run
    Report {
        /// Test identifier; unsafe characters become '_'
        #[arg(long)]
        id: String,

        /// Outcome, conventionally OK or FAILED
        #[arg(long)]
        state: String,

        /// Log text shown on the run page
        #[arg(long, conflicts_with = "log_file", default_value = "")]
        log: String,

        /// Read the log from a file ('-' for stdin)
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// Regenerate all markdown from the stored documents
    Generate,

    /// List the runs of one test, newest first
    History {
        /// Test identifier
        #[arg(long)]
        id: String,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_text(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);
    let dir = cli.dir.as_path();

    match cli.command {
        Commands::Config {
            timezone,
            title,
            overview,
            overview_file,
        } => {
            let overview = match overview_file {
                Some(path) => Some(read_text(&path)?),
                None => overview,
            };
            let update = ConfigUpdate {
                timezone,
                summary_title: title,
                overview_section_md: overview,
            };
            let config = statusreports::define_config(dir, update)
                .with_context(|| format!("failed to update config in {}", dir.display()))?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::ShowConfig => {
            let config = statusreports::load_config(dir)
                .with_context(|| format!("failed to load config from {}", dir.display()))?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Define {
            id,
            title,
            description,
            timeout_secs,
        } => {
            let definition =
                statusreports::define_test_definition(dir, &id, &title, &description, timeout_secs)
                    .with_context(|| format!("failed to define test '{}'", id))?;
            println!("Test '{}' defined.", definition.test_id);
        }
        Commands::Report {
            id,
            state,
            log,
            log_file,
        } => {
            let log = match log_file {
                Some(path) => read_text(&path)?,
                None => log,
            };
            let run = statusreports::report_test_run(dir, &id, &state, &log)
                .with_context(|| format!("failed to report run of test '{}'", id))?;
            println!("Run {} of '{}' recorded as {}.", run.run_id, run.test_id, run.state);
        }
        Commands::Generate => {
            let summary = statusreports::generate_markdown(dir)
                .with_context(|| format!("failed to generate markdown in {}", dir.display()))?;
            println!(
                "Generated {} run page(s), {} test page(s), {} summary entr{}.",
                summary.run_pages,
                summary.test_pages,
                summary.summary_entries,
                if summary.summary_entries == 1 { "y" } else { "ies" },
            );
        }
        Commands::History { id, json } => {
            let mut runs = statusreports::load_runs(dir, &id)
                .with_context(|| format!("failed to load runs of test '{}'", id))?;
            runs.reverse();
            let config = statusreports::load_config(dir)?;
            let tz = resolve_timezone(&config.timezone)
                .with_context(|| format!("unknown timezone '{}' in config", config.timezone))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&runs)?);
            } else if runs.is_empty() {
                println!("No runs recorded for '{}'.", statusreports::sanitize(&id));
            } else {
                println!("{:<20} | {:<25} | State", "Run", "Time");
                println!("{:-<20}-|-{:-<25}-|-{:-<10}", "", "", "");
                for run in &runs {
                    println!(
                        "{:<20} | {:<25} | {}",
                        run.run_id,
                        format_run_time(run.run_id, tz),
                        run.state
                    );
                }
            }
        }
    }

    Ok(())
}
