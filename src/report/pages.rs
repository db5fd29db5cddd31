//! Markdown page rendering.
//!
//! Pure functions from stored documents to page text. Every page is a list
//! of lines joined with `\n` and closed by two empty lines.

use crate::storage::{Config, TestDefinition, TestRun};

const TITLE_RULE: &str = "========";
const SECTION_RULE: &str = "--------";

/// A run together with its display time.
#[derive(Debug, Clone, Copy)]
pub struct TimedRun<'a> {
    pub run: &'a TestRun,
    pub time: &'a str,
}

/// The newest run of one test, as listed on the summary page.
#[derive(Debug, Clone, Copy)]
pub struct SummaryEntry<'a> {
    pub definition: &'a TestDefinition,
    pub latest: TimedRun<'a>,
}

fn finish(mut lines: Vec<String>) -> String {
    lines.push(String::new());
    lines.push(String::new());
    lines.join("\n")
}

/// Detail page of a single run: `md/tests/<test_id>/<run_id>.md`.
/// `test_id` names the directory the run was stored under.
pub fn render_run_page(test_id: &str, entry: TimedRun<'_>) -> String {
    let run = entry.run;
    let lines = vec![
        format!("Test [{}] Run [{}]", test_id, run.run_id),
        TITLE_RULE.to_string(),
        String::new(),
        format!("State: `{}`", run.state),
        String::new(),
        format!("Time: `{}`", entry.time),
        String::new(),
        "Log:".to_string(),
        String::new(),
        "```".to_string(),
        run.log.clone(),
        "```".to_string(),
    ];
    finish(lines)
}

/// History page of one test: `md/tests/<test_id>.md`. `runs` must be
/// newest first.
pub fn render_test_page(definition: &TestDefinition, runs: &[TimedRun<'_>]) -> String {
    let mut lines = vec![
        format!("Test [{}]", definition.test_id),
        TITLE_RULE.to_string(),
        String::new(),
        "Description".to_string(),
        SECTION_RULE.to_string(),
        String::new(),
        definition.description.clone(),
        String::new(),
        "History".to_string(),
        SECTION_RULE.to_string(),
        String::new(),
    ];
    for entry in runs {
        lines.push(format!(
            "* [{}]({}/{}.md) [**{}**]",
            entry.time, definition.test_id, entry.run.run_id, entry.run.state
        ));
    }
    finish(lines)
}

/// Top-level `summary.md`.
pub fn render_summary(config: &Config, entries: &[SummaryEntry<'_>]) -> String {
    let mut lines = vec![
        config.summary_title.clone(),
        TITLE_RULE.to_string(),
        String::new(),
    ];
    if let Some(overview) = &config.overview_section_md {
        lines.push(overview.clone());
        lines.push(String::new());
    }
    for entry in entries {
        let test_id = &entry.definition.test_id;
        lines.push(format!(
            "* [{state}](md/tests/{test_id}/{run_id}.md) [{title}](md/tests/{test_id}.md) ({time})",
            state = entry.latest.run.state,
            run_id = entry.latest.run.run_id,
            title = entry.definition.title,
            time = entry.latest.time,
        ));
    }
    finish(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::RunId;

    fn run(state: &str, nanos: u64, log: &str) -> TestRun {
        TestRun {
            version: 1,
            test_id: "system_a_subsystem_1".to_string(),
            run_id: RunId::from_nanos(nanos),
            state: state.to_string(),
            log: log.to_string(),
        }
    }

    fn definition() -> TestDefinition {
        TestDefinition {
            version: 1,
            test_id: "system_a_subsystem_1".to_string(),
            title: "A 1".to_string(),
            description: "This test validates...".to_string(),
            timeout_secs: 60.into(),
        }
    }

    #[test]
    fn test_render_run_page() {
        let r = run("OK", 42, "Things went just fine...\nlast line");
        let page = render_run_page(
            "system_a_subsystem_1",
            TimedRun {
                run: &r,
                time: "2020-09-13 08-26-40 EDT",
            },
        );
        assert_eq!(
            page,
            "Test [system_a_subsystem_1] Run [00000000000000000042]\n\
             ========\n\
             \n\
             State: `OK`\n\
             \n\
             Time: `2020-09-13 08-26-40 EDT`\n\
             \n\
             Log:\n\
             \n\
             ```\n\
             Things went just fine...\n\
             last line\n\
             ```\n\
             \n"
        );
    }

    #[test]
    fn test_render_test_page_lists_given_order() {
        let (newer, older) = (run("OK", 2, ""), run("ERROR", 1, ""));
        let runs = [
            TimedRun { run: &newer, time: "T2" },
            TimedRun { run: &older, time: "T1" },
        ];
        let page = render_test_page(&definition(), &runs);
        assert!(page.starts_with("Test [system_a_subsystem_1]\n========\n\nDescription\n--------\n\nThis test validates...\n\nHistory\n--------\n\n"));
        assert!(page.ends_with(
            "* [T2](system_a_subsystem_1/00000000000000000002.md) [**OK**]\n\
             * [T1](system_a_subsystem_1/00000000000000000001.md) [**ERROR**]\n\n"
        ));
    }

    #[test]
    fn test_render_test_page_without_runs() {
        let page = render_test_page(&definition(), &[]);
        assert!(page.ends_with("History\n--------\n\n\n"));
    }

    #[test]
    fn test_render_summary_with_overview() {
        let config = Config {
            summary_title: "My Cool System".to_string(),
            overview_section_md: Some("Overview\n--------".to_string()),
            ..Config::default()
        };
        let (def, latest) = (definition(), run("OK", 7, ""));
        let entries = [SummaryEntry {
            definition: &def,
            latest: TimedRun { run: &latest, time: "T7" },
        }];
        assert_eq!(
            render_summary(&config, &entries),
            "My Cool System\n========\n\nOverview\n--------\n\n\
             * [OK](md/tests/system_a_subsystem_1/00000000000000000007.md) \
             [A 1](md/tests/system_a_subsystem_1.md) (T7)\n\n"
        );
    }

    #[test]
    fn test_render_summary_without_overview() {
        let page = render_summary(&Config::default(), &[]);
        assert_eq!(page, "Status Summary\n========\n\n\n");
    }
}
