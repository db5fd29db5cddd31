//! Run time display.

use chrono_tz::Tz;

use crate::storage::RunId;

const RUN_TIME_FORMAT: &str = "%Y-%m-%d %H-%M-%S %Z";

/// Render the creation time of `run_id` in `tz`, truncated to the second,
/// e.g. `2020-09-13 08-26-40 EDT`.
pub fn format_run_time(run_id: RunId, tz: Tz) -> String {
    run_id
        .timestamp()
        .with_timezone(&tz)
        .format(RUN_TIME_FORMAT)
        .to_string()
}
