//! Identifier sanitizing for filesystem keys.

use once_cell::sync::Lazy;
use regex::Regex;

static UNSAFE_PATH_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9a-zA-Z_\-]+").expect("valid path sanitizer regex"));

/// Make `raw` safe to use as a single file or directory name.
///
/// Every run of characters outside `[0-9a-zA-Z_-]` (path separators and
/// `.` included) collapses to one `_`, so the result can never climb out of
/// its parent directory.
pub fn sanitize(raw: &str) -> String {
    UNSAFE_PATH_CHARS.replace_all(raw, "_").into_owned()
}
