//! Document schema versions.
//!
//! Every persisted document carries a `version` field. Documents written
//! before the field existed deserialize as version 1.

use std::path::Path;

use super::{Result, StoreError};

/// Newest document version this build reads and the one it writes.
pub const SCHEMA_VERSION: u32 = 1;

/// serde default for the `version` field of every document.
pub fn current_version() -> u32 {
    SCHEMA_VERSION
}

/// A persisted document that carries a schema version.
pub trait Versioned {
    fn version(&self) -> u32;
}

/// Reject version 0 and documents written by a newer schema than this
/// build understands.
pub fn check_version(path: &Path, found: u32) -> Result<()> {
    if found > SCHEMA_VERSION || found == 0 {
        return Err(StoreError::UnsupportedVersion {
            path: path.to_path_buf(),
            found,
            supported: SCHEMA_VERSION,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_version_is_accepted() {
        check_version(Path::new("x.json"), SCHEMA_VERSION).unwrap();
    }

    #[test]
    fn test_future_version_is_rejected() {
        let err = check_version(Path::new("x.json"), SCHEMA_VERSION + 1).unwrap_err();
        assert!(matches!(
            err,
            StoreError::UnsupportedVersion { found, .. } if found == SCHEMA_VERSION + 1
        ));
    }

    #[test]
    fn test_zero_version_is_rejected() {
        assert!(check_version(Path::new("x.json"), 0).is_err());
    }
}
