//! Schema version marker. CloudKit-style schema evolution is out of scope;
//! this just records the version a data directory was created with so a
//! future incompatible layout change can refuse to run against old data
//! instead of silently corrupting it.

use std::path::Path;

use adaptive_run_core::error::{EngineError, Result};

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

const MARKER_FILE: &str = "schema_version";

/// Read the marker in `data_dir`, writing `CURRENT_SCHEMA_VERSION` if the
/// directory is new. Errors if an existing marker names a newer version
/// than this build understands.
pub fn ensure_schema_version(data_dir: &Path) -> Result<u32> {
    let marker_path = data_dir.join(MARKER_FILE);

    let version = match std::fs::read_to_string(&marker_path) {
        Ok(contents) => contents
            .trim()
            .parse::<u32>()
            .map_err(|e| EngineError::PersistenceError(format!("bad schema marker: {e}")))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            std::fs::write(&marker_path, CURRENT_SCHEMA_VERSION.to_string())?;
            CURRENT_SCHEMA_VERSION
        }
        Err(e) => return Err(e.into()),
    };

    if version > CURRENT_SCHEMA_VERSION {
        return Err(EngineError::PersistenceError(format!(
            "data directory schema version {version} is newer than this build supports ({CURRENT_SCHEMA_VERSION})"
        )));
    }

    Ok(version)
}
