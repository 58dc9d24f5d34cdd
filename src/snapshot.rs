// Snapshot output: a fresh timestamped directory per run, images alongside a
// single pretty-printed `user_data.json`. Failures here are fatal for the
// run; there is no point finishing an export that cannot be persisted.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use crate::model::ExportedUser;

/// Fixed filename of the JSON document inside the run directory.
pub const SNAPSHOT_FILENAME: &str = "user_data.json";

/// Create `<folder_name>/<YYYYMMDD_HHMMSS>/` under the current directory and
/// return its path.
pub fn create_run_dir(folder_name: &str) -> Result<PathBuf> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let dir = Path::new(folder_name).join(stamp);
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    Ok(dir)
}

/// Serialize the full record list and write it in one call. Returns the path
/// of the written snapshot.
pub fn write_snapshot(records: &[ExportedUser], output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join(SNAPSHOT_FILENAME);
    let json = serde_json::to_string_pretty(records).context("Failed to serialize user data")?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snapshot_is_a_parseable_pretty_printed_array() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![ExportedUser::from_parts(
            serde_json::from_value(json!({"employeeNo": "1", "name": "One"})).unwrap(),
            None,
            None,
            Vec::new(),
        )];

        let path = write_snapshot(&records, dir.path()).unwrap();

        assert_eq!(path.file_name().unwrap(), SNAPSHOT_FILENAME);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains('\n'), "snapshot should be pretty-printed");
        let parsed: Vec<ExportedUser> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, records);
    }
}
