use std::path::{Path, PathBuf};

use tracing::info;
use walkdir::WalkDir;

use crate::error::{Result, SrError};

/// Copies `log_dir` to `<log_dir>_<archive_name>/<model_name>`, replacing
/// any earlier archive of the same model. Returns the archive directory.
///
/// The archive is a sibling of `log_dir`, so a trailing separator on
/// `log_dir` does not move it inside the directory being copied.
pub fn archive_logs(log_dir: &Path, archive_name: &str, model_name: &str) -> Result<PathBuf> {
    let target = archive_root(log_dir, archive_name)?.join(model_name);

    if target.exists() {
        std::fs::remove_dir_all(&target)?;
    }
    std::fs::create_dir_all(&target)?;

    if !log_dir.is_dir() {
        return Ok(target);
    }
    let walker = WalkDir::new(log_dir)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !e.path().starts_with(&target));
    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        let relative = entry.path().strip_prefix(log_dir).unwrap_or(entry.path());
        let dest = target.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest)?;
        } else {
            std::fs::copy(entry.path(), &dest)?;
        }
    }

    info!("Logs archived to {}", target.display());
    Ok(target)
}

/// `<parent>/<name>_<archive_name>` for the last component of `log_dir`.
/// Paths without a final name (`.`, `..`) are resolved first.
fn archive_root(log_dir: &Path, archive_name: &str) -> Result<PathBuf> {
    let resolved = match log_dir.file_name() {
        Some(_) => log_dir.to_path_buf(),
        None => log_dir.canonicalize()?,
    };
    let name = resolved.file_name().ok_or_else(|| {
        SrError::configuration(format!("cannot archive log directory {}", log_dir.display()))
    })?;
    let parent = resolved.parent().unwrap_or_else(|| Path::new(""));
    Ok(parent.join(format!("{}_{archive_name}", name.to_string_lossy())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copies_tree_and_replaces_previous_archive() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        std::fs::create_dir_all(logs.join("nested")).unwrap();
        std::fs::write(logs.join("run.log"), "first").unwrap();
        std::fs::write(logs.join("nested/telemetry.jsonl"), "{}").unwrap();

        let target = archive_logs(&logs, "archive", "model").unwrap();
        assert_eq!(target, dir.path().join("logs_archive/model"));
        assert_eq!(std::fs::read_to_string(target.join("run.log")).unwrap(), "first");
        assert!(target.join("nested/telemetry.jsonl").is_file());

        std::fs::remove_file(logs.join("nested/telemetry.jsonl")).unwrap();
        std::fs::write(logs.join("run.log"), "second").unwrap();
        archive_logs(&logs, "archive", "model").unwrap();
        assert_eq!(std::fs::read_to_string(target.join("run.log")).unwrap(), "second");
        assert!(!target.join("nested/telemetry.jsonl").exists());
    }

    #[test]
    fn test_trailing_separator_archives_next_to_log_dir() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        std::fs::create_dir_all(&logs).unwrap();
        std::fs::write(logs.join("run.log"), "trial").unwrap();

        let with_slash = PathBuf::from(format!("{}/", logs.display()));
        let target = archive_logs(&with_slash, "archive", "model").unwrap();

        assert_eq!(target, dir.path().join("logs_archive/model"));
        assert_eq!(std::fs::read_to_string(target.join("run.log")).unwrap(), "trial");
        assert!(!logs.join("_archive").exists());
        assert_eq!(std::fs::read_dir(&logs).unwrap().count(), 1);
    }

    #[test]
    fn test_archive_root_is_sibling() {
        assert_eq!(archive_root(Path::new("logs"), "archive").unwrap(), PathBuf::from("logs_archive"));
        assert_eq!(
            archive_root(Path::new("runs/logs/"), "archive").unwrap(),
            PathBuf::from("runs/logs_archive")
        );
    }
}
