//! Daily log file per tool, mirrored to the console

use crate::config::LogSettings;
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// `<dir>/<prefix>YYYY-MM-DD.log` for today
pub fn log_file_path(settings: &LogSettings) -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d");
    settings.dir.join(format!("{}{date}.log", settings.prefix))
}

/// Install the global subscriber; returns the log file in use
pub fn init(settings: &LogSettings) -> Result<PathBuf> {
    let path = log_file_path(settings);
    let file = open_append(&path)?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file).and(std::io::stdout))
        .with_ansi(false)
        .with_target(false)
        .with_timer(ChronoLocal::new("%H:%M:%S".to_string()))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install the log subscriber: {e}"))?;

    Ok(path)
}

fn open_append(path: &Path) -> Result<std::fs::File> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_name_has_prefix_and_date() {
        let settings = LogSettings {
            dir: PathBuf::from("logs"),
            prefix: "MM_",
        };
        let path = log_file_path(&settings);
        let name = path.file_name().unwrap().to_str().unwrap();

        assert!(path.starts_with("logs"));
        assert!(name.starts_with("MM_"));
        assert!(name.ends_with(".log"));
        assert_eq!(name.len(), "MM_2024-01-01.log".len());
    }

    #[test]
    fn test_open_append_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("FS_2024-01-01.log");
        open_append(&path).unwrap();
        assert!(path.exists());
    }
}
