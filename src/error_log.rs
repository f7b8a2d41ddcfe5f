use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::errors::BgRemoverError;

pub const ERROR_LOG_FILE_NAME: &str = "background_remover_errors_backlog.txt";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only backlog of conversion failures, kept next to the image.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn for_image(image_path: &Path) -> Self {
        let dir = image_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self {
            path: dir.join(ERROR_LOG_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `<timestamp>\n<report>\n\n`. The file is never rotated.
    pub fn append(&self, error: &BgRemoverError) -> io::Result<()> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        write!(file, "{timestamp}\n{}\n\n", error.report())?;
        file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_log_lives_next_to_image() {
        let log = ErrorLog::for_image(Path::new("/a/b/cat.jpg"));
        assert_eq!(log.path(), Path::new("/a/b/background_remover_errors_backlog.txt"));

        let log = ErrorLog::for_image(Path::new("cat.jpg"));
        assert_eq!(log.path(), Path::new("./background_remover_errors_backlog.txt"));
    }

    #[test]
    fn test_entries_are_appended() -> io::Result<()> {
        let temp_dir = TempDir::new()?;
        let log = ErrorLog::for_image(&temp_dir.path().join("sample.png"));

        log.append(&BgRemoverError::model("Failed to process image"))?;
        log.append(&BgRemoverError::model("second failure"))?;

        let content = fs::read_to_string(log.path())?;
        let entries: Vec<&str> = content.split_terminator("\n\n").collect();
        assert_eq!(entries.len(), 2);

        let mut lines = entries[0].lines();
        let timestamp = lines.next().unwrap_or_default();
        assert!(NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).is_ok());
        assert_eq!(lines.next(), Some("ModelFailure: Failed to process image"));
        assert!(entries[1].ends_with("second failure"));
        assert!(content.ends_with("\n\n"));
        Ok(())
    }

    #[test]
    fn test_unwritable_directory_is_reported() {
        let log = ErrorLog::for_image(Path::new("/nonexistent/dir/cat.png"));
        assert!(log.append(&BgRemoverError::model("x")).is_err());
    }
}
