use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Best-effort diagnostic sink. Every entry is mirrored to the process log;
/// when a file is configured it is appended there as well. Write errors are
/// dropped so the log can never change how a submission ends.
#[derive(Debug, Clone)]
pub struct OperationalLog {
    path: Option<PathBuf>,
    tag: String,
}

impl OperationalLog {
    pub fn new(path: Option<PathBuf>, tag: impl Into<String>) -> Self {
        Self {
            path,
            tag: tag.into(),
        }
    }

    pub fn disabled(tag: impl Into<String>) -> Self {
        Self::new(None, tag)
    }

    pub fn with_tag(&self, tag: impl Into<String>) -> Self {
        Self::new(self.path.clone(), tag)
    }

    pub fn write(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        log::info!("{}: {message}", self.tag);

        if let Some(path) = &self.path {
            let line = format!(
                "[{}] {}: {message}\n",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                self.tag
            );
            let appended = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut file| file.write_all(line.as_bytes()));
            if let Err(e) = appended {
                log::debug!("Operational log unavailable ({}): {e}", path.display());
            }
        }
    }
}
