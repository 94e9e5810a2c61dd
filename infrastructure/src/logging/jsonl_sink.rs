//! JSONL file sink for timeline events.
//!
//! Each appended [`TimelineEvent`] is serialized as a single JSON line.
//! This is a fire-and-forget subscriber: write failures are logged and
//! swallowed, never surfaced to the engine.

use accord_application::ports::timeline_sink::TimelineSink;
use accord_domain::TimelineEvent;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Timeline sink that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes on `Drop`.
pub struct JsonlTimelineSink {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlTimelineSink {
    /// Create a new sink writing to the given path.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be created.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create timeline log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match File::create(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not create timeline log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TimelineSink for JsonlTimelineSink {
    fn publish(&self, event: &TimelineEvent) {
        let Ok(line) = serde_json::to_string(event) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            // Flush per event; the file is append-only
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlTimelineSink {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
