use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::trace::event::TraceEvent;

/// Appends pipeline trace events to a JSONL file.
///
/// Tracing never fails the pipeline: an unopenable file leaves the logger
/// disabled and a failed append is reported once per event as a warning.
pub struct TraceLogger {
    sink: Option<(PathBuf, Mutex<File>)>,
}

impl TraceLogger {
    /// Open `path` for appending, or build a disabled logger for `None`.
    pub fn open(path: Option<&Path>) -> Self {
        let sink = path.and_then(|path| {
            match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => Some((path.to_path_buf(), Mutex::new(file))),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "trace disabled");
                    None
                }
            }
        });
        Self { sink }
    }

    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::open(Some(path.as_ref()))
    }

    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.sink.as_ref().map(|(path, _)| path.as_path())
    }

    pub fn log(&self, event: &TraceEvent) {
        let Some((path, file)) = &self.sink else {
            return;
        };
        if let Err(e) = append_line(file, event) {
            tracing::warn!(path = %path.display(), stage = ?event.stage, error = %e, "trace event dropped");
        }
    }
}

fn append_line(file: &Mutex<File>, event: &TraceEvent) -> io::Result<()> {
    let json = serde_json::to_string(event)?;
    let mut file = file
        .lock()
        .map_err(|_| io::Error::other("trace file lock poisoned"))?;
    writeln!(file, "{}", json)
}
