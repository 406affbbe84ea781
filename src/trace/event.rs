use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::mapping::mapping_model::ResolutionSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Detect,
    Resolve,
    Fill,
    Validate,
}

/// One JSONL line per pipeline stage.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub stage: Stage,

    pub field_count: usize,

    pub source: Option<String>,
    pub filled: Option<usize>,
    pub violations: Option<usize>,

    pub note: Option<String>,
}

impl TraceEvent {
    pub fn now(stage: Stage, field_count: usize) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            stage,
            field_count,
            source: None,
            filled: None,
            violations: None,
            note: None,
        }
    }

    pub fn with_source(mut self, source: ResolutionSource) -> Self {
        self.source = Some(source.to_string());
        self
    }

    pub fn with_filled(mut self, filled: usize) -> Self {
        self.filled = Some(filled);
        self
    }

    pub fn with_violations(mut self, violations: usize) -> Self {
        self.violations = Some(violations);
        self
    }

    pub fn with_note(mut self, note: impl ToString) -> Self {
        self.note = Some(note.to_string());
        self
    }
}
