//! `[session]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [session]
//! trigger = "auto"            # auto | manual
//! refresh_rate_ms = 200       # delay before retrying a cancelled compile
//! max_buffered_edits = 2000   # manual mode: edits kept before giving up
//! confined_analysis = false   # errors in other files do not pause devices
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// When buffered edits are compiled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    /// Compile as soon as an edit arrives.
    #[default]
    Auto,
    /// Buffer edits until an explicit trigger.
    Manual,
}

/// Edit session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub trigger: TriggerMode,

    /// Delay before a cancelled compile is retried.
    pub refresh_rate_ms: u64,

    /// Manual mode buffer limit.
    pub max_buffered_edits: usize,

    /// Only the edited file is analyzed, so errors elsewhere are not
    /// tracked across edits.
    pub confined_analysis: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            trigger: TriggerMode::Auto,
            refresh_rate_ms: 200,
            max_buffered_edits: 2000,
            confined_analysis: false,
        }
    }
}

impl SessionConfig {
    pub fn refresh_rate(&self) -> Duration {
        Duration::from_millis(self.refresh_rate_ms)
    }

    pub fn is_manual(&self) -> bool {
        self.trigger == TriggerMode::Manual
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.max_buffered_edits == 0 {
            diag.error_with_hint(
                FieldPath::new("session.max_buffered_edits"),
                "must be greater than 0",
                "the default is 2000",
            );
        }
    }
}
