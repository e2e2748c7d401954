//! Live Edit Message Protocol
//!
//! JSON messages exchanged with the agent running inside the app process.
//!
//! # Message Types
//!
//! - `patch`: classes to redefine plus the invalidation scope
//!
//! Runtime errors come back through `DeviceTransport::runtime_errors`.

use serde::{Deserialize, Serialize};

use crate::compiler::{InvalidateMode, LiveEditCompilerOutput};
use crate::ir::{GroupId, IrClass};

/// Patch sent to one app process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchMessage {
    pub app_id: String,
    pub classes: Vec<IrClass>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub support_classes: Vec<IrClass>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_ids: Vec<GroupId>,
    pub invalidate_mode: InvalidateMode,
    /// Agent runs in verbose debug mode.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub debug: bool,
}

impl PatchMessage {
    pub fn new(app_id: impl Into<String>, output: &LiveEditCompilerOutput) -> Self {
        Self {
            app_id: app_id.into(),
            classes: output.classes.values().cloned().collect(),
            support_classes: output.support_classes.values().cloned().collect(),
            group_ids: output.group_ids.iter().copied().collect(),
            invalidate_mode: output.invalidate_mode(),
            debug: false,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.support_classes.is_empty()
    }
}

/// Runtime error raised while recomposing after a patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeError {
    /// Exception class name.
    pub exception: String,
    pub message: String,
    /// The runtime recovered (the edit can be fixed by editing further).
    #[serde(default)]
    pub recoverable: bool,
}

/// Message on the agent connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LiveEditMessage {
    Patch(PatchMessage),
}

impl LiveEditMessage {
    pub fn patch(message: PatchMessage) -> Self {
        Self::Patch(message)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
