//! Device/transport collaborator.
//!
//! Ships patches to a running app process and reports what the device
//! refused or what failed at runtime afterwards.

mod message;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use message::{LiveEditMessage, PatchMessage, RuntimeError};

/// Identifier of a connected device (serial number).
pub type DeviceId = String;

/// Change the device rejected when applying a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnsupportedChangeKind {
    AddedMethod,
    RemovedMethod,
    AddedClass,
    AddedField,
    ModifiedField,
    RemovedField,
    ModifiedSuper,
    AddedInterface,
    RemovedInterface,
    UnsupportedComposeVersion,
    Unknown,
}

impl UnsupportedChangeKind {
    /// Status code reported for a rejected push.
    pub fn status_code(self) -> &'static str {
        match self {
            Self::AddedMethod => "UNSUPPORTED_ADDED_METHOD",
            Self::RemovedMethod => "UNSUPPORTED_REMOVED_METHOD",
            Self::AddedClass => "UNSUPPORTED_ADDED_CLASS",
            Self::AddedField | Self::ModifiedField => "UNSUPPORTED_ADDED_FIELD",
            Self::RemovedField => "UNSUPPORTED_REMOVED_FIELD",
            Self::ModifiedSuper | Self::AddedInterface | Self::RemovedInterface => {
                "UNSUPPORTED_MODIFY_INHERITANCE"
            }
            Self::UnsupportedComposeVersion => "UNSUPPORTED_COMPOSE_RUNTIME_VERSION",
            Self::Unknown => "UNKNOWN_LIVE_UPDATE_DEPLOYER_ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsupportedChange {
    pub kind: UnsupportedChangeKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

impl UnsupportedChange {
    pub fn new(kind: UnsupportedChangeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            class: None,
        }
    }
}

impl fmt::Display for UnsupportedChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.status_code(), self.message)
    }
}

/// Result of a push the device accepted at the transport level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushReport {
    #[serde(default)]
    pub errors: Vec<UnsupportedChange>,
}

impl PushReport {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn rejected(change: UnsupportedChange) -> Self {
        Self {
            errors: vec![change],
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn first_error(&self) -> Option<&UnsupportedChange> {
        self.errors.first()
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("device {0} is offline")]
    Offline(DeviceId),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Connection to the agents of running app processes.
pub trait DeviceTransport: Send + Sync {
    fn push(&self, device: &str, patch: &PatchMessage) -> Result<PushReport, TransportError>;

    /// Runtime errors raised since the last query.
    fn runtime_errors(&self, device: &str, app_id: &str) -> Result<Vec<RuntimeError>, TransportError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            UnsupportedChangeKind::ModifiedField.status_code(),
            UnsupportedChangeKind::AddedField.status_code()
        );
        assert_eq!(
            UnsupportedChangeKind::AddedInterface.status_code(),
            "UNSUPPORTED_MODIFY_INHERITANCE"
        );
    }

    #[test]
    fn test_push_report() {
        assert!(PushReport::ok().is_ok());
        let report = PushReport::rejected(UnsupportedChange::new(
            UnsupportedChangeKind::AddedMethod,
            "added method bar()V",
        ));
        assert!(!report.is_ok());
        assert_eq!(
            report.first_error().unwrap().to_string(),
            "UNSUPPORTED_ADDED_METHOD: added method bar()V"
        );
    }
}
