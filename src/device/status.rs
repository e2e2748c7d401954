//! Per-device live edit status.

use std::fmt;

use crate::transport::RuntimeError;

/// Where an error status came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorOrigin {
    /// Validation, diffing or the front end.
    Compile,
    /// The device rejected a pushed patch.
    Push,
    /// The app's runtime library is too old for live edit.
    ComposeVersion,
    /// Recomposition failed after a patch was applied.
    Recomposition,
    /// Runtime errors could not be retrieved.
    Retrieval,
    /// The edit session itself gave up (e.g. too many buffered edits).
    Session,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusError {
    pub message: String,
    /// Further edits can clear the error; otherwise a redeploy is needed.
    pub recoverable: bool,
    pub origin: ErrorOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisabledReason {
    /// The device is not registered.
    Unregistered,
    /// A run targeting the device started; waiting for its deploy.
    PendingDeploy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceStatus {
    /// App deployed, waiting for the process to attach.
    Loading,
    /// A compilation for this device is running.
    InProgress,
    UpToDate,
    /// Edits are buffered and not yet applied.
    OutOfDate,
    CompilationError(StatusError),
    Disabled(DisabledReason),
    DebuggerAttached,
    /// Another device of a multi-device run owns live edit.
    NoMultiDeploy,
    /// The build configuration changed; a resync is required.
    SyncNeeded,
    /// Device API level is below the supported minimum.
    UnsupportedVersion,
    /// Another connected device has an unsupported API level.
    UnsupportedVersionOtherDevice,
}

impl DeviceStatus {
    /// Paused by an error further edits can fix.
    pub fn paused(message: impl Into<String>) -> Self {
        Self::error(message, true, ErrorOrigin::Compile)
    }

    /// Error that requires re-running the app.
    pub fn rerunnable(message: impl Into<String>, origin: ErrorOrigin) -> Self {
        Self::error(message, false, origin)
    }

    pub fn error(message: impl Into<String>, recoverable: bool, origin: ErrorOrigin) -> Self {
        Self::CompilationError(StatusError {
            message: message.into(),
            recoverable,
            origin,
        })
    }

    pub fn recomposition_error(error: &RuntimeError) -> Self {
        Self::error(
            format!("{}: {}", error.exception, error.message),
            error.recoverable,
            ErrorOrigin::Recomposition,
        )
    }

    pub fn retrieval_error(error: &impl fmt::Display) -> Self {
        Self::error(
            format!("unable to retrieve runtime status: {error}"),
            true,
            ErrorOrigin::Retrieval,
        )
    }

    pub fn is_unrecoverable(&self) -> bool {
        matches!(self, Self::CompilationError(e) if !e.recoverable)
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled(_))
    }

    /// Patches are pushed to the device in this status.
    pub fn is_editable(&self) -> bool {
        !matches!(self, Self::Disabled(_) | Self::NoMultiDeploy)
    }

    /// Status the broad editable update keeps in place.
    pub fn is_sticky(&self) -> bool {
        self.is_unrecoverable() || !self.is_editable()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::InProgress => "in progress",
            Self::UpToDate => "up to date",
            Self::OutOfDate => "out of date",
            Self::CompilationError(e) if e.recoverable => "paused",
            Self::CompilationError(_) => "error",
            Self::Disabled(_) => "disabled",
            Self::DebuggerAttached => "debugger attached",
            Self::NoMultiDeploy => "multi-deploy unsupported",
            Self::SyncNeeded => "sync needed",
            Self::UnsupportedVersion => "unsupported version",
            Self::UnsupportedVersionOtherDevice => "unsupported version on other device",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CompilationError(e) => write!(f, "{}: {}", self.label(), e.message),
            _ => f.write_str(self.label()),
        }
    }
}
