use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structural differences that cannot be applied to a live process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiffErrorKind {
    AddedField,
    RemovedField,
    /// Same field name, different type or staticness.
    ModifiedField,
    AddedMethod,
    RemovedMethod,
    ModifiedSuper,
    AddedInterface,
    RemovedInterface,
    ModifiedStaticInitializer,
}

impl DiffErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::AddedField => "ADDED_FIELD",
            Self::RemovedField => "REMOVED_FIELD",
            Self::ModifiedField => "MODIFIED_FIELD",
            Self::AddedMethod => "ADDED_METHOD",
            Self::RemovedMethod => "REMOVED_METHOD",
            Self::ModifiedSuper => "MODIFIED_SUPER",
            Self::AddedInterface => "ADDED_INTERFACE",
            Self::RemovedInterface => "REMOVED_INTERFACE",
            Self::ModifiedStaticInitializer => "MODIFIED_STATIC_INITIALIZER",
        }
    }

    /// Human-readable phrase used in user-facing messages.
    pub fn describe(self) -> &'static str {
        match self {
            Self::AddedField => "added a field",
            Self::RemovedField => "removed a field",
            Self::ModifiedField => "modified a field",
            Self::AddedMethod => "added a method",
            Self::RemovedMethod => "removed a method",
            Self::ModifiedSuper => "changed the superclass",
            Self::AddedInterface => "added an interface",
            Self::RemovedInterface => "removed an interface",
            Self::ModifiedStaticInitializer => "modified a static initializer",
        }
    }
}

impl fmt::Display for DiffErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind} in {class}: {detail}")]
pub struct DiffError {
    pub class: String,
    pub kind: DiffErrorKind,
    /// Offending member (field name, method slot, type name).
    pub detail: String,
}

impl DiffError {
    pub fn new(class: impl Into<String>, kind: DiffErrorKind, detail: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            kind,
            detail: detail.into(),
        }
    }
}
