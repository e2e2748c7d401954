use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of structural changes that cannot be hot-swapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationErrorKind {
    /// Initializer of a top-level or class property changed (delegates included).
    FieldModified,
    /// Enum entry added, removed, reordered, or its arguments changed.
    EnumChanged,
    /// Constructor parameter list or delegation call changed.
    ConstructorModified,
}

impl ValidationErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::FieldModified => "FIELD_MODIFIED",
            Self::EnumChanged => "ENUM_CHANGED",
            Self::ConstructorModified => "CONSTRUCTOR_MODIFIED",
        }
    }
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind} in {declaration}: {detail}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    /// Qualified declaration the change was found in (`Outer.Inner.prop`).
    pub declaration: String,
    pub detail: String,
}

impl ValidationError {
    pub fn new(
        kind: ValidationErrorKind,
        declaration: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            declaration: declaration.into(),
            detail: detail.into(),
        }
    }
}

/// Non-fatal observation about what an edit touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsupportedSyntaxKind {
    ImportDirective,
    Constructor,
    InitBlock,
    EnumEntry,
    PropertyInitializer,
}

impl UnsupportedSyntaxKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::ImportDirective => "import directive",
            Self::Constructor => "constructor",
            Self::InitBlock => "init block",
            Self::EnumEntry => "enum entry",
            Self::PropertyInitializer => "property initializer",
        }
    }
}

impl fmt::Display for UnsupportedSyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
