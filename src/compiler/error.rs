//! Error taxonomy of a compilation request.
//!
//! Construction is pure data assembly; nothing here logs or touches state.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::differ::DiffError;
use crate::validate::{ValidationError, ValidationErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Added/removed class member, modified constructor or static initializer.
    UnsupportedSrcChangeUnrecoverable,
    UnsupportedSrcChangeFieldModified,
    UnsupportedSrcChangeEnum,
    UnsupportedSrcChangeConstructor,
    /// An inlined declaration visible outside its file changed.
    NonPrivateInlineFunction,
    /// Syntax or resolution failure in the edited unit.
    CompilationError,
    UnsupportedBuildSrcChange,
    GradleBuildFile,
    NonKotlin,
    InternalError,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::UnsupportedSrcChangeUnrecoverable => "UNSUPPORTED_SRC_CHANGE_UNRECOVERABLE",
            Self::UnsupportedSrcChangeFieldModified => "UNSUPPORTED_SRC_CHANGE_FIELD_MODIFIED",
            Self::UnsupportedSrcChangeEnum => "UNSUPPORTED_SRC_CHANGE_ENUM",
            Self::UnsupportedSrcChangeConstructor => "UNSUPPORTED_SRC_CHANGE_CONSTRUCTOR",
            Self::NonPrivateInlineFunction => "NON_PRIVATE_INLINE_FUNCTION",
            Self::CompilationError => "COMPILATION_ERROR",
            Self::UnsupportedBuildSrcChange => "UNSUPPORTED_BUILD_SRC_CHANGE",
            Self::GradleBuildFile => "GRADLE_BUILD_FILE",
            Self::NonKotlin => "NON_KOTLIN",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Recoverable errors can be fixed by editing further; the rest need a redeploy.
    pub fn is_recoverable(self) -> bool {
        matches!(self, Self::CompilationError | Self::NonPrivateInlineFunction)
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::UnsupportedSrcChangeUnrecoverable => "Unsupported change",
            Self::UnsupportedSrcChangeFieldModified => "Modified property initializer",
            Self::UnsupportedSrcChangeEnum => "Modified enum",
            Self::UnsupportedSrcChangeConstructor => "Modified constructor",
            Self::NonPrivateInlineFunction => "Modified non-private inline function",
            Self::CompilationError => "Compilation error",
            Self::UnsupportedBuildSrcChange => "Modified buildSrc source",
            Self::GradleBuildFile => "Modified build file",
            Self::NonKotlin => "Modified non-Kotlin source",
            Self::InternalError => "Internal error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Failure of a whole compilation request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", error_message(self))]
pub struct LiveEditUpdateException {
    pub error: ErrorKind,
    pub details: String,
    /// Offending source unit, if known.
    pub source_unit: Option<String>,
    /// Offending class or declaration, if known.
    pub class: Option<String>,
}

impl LiveEditUpdateException {
    pub fn new(error: ErrorKind, details: impl Into<String>) -> Self {
        Self {
            error,
            details: details.into(),
            source_unit: None,
            class: None,
        }
    }

    pub fn in_unit(mut self, unit: impl Into<String>) -> Self {
        self.source_unit = Some(unit.into());
        self
    }

    pub fn in_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn compilation_error(unit: impl Into<String>, details: impl Into<String>) -> Self {
        Self::new(ErrorKind::CompilationError, details).in_unit(unit)
    }

    pub fn non_private_inline(class: impl Into<String>, method: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::NonPrivateInlineFunction,
            format!("inline function {method} is not private"),
        )
        .in_class(class)
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, details)
    }

    pub fn is_recoverable(&self) -> bool {
        self.error.is_recoverable()
    }

    /// Where the error was found: class first, then source unit.
    pub fn location(&self) -> Option<&str> {
        self.class.as_deref().or(self.source_unit.as_deref())
    }
}

impl From<DiffError> for LiveEditUpdateException {
    fn from(e: DiffError) -> Self {
        Self::new(
            ErrorKind::UnsupportedSrcChangeUnrecoverable,
            format!("{} ({})", e.kind.describe(), e.detail),
        )
        .in_class(e.class)
    }
}

impl From<ValidationError> for LiveEditUpdateException {
    fn from(e: ValidationError) -> Self {
        let error = match e.kind {
            ValidationErrorKind::FieldModified => ErrorKind::UnsupportedSrcChangeFieldModified,
            ValidationErrorKind::EnumChanged => ErrorKind::UnsupportedSrcChangeEnum,
            ValidationErrorKind::ConstructorModified => ErrorKind::UnsupportedSrcChangeConstructor,
        };
        Self::new(error, e.detail).in_class(e.declaration)
    }
}

/// User-facing message for an exception.
pub fn error_message(e: &LiveEditUpdateException) -> String {
    let mut message = match e.location() {
        Some(location) => format!("{} in {}", e.error.title(), location),
        None => e.error.title().to_string(),
    };
    if !e.details.is_empty() {
        message.push_str(": ");
        message.push_str(&e.details);
    }
    message
}

/// User-facing message naming only the kind and the file.
pub fn file_error_message(kind: ErrorKind, file: &str) -> String {
    format!("{} in {}", kind.title(), file)
}
