//! Structural Validator.
//!
//! Rejects edits that cannot be hot-swapped before the front end runs:
//!
//! | Check                 | Compared by                          | Error                  |
//! |-----------------------|--------------------------------------|------------------------|
//! | property initializers | normalized text (delegates included) | `FIELD_MODIFIED`       |
//! | enum entries          | declaration order + argument text    | `ENUM_CHANGED`         |
//! | constructors          | parameter list + delegation call     | `CONSTRUCTOR_MODIFIED` |
//!
//! Declarations present on one side only are not reported here; the class
//! differ sees the resulting member changes. Pure and synchronous.

mod error;
mod state;

use std::collections::BTreeSet;

pub use error::{UnsupportedSyntaxKind, ValidationError, ValidationErrorKind};
pub use state::{EnumEntryShape, ValidationState};

use crate::syntax::SyntaxNode;

/// Validate an edited tree against its snapshot.
pub fn validate_trees(before: &SyntaxNode, after: &SyntaxNode) -> Vec<ValidationError> {
    validate(
        &ValidationState::capture(before),
        &ValidationState::capture(after),
    )
}

/// Compare two captured states, reporting every unsupported change.
pub fn validate(before: &ValidationState, after: &ValidationState) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (name, old) in &before.properties {
        if let Some(new) = after.properties.get(name)
            && old != new
        {
            errors.push(ValidationError::new(
                ValidationErrorKind::FieldModified,
                name,
                format!("initializer changed from `{old}` to `{new}`"),
            ));
        }
    }

    for class in before.constructors.keys().filter(|c| after.has_class(c)) {
        let empty = Vec::new();
        let old = before.enums.get(class).unwrap_or(&empty);
        let new = after.enums.get(class).unwrap_or(&empty);
        if let Some(detail) = describe_enum_change(old, new) {
            errors.push(ValidationError::new(
                ValidationErrorKind::EnumChanged,
                class,
                detail,
            ));
        }

        let old = &before.constructors[class];
        let new = &after.constructors[class];
        if old != new {
            errors.push(ValidationError::new(
                ValidationErrorKind::ConstructorModified,
                class,
                format!("[{}] -> [{}]", old.join(", "), new.join(", ")),
            ));
        }
    }

    errors
}

/// Non-fatal observations: which kinds of declaration the edit touched.
pub fn observe(before: &ValidationState, after: &ValidationState) -> BTreeSet<UnsupportedSyntaxKind> {
    let mut touched = BTreeSet::new();
    if before.imports != after.imports {
        touched.insert(UnsupportedSyntaxKind::ImportDirective);
    }
    if before.constructors != after.constructors {
        touched.insert(UnsupportedSyntaxKind::Constructor);
    }
    if before.init_blocks != after.init_blocks {
        touched.insert(UnsupportedSyntaxKind::InitBlock);
    }
    if before.enums != after.enums {
        touched.insert(UnsupportedSyntaxKind::EnumEntry);
    }
    if before.properties != after.properties {
        touched.insert(UnsupportedSyntaxKind::PropertyInitializer);
    }
    touched
}

fn describe_enum_change(old: &[EnumEntryShape], new: &[EnumEntryShape]) -> Option<String> {
    if old == new {
        return None;
    }

    let old_names: Vec<&str> = old.iter().map(|e| e.name.as_str()).collect();
    let new_names: Vec<&str> = new.iter().map(|e| e.name.as_str()).collect();

    let added: Vec<&str> = new_names
        .iter()
        .copied()
        .filter(|n| !old_names.contains(n))
        .collect();
    if !added.is_empty() {
        return Some(format!("entry added: {}", added.join(", ")));
    }

    let removed: Vec<&str> = old_names
        .iter()
        .copied()
        .filter(|n| !new_names.contains(n))
        .collect();
    if !removed.is_empty() {
        return Some(format!("entry removed: {}", removed.join(", ")));
    }

    if old_names != new_names {
        return Some(format!(
            "entries reordered: {} -> {}",
            old_names.join(", "),
            new_names.join(", ")
        ));
    }

    old.iter()
        .zip(new)
        .find(|(a, b)| a.args != b.args)
        .map(|(a, b)| format!("arguments of {} changed: `{}` -> `{}`", a.name, a.args, b.args))
}

// =============================================================================
// Tests
// =============================================================================
