//! Class Differ.
//!
//! Compares a freshly compiled class with its baseline and classifies every
//! structural difference. Checks run in a fixed order and stop at the first
//! error:
//!
//! ```text
//! support class? ──yes──> shipped whole, never an error
//!       │no
//! superclass ─> interfaces ─> fields ─> static initializer ─> method slots
//! ```
//!
//! Matched method slots whose bodies differ are redefinitions and always
//! accepted. A class without baseline is new and accepted unconditionally.

mod error;

use std::collections::BTreeSet;

pub use error::{DiffError, DiffErrorKind};

use crate::ir::{ClassProvider, IrClass, MethodSlot, SupportKind, classify};

/// Accepted difference between a compiled class and its baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDiff {
    pub name: String,
    /// No baseline existed.
    pub is_new: bool,
    pub support: Option<SupportKind>,
    /// Matched slots whose body changed.
    pub redefined: Vec<MethodSlot>,
    /// Slots present only in the new class (support classes only).
    pub added_methods: Vec<MethodSlot>,
    /// Whether the class differs from its baseline at all.
    pub changed: bool,
}

impl ClassDiff {
    pub fn is_support(&self) -> bool {
        self.support.is_some()
    }
}

/// Diff one class against an optional baseline.
pub fn diff_class(new: &IrClass, baseline: Option<&IrClass>) -> Result<ClassDiff, DiffError> {
    let support = classify(new);

    let Some(old) = baseline else {
        return Ok(ClassDiff {
            name: new.name.clone(),
            is_new: true,
            support,
            redefined: Vec::new(),
            added_methods: Vec::new(),
            changed: true,
        });
    };

    if support.is_none() {
        check_hierarchy(old, new)?;
        check_fields(old, new)?;
        check_static_initializer(old, new)?;
    }

    let old_slots = old.slots();
    let new_slots = new.slots();

    if support.is_none() {
        if let Some(removed) = old_slots
            .difference(&new_slots)
            .find(|s| !is_static_initializer(s))
        {
            return Err(DiffError::new(
                &new.name,
                DiffErrorKind::RemovedMethod,
                removed.to_string(),
            ));
        }
        if let Some(added) = new_slots
            .difference(&old_slots)
            .find(|s| !is_static_initializer(s))
        {
            return Err(DiffError::new(
                &new.name,
                DiffErrorKind::AddedMethod,
                added.to_string(),
            ));
        }
    }

    let redefined: Vec<MethodSlot> = new
        .methods
        .iter()
        .filter(|m| {
            old.method(&m.name, &m.desc)
                .is_some_and(|prior| prior.body != m.body)
        })
        .map(|m| m.slot())
        .collect();

    let added_methods: Vec<MethodSlot> = new_slots.difference(&old_slots).cloned().collect();

    Ok(ClassDiff {
        name: new.name.clone(),
        is_new: false,
        support,
        redefined,
        added_methods,
        changed: old != new,
    })
}

/// Diff every class of one compilation against the baseline.
///
/// Aborts on the first error; partial results are never returned.
pub fn diff_all(classes: &[IrClass], baseline: &dyn ClassProvider) -> Result<Vec<ClassDiff>, DiffError> {
    classes
        .iter()
        .map(|class| {
            let prior = baseline.get_class(&class.name);
            let diff = diff_class(class, prior.as_ref());
            if let Err(e) = &diff {
                crate::debug!("differ"; "{}", e);
            }
            diff
        })
        .collect()
}

fn is_static_initializer(slot: &MethodSlot) -> bool {
    slot.name == crate::ir::STATIC_INITIALIZER
}

fn check_hierarchy(old: &IrClass, new: &IrClass) -> Result<(), DiffError> {
    if old.super_name != new.super_name {
        return Err(DiffError::new(
            &new.name,
            DiffErrorKind::ModifiedSuper,
            format!(
                "{} -> {}",
                old.super_name.as_deref().unwrap_or("<none>"),
                new.super_name.as_deref().unwrap_or("<none>")
            ),
        ));
    }
    if let Some(added) = new.interfaces.difference(&old.interfaces).next() {
        return Err(DiffError::new(&new.name, DiffErrorKind::AddedInterface, added));
    }
    if let Some(removed) = old.interfaces.difference(&new.interfaces).next() {
        return Err(DiffError::new(&new.name, DiffErrorKind::RemovedInterface, removed));
    }
    Ok(())
}

fn check_fields(old: &IrClass, new: &IrClass) -> Result<(), DiffError> {
    let old_names = old.field_names();
    let new_names = new.field_names();

    if let Some(added) = new_names.difference(&old_names).next() {
        return Err(DiffError::new(&new.name, DiffErrorKind::AddedField, *added));
    }
    if let Some(removed) = old_names.difference(&new_names).next() {
        return Err(DiffError::new(&new.name, DiffErrorKind::RemovedField, *removed));
    }

    let modified: BTreeSet<&str> = new
        .fields
        .iter()
        .filter(|f| old.field(&f.name).is_some_and(|prior| prior != *f))
        .map(|f| f.name.as_str())
        .collect();
    if let Some(name) = modified.first() {
        return Err(DiffError::new(&new.name, DiffErrorKind::ModifiedField, *name));
    }
    Ok(())
}

fn check_static_initializer(old: &IrClass, new: &IrClass) -> Result<(), DiffError> {
    let before = old.static_initializer().map(|m| m.body);
    let after = new.static_initializer().map(|m| m.body);
    if before != after {
        let detail = match (before, after) {
            (None, Some(_)) => "static initializer added",
            (Some(_), None) => "static initializer removed",
            _ => "static initializer body changed",
        };
        return Err(DiffError::new(
            &new.name,
            DiffErrorKind::ModifiedStaticInitializer,
            detail,
        ));
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ArtifactSnapshot, IrField, IrMethod, STATIC_INITIALIZER};

    fn point() -> IrClass {
        IrClass::new("com/example/Point")
            .with_field(IrField::new("x", "I"))
            .with_method(IrMethod::new("foo", "()I", "return 1"))
            .with_method(IrMethod::new("getX", "()I", "return x"))
    }

    fn error_kind(new: &IrClass, old: &IrClass) -> DiffErrorKind {
        diff_class(new, Some(old)).unwrap_err().kind
    }

    #[test]
    fn test_body_change_is_redefinition() {
        let old = point();
        let mut new = point();
        new.methods[0] = IrMethod::new("foo", "()I", "return 2");

        let diff = diff_class(&new, Some(&old)).unwrap();
        assert_eq!(diff.redefined, vec![MethodSlot::new("foo", "()I")]);
        assert!(diff.changed);
        assert!(!diff.is_new);
    }

    #[test]
    fn test_identical_class_is_unchanged() {
        let diff = diff_class(&point(), Some(&point())).unwrap();
        assert!(!diff.changed);
        assert!(diff.redefined.is_empty());
    }

    #[test]
    fn test_new_class_accepted() {
        let diff = diff_class(&point(), None).unwrap();
        assert!(diff.is_new);
        assert!(diff.changed);
    }

    #[test]
    fn test_field_set_must_match() {
        let added = point().with_field(IrField::new("y", "I"));
        let err = diff_class(&added, Some(&point())).unwrap_err();
        assert_eq!(err.kind, DiffErrorKind::AddedField);
        assert_eq!(err.detail, "y");

        let mut removed = point();
        removed.fields.clear();
        assert_eq!(error_kind(&removed, &point()), DiffErrorKind::RemovedField);

        let mut retyped = point();
        retyped.fields[0] = IrField::new("x", "J");
        assert_eq!(error_kind(&retyped, &point()), DiffErrorKind::ModifiedField);
    }

    #[test]
    fn test_method_slots_must_match() {
        let added = point().with_method(IrMethod::new("bar", "()V", ""));
        assert_eq!(error_kind(&added, &point()), DiffErrorKind::AddedMethod);

        let mut removed = point();
        removed.methods.remove(1);
        assert_eq!(error_kind(&removed, &point()), DiffErrorKind::RemovedMethod);

        // Descriptor change is a removal plus an addition
        let mut resigned = point();
        resigned.methods[0] = IrMethod::new("foo", "()J", "return 1");
        assert_eq!(error_kind(&resigned, &point()), DiffErrorKind::RemovedMethod);
    }

    #[test]
    fn test_hierarchy_changes() {
        let rebased = point().with_super("com/example/Shape");
        assert_eq!(error_kind(&rebased, &point()), DiffErrorKind::ModifiedSuper);

        let comparable = point().with_interface("java/lang/Comparable");
        assert_eq!(error_kind(&comparable, &point()), DiffErrorKind::AddedInterface);
        assert_eq!(error_kind(&point(), &comparable), DiffErrorKind::RemovedInterface);
    }

    #[test]
    fn test_static_initializer_changes() {
        let with_clinit = |body: &str| point().with_method(IrMethod::new(STATIC_INITIALIZER, "()V", body));

        assert_eq!(
            error_kind(&with_clinit("x = 1"), &with_clinit("x = 0")),
            DiffErrorKind::ModifiedStaticInitializer
        );
        assert_eq!(
            error_kind(&with_clinit("x = 1"), &point()),
            DiffErrorKind::ModifiedStaticInitializer
        );
        assert!(diff_class(&with_clinit("x = 1"), Some(&with_clinit("x = 1"))).is_ok());
    }

    #[test]
    fn test_support_class_exempt() {
        let old = IrClass::new("com/example/MainKt$main$1")
            .with_super("kotlin/jvm/internal/Lambda")
            .with_field(IrField::new("$captured", "I"))
            .with_method(IrMethod::new("invoke", "()V", "a"));
        let new = IrClass::new("com/example/MainKt$main$1")
            .with_super("kotlin/jvm/internal/Lambda")
            .with_field(IrField::new("$other", "J"))
            .with_method(IrMethod::new("invoke", "()V", "b"))
            .with_method(IrMethod::new("invoke", "(Ljava/lang/Object;)Ljava/lang/Object;", "c"))
            .with_method(IrMethod::new(STATIC_INITIALIZER, "()V", "d"));

        let diff = diff_class(&new, Some(&old)).unwrap();
        assert_eq!(diff.support, Some(SupportKind::Lambda));
        assert!(diff.changed);
        assert_eq!(diff.added_methods.len(), 2);
        assert_eq!(diff.redefined, vec![MethodSlot::new("invoke", "()V")]);
    }

    #[test]
    fn test_named_nested_class_is_diffed() {
        let old = IrClass::new("com/example/Outer$Companion");
        let new = old.clone().with_field(IrField::static_field("MAX", "I"));
        assert_eq!(error_kind(&new, &old), DiffErrorKind::AddedField);
    }

    #[test]
    fn test_diff_all_aborts_on_first_error() {
        let baseline = ArtifactSnapshot::new([point(), IrClass::new("com/example/Other")]);
        let classes = vec![
            point(),
            IrClass::new("com/example/Other").with_field(IrField::new("z", "I")),
            IrClass::new("com/example/Fresh"),
        ];
        let err = diff_all(&classes, &baseline).unwrap_err();
        assert_eq!(err.class, "com/example/Other");

        let ok = diff_all(&[point(), IrClass::new("com/example/Fresh")], &baseline).unwrap();
        assert_eq!(ok.len(), 2);
        assert!(!ok[0].changed);
        assert!(ok[1].is_new);
    }
}
