//! Support-class classification.
//!
//! Support classes are synthesized by the front end to lower closures and
//! adapters. Their member shape follows the lowering, not the user's source,
//! so they are shipped whole instead of being structurally diffed.
//!
//! The recognized constructs are listed explicitly. A class qualifies only if
//! BOTH its name is tied to an enclosing scope in the pattern of the construct
//! AND its base type (superclass or interface) is the one the construct
//! lowers to:
//!
//! | Construct                  | Name pattern                 | Base type                                   |
//! |----------------------------|------------------------------|---------------------------------------------|
//! | lambda / anonymous fun     | `Outer$scope$<n>`            | `kotlin/jvm/internal/Lambda` or `FunctionN` |
//! | suspend lambda             | `Outer$scope$<n>`            | `SuspendLambda` / `RestrictedSuspendLambda` |
//! | callable reference         | `Outer$scope$<n>`            | `FunctionReference*` / `PropertyReference*` |
//! | SAM adapter (incl. generic)| `Outer$sam$[i$]<Iface>$<n>`  | any interface, `java/lang/Object` super     |
//! | interface default methods  | `Iface$DefaultImpls`         | `java/lang/Object`, no interfaces/fields    |
//!
//! Anonymous objects (`object : Runnable {}`), named local classes, nested
//! classes, objects and companions never qualify.

use serde::{Deserialize, Serialize};

use super::class::IrClass;

const OBJECT: &str = "java/lang/Object";

const LAMBDA_BASES: &[&str] = &["kotlin/jvm/internal/Lambda"];

const SUSPEND_LAMBDA_BASES: &[&str] = &[
    "kotlin/coroutines/jvm/internal/SuspendLambda",
    "kotlin/coroutines/jvm/internal/RestrictedSuspendLambda",
];

const REFERENCE_BASES: &[&str] = &[
    "kotlin/jvm/internal/FunctionReference",
    "kotlin/jvm/internal/FunctionReferenceImpl",
    "kotlin/jvm/internal/AdaptedFunctionReference",
    "kotlin/jvm/internal/PropertyReference0Impl",
    "kotlin/jvm/internal/PropertyReference1Impl",
    "kotlin/jvm/internal/PropertyReference2Impl",
];

/// Prefix of the arity-indexed function interfaces (`Function0` .. `FunctionN`).
const FUNCTION_INTERFACE_PREFIX: &str = "kotlin/jvm/functions/Function";

const SAM_SEGMENT: &str = "$sam$";
const DEFAULT_IMPLS: &str = "DefaultImpls";

/// Kind of compiler-synthesized support class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportKind {
    Lambda,
    SuspendLambda,
    CallableReference,
    SamAdapter,
    DefaultImpls,
}

impl SupportKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Lambda => "lambda",
            Self::SuspendLambda => "suspend lambda",
            Self::CallableReference => "callable reference",
            Self::SamAdapter => "sam adapter",
            Self::DefaultImpls => "default impls",
        }
    }
}

/// Classify a class as a support class, or `None` for ordinary classes.
pub fn classify(class: &IrClass) -> Option<SupportKind> {
    // Every support class is named after its enclosing scope
    class.outer_name()?;

    let super_name = class.super_name.as_deref().unwrap_or(OBJECT);

    if class.name.contains(SAM_SEGMENT) {
        return (super_name == OBJECT && !class.interfaces.is_empty())
            .then_some(SupportKind::SamAdapter);
    }

    if class.simple_name() == DEFAULT_IMPLS {
        return (super_name == OBJECT && class.interfaces.is_empty() && class.fields.is_empty())
            .then_some(SupportKind::DefaultImpls);
    }

    if !is_anonymous_index(class.simple_name()) {
        return None;
    }

    if LAMBDA_BASES.contains(&super_name) {
        return Some(SupportKind::Lambda);
    }
    if SUSPEND_LAMBDA_BASES.contains(&super_name) {
        return Some(SupportKind::SuspendLambda);
    }
    if REFERENCE_BASES.contains(&super_name) {
        return Some(SupportKind::CallableReference);
    }
    // Lambdas lowered without the `Lambda` base implement `FunctionN` directly
    if super_name == OBJECT && class.interfaces.iter().any(|i| is_function_interface(i)) {
        return Some(SupportKind::Lambda);
    }

    None
}

pub fn is_support_class(class: &IrClass) -> bool {
    classify(class).is_some()
}

/// `1`, `42`: the index the front end gives to anonymous classes.
fn is_anonymous_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn is_function_interface(name: &str) -> bool {
    name.strip_prefix(FUNCTION_INTERFACE_PREFIX)
        .is_some_and(|arity| is_anonymous_index(arity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{IrField, IrMethod};

    #[test]
    fn test_lambda() {
        let class = IrClass::new("com/example/MainKt$main$1").with_super("kotlin/jvm/internal/Lambda");
        assert_eq!(classify(&class), Some(SupportKind::Lambda));
    }

    #[test]
    fn test_lambda_via_function_interface() {
        let class = IrClass::new("com/example/MainKt$onClick$2")
            .with_interface("kotlin/jvm/functions/Function1");
        assert_eq!(classify(&class), Some(SupportKind::Lambda));
    }

    #[test]
    fn test_suspend_lambda_and_reference() {
        let suspend = IrClass::new("com/example/Vm$load$1")
            .with_super("kotlin/coroutines/jvm/internal/SuspendLambda");
        assert_eq!(classify(&suspend), Some(SupportKind::SuspendLambda));

        let reference = IrClass::new("com/example/MainKt$render$3")
            .with_super("kotlin/jvm/internal/FunctionReferenceImpl");
        assert_eq!(classify(&reference), Some(SupportKind::CallableReference));
    }

    #[test]
    fn test_sam_adapters() {
        let plain = IrClass::new("com/example/MainKt$sam$java_lang_Runnable$0")
            .with_interface("java/lang/Runnable");
        assert_eq!(classify(&plain), Some(SupportKind::SamAdapter));

        let generic = IrClass::new("com/example/MainKt$sam$i$java_util_function_Function$0")
            .with_interface("java/util/function/Function");
        assert_eq!(classify(&generic), Some(SupportKind::SamAdapter));

        // No interface to adapt to
        let bogus = IrClass::new("com/example/MainKt$sam$Thing$0");
        assert_eq!(classify(&bogus), None);
    }

    #[test]
    fn test_default_impls() {
        let holder = IrClass::new("com/example/Greeter$DefaultImpls")
            .with_method(IrMethod::new("greet", "(Lcom/example/Greeter;)V", "..."));
        assert_eq!(classify(&holder), Some(SupportKind::DefaultImpls));

        let with_state = IrClass::new("com/example/Greeter$DefaultImpls")
            .with_field(IrField::new("cache", "I"));
        assert_eq!(classify(&with_state), None);
    }

    #[test]
    fn test_ordinary_classes_are_not_support() {
        let cases = [
            // top-level
            IrClass::new("com/example/MainKt"),
            // nested
            IrClass::new("com/example/Outer$Inner"),
            // companion
            IrClass::new("com/example/Outer$Companion"),
            // named local class extending the lambda base
            IrClass::new("com/example/MainKt$main$Local").with_super("kotlin/jvm/internal/Lambda"),
            // anonymous object implementing a plain interface
            IrClass::new("com/example/MainKt$main$1").with_interface("java/lang/Runnable"),
            // anonymous subclass of a user type
            IrClass::new("com/example/MainKt$main$2").with_super("com/example/Base"),
        ];
        for class in &cases {
            assert!(!is_support_class(class), "{} classified as support", class.name);
        }
    }

    #[test]
    fn test_function_interface_prefix() {
        assert!(is_function_interface("kotlin/jvm/functions/Function0"));
        assert!(is_function_interface("kotlin/jvm/functions/Function22"));
        assert!(!is_function_interface("kotlin/jvm/functions/FunctionN"));
        assert!(!is_function_interface("kotlin/Function"));
    }
}
