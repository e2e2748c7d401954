//! Live Edit Compiler.
//!
//! Orchestrates one compilation request:
//!
//! ```text
//! prebuild checks ─> structural validator ─> front end (per module group)
//!        │                   │                        │
//!        └───── fail fast ───┘                        v
//!                                 class differ (cache, then deployed artifact)
//!                                                     │
//!                              partition ─> group ids ─> commit to cache
//! ```
//!
//! A request either yields a complete output or fails as a whole; the cache
//! is only written after every class passed the differ. Cancellation by the
//! front end is an outcome, not an error, and leaves the cache untouched.

mod error;
mod frontend;
mod output;
mod prebuild;
#[cfg(test)]
pub(crate) mod testing;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use rustc_hash::FxHashMap;

pub use error::{ErrorKind, LiveEditUpdateException, error_message, file_error_message};
pub use frontend::{CompileRequest, FrontEnd, FrontEndError};
pub use output::{CompileOutcome, InvalidateMode, LiveEditCompilerOutput};
pub use prebuild::prebuild_check;

use crate::config::CompilerConfig;
use crate::differ::{ClassDiff, diff_all};
use crate::ir::{
    Baseline, ClassProvider, EmptyProvider, IrClass, IrClassCache, IrMethod, MethodSlot,
};
use crate::validate::{ValidationState, validate};

/// One changed source unit with its validator states.
#[derive(Debug, Clone)]
pub struct CompileInput {
    pub request: CompileRequest,
    /// State captured at deploy or when the file was opened.
    pub snapshot: Option<Arc<ValidationState>>,
    /// State of the edited tree.
    pub current: Option<ValidationState>,
}

impl CompileInput {
    pub fn new(request: CompileRequest) -> Self {
        Self {
            request,
            snapshot: None,
            current: None,
        }
    }

    pub fn with_states(mut self, snapshot: Arc<ValidationState>, current: ValidationState) -> Self {
        self.snapshot = Some(snapshot);
        self.current = Some(current);
        self
    }
}

pub struct LiveEditCompiler {
    front_end: Arc<dyn FrontEnd>,
    /// Classes of the deployed build artifact.
    artifact: Arc<dyn ClassProvider>,
    config: CompilerConfig,
    /// A compilation succeeded since the last reset.
    shipped: bool,
}

impl LiveEditCompiler {
    pub fn new(front_end: Arc<dyn FrontEnd>) -> Self {
        Self {
            front_end,
            artifact: Arc::new(EmptyProvider),
            config: CompilerConfig::default(),
            shipped: false,
        }
    }

    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_artifact(mut self, artifact: Arc<dyn ClassProvider>) -> Self {
        self.artifact = artifact;
        self
    }

    /// Replace the deployed-artifact baseline (new deploy).
    pub fn set_artifact(&mut self, artifact: Arc<dyn ClassProvider>) {
        self.artifact = artifact;
    }

    /// Forget that anything was shipped; the next success ships all classes.
    pub fn reset_state(&mut self) {
        self.shipped = false;
    }

    pub fn has_shipped(&self) -> bool {
        self.shipped
    }

    /// Compile, validate and diff the inputs, committing to `cache` on success.
    pub fn compile(
        &mut self,
        inputs: &[CompileInput],
        cache: &mut IrClassCache,
    ) -> Result<CompileOutcome, LiveEditUpdateException> {
        if inputs.is_empty() {
            return Ok(CompileOutcome::Compiled(LiveEditCompilerOutput::default()));
        }
        let start = Instant::now();

        for input in inputs {
            prebuild_check(&input.request.source_unit)?;
        }
        check_structure(inputs)?;

        let compiled = match self.run_front_end(inputs, cache) {
            Ok(classes) => classes,
            Err(FrontEndError::Cancelled) => {
                crate::debug!("compile"; "cancelled by front end");
                return Ok(CompileOutcome::Cancelled);
            }
            Err(FrontEndError::Compilation { unit, detail }) => {
                return Err(LiveEditUpdateException::compilation_error(unit, detail));
            }
            Err(FrontEndError::Internal(detail)) => {
                return Err(LiveEditUpdateException::internal(detail));
            }
        };

        let output = {
            let baseline = Baseline::new(cache, self.artifact.as_ref());
            let diffs = diff_all(&compiled, &baseline)?;
            check_inline(&compiled, &diffs)?;
            self.assemble(&compiled, &diffs)
        };

        let total = compiled.len();
        cache.update_all(compiled);
        self.shipped = true;

        crate::log!(
            "compile";
            "{} of {} classes ({} support) in {:?}",
            output.class_count(),
            total,
            output.support_classes.len(),
            start.elapsed()
        );
        Ok(CompileOutcome::Compiled(output))
    }

    /// Invoke the front end once per module group, merging outputs.
    fn run_front_end(
        &self,
        inputs: &[CompileInput],
        cache: &IrClassCache,
    ) -> Result<Vec<IrClass>, FrontEndError> {
        let mut requests: Vec<CompileRequest> = Vec::with_capacity(inputs.len());
        for input in inputs {
            requests.retain(|r| r.source_unit != input.request.source_unit);
            requests.push(input.request.clone());
        }

        let groups: Vec<Vec<CompileRequest>> =
            if self.config.cross_module && self.front_end.supports_cross_module() {
                vec![requests]
            } else {
                let mut by_module: BTreeMap<String, Vec<CompileRequest>> = BTreeMap::new();
                for request in requests {
                    by_module
                        .entry(request.module.clone())
                        .or_default()
                        .push(request);
                }
                by_module.into_values().collect()
            };

        let baseline = Baseline::new(cache, self.artifact.as_ref());
        let results: Vec<Result<Vec<IrClass>, FrontEndError>> = if groups.len() == 1 {
            vec![self.front_end.compile(&groups[0], &baseline)]
        } else {
            crate::debug!("compile"; "{} module groups", groups.len());
            groups
                .par_iter()
                .map(|group| self.front_end.compile(group, &baseline))
                .collect()
        };

        if results
            .iter()
            .any(|r| matches!(r, Err(FrontEndError::Cancelled)))
        {
            return Err(FrontEndError::Cancelled);
        }

        let mut merged: Vec<IrClass> = Vec::new();
        let mut index: FxHashMap<String, usize> = FxHashMap::default();
        for classes in results {
            for class in classes? {
                match index.get(&class.name) {
                    Some(&i) => merged[i] = class,
                    None => {
                        index.insert(class.name.clone(), merged.len());
                        merged.push(class);
                    }
                }
            }
        }
        Ok(merged)
    }

    /// Partition diffed classes into the output.
    fn assemble(&self, compiled: &[IrClass], diffs: &[ClassDiff]) -> LiveEditCompilerOutput {
        let ship_all = !self.shipped && self.config.ship_all_on_first_edit;
        let mut output = LiveEditCompilerOutput::default();

        for (class, diff) in compiled.iter().zip(diffs) {
            if !diff.changed && !ship_all {
                continue;
            }

            for method in changed_methods(class, diff) {
                match method.group {
                    Some(group) => {
                        output.group_ids.insert(group);
                    }
                    None => output.reset_state = true,
                }
            }

            if !diff.redefined.is_empty() {
                output
                    .redefined
                    .insert(class.name.clone(), diff.redefined.clone());
            }

            let target = if diff.is_support() {
                &mut output.support_classes
            } else {
                &mut output.classes
            };
            target.insert(class.name.clone(), class.clone());
        }

        output
    }
}

/// Run the structural validator on every input that has both states.
fn check_structure(inputs: &[CompileInput]) -> Result<(), LiveEditUpdateException> {
    for input in inputs {
        let (Some(snapshot), Some(current)) = (&input.snapshot, &input.current) else {
            continue;
        };
        let errors = validate(snapshot, current);
        for error in &errors {
            crate::debug!("validate"; "{}: {}", input.request.source_unit, error);
        }
        if let Some(first) = errors.into_iter().next() {
            return Err(LiveEditUpdateException::from(first).in_unit(&input.request.source_unit));
        }
    }
    Ok(())
}

/// Redefined inline functions must be private to their file.
fn check_inline(compiled: &[IrClass], diffs: &[ClassDiff]) -> Result<(), LiveEditUpdateException> {
    for (class, diff) in compiled.iter().zip(diffs) {
        for slot in &diff.redefined {
            if let Some(method) = class.method(&slot.name, &slot.desc)
                && method.flags.is_inline
                && !method.flags.is_private
            {
                return Err(LiveEditUpdateException::non_private_inline(&class.name, slot));
            }
        }
    }
    Ok(())
}

/// Methods whose code changed, for scope computation.
///
/// Synthetic constructors and static initializers of support classes are
/// lowering artifacts and never decide the invalidation scope.
fn changed_methods<'a>(class: &'a IrClass, diff: &ClassDiff) -> Vec<&'a IrMethod> {
    let synthetic = |m: &IrMethod| diff.is_support() && (m.is_constructor() || m.is_static_initializer());

    let is_changed = |m: &IrMethod| {
        if diff.is_new {
            return true;
        }
        let slot = MethodSlot::new(&m.name, &m.desc);
        diff.redefined.contains(&slot) || diff.added_methods.contains(&slot)
    };

    class
        .methods
        .iter()
        .filter(|&m| !synthetic(m) && is_changed(m))
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::testing::FakeFrontEnd;
    use super::*;
    use crate::ir::{ArtifactSnapshot, IrField, MethodFlags};
    use crate::syntax::{NodeKind, SyntaxNode};

    const MAIN: &str = "src/Main.kt";

    fn screen(foo_body: &str, group: Option<i32>) -> IrClass {
        let foo = IrMethod::new("foo", "()I", foo_body);
        let foo = match group {
            Some(g) => foo.in_group(g),
            None => foo,
        };
        IrClass::new("com/example/Screen")
            .with_field(IrField::new("x", "I"))
            .with_method(foo)
            .with_method(IrMethod::new("bar", "()V", "draw()").in_group(7))
    }

    fn helper() -> IrClass {
        IrClass::new("com/example/Helper").with_method(IrMethod::new("help", "()V", "noop"))
    }

    fn setup(artifact: Vec<IrClass>) -> (Arc<FakeFrontEnd>, LiveEditCompiler) {
        let front_end = Arc::new(FakeFrontEnd::new());
        let compiler = LiveEditCompiler::new(front_end.clone())
            .with_artifact(Arc::new(ArtifactSnapshot::new(artifact)));
        (front_end, compiler)
    }

    fn input(unit: &str) -> CompileInput {
        CompileInput::new(CompileRequest::new(unit))
    }

    fn compiled(outcome: CompileOutcome) -> LiveEditCompilerOutput {
        match outcome {
            CompileOutcome::Compiled(output) => output,
            CompileOutcome::Cancelled => panic!("unexpected cancellation"),
        }
    }

    #[test]
    fn test_first_edit_ships_all() {
        let (front_end, mut compiler) = setup(vec![screen("1", Some(3)), helper()]);
        front_end.set(MAIN, vec![screen("1", Some(3)), helper()]);
        let mut cache = IrClassCache::new();

        let output = compiled(compiler.compile(&[input(MAIN)], &mut cache).unwrap());
        assert_eq!(output.class_count(), 2);
        assert!(output.group_ids.is_empty());
        assert!(!output.reset_state);
        assert_eq!(cache.len(), 2);
        assert!(compiler.has_shipped());
    }

    #[test]
    fn test_subsequent_edit_ships_only_changed() {
        let (front_end, mut compiler) = setup(vec![screen("1", Some(3)), helper()]);
        let mut cache = IrClassCache::new();

        front_end.set(MAIN, vec![screen("1", Some(3)), helper()]);
        compiler.compile(&[input(MAIN)], &mut cache).unwrap();

        front_end.set(MAIN, vec![screen("2", Some(3)), helper()]);
        let output = compiled(compiler.compile(&[input(MAIN)], &mut cache).unwrap());
        assert_eq!(output.class_count(), 1);
        assert!(output.classes.contains_key("com/example/Screen"));
        assert_eq!(
            output.redefined["com/example/Screen"],
            vec![MethodSlot::new("foo", "()I")]
        );
        assert_eq!(output.group_ids.iter().copied().collect::<Vec<_>>(), vec![3]);
        assert!(!output.reset_state);
    }

    #[test]
    fn test_edit_outside_scope_resets_state() {
        let (front_end, compiler) = setup(vec![screen("1", None)]);
        let mut cache = IrClassCache::new();
        cache.update(screen("1", None));
        front_end.set(MAIN, vec![screen("2", None)]);

        let mut compiler = compiler.with_config(CompilerConfig {
            ship_all_on_first_edit: false,
            ..CompilerConfig::default()
        });
        let output = compiled(compiler.compile(&[input(MAIN)], &mut cache).unwrap());
        assert_eq!(output.class_count(), 1);
        assert!(output.reset_state);
        assert_eq!(output.invalidate_mode(), InvalidateMode::ResetState);
    }

    #[test]
    fn test_added_field_fails_atomically() {
        let (front_end, mut compiler) = setup(vec![screen("1", Some(3))]);
        front_end.set(
            MAIN,
            vec![helper(), screen("1", Some(3)).with_field(IrField::new("y", "I"))],
        );
        let mut cache = IrClassCache::new();

        let err = compiler.compile(&[input(MAIN)], &mut cache).unwrap_err();
        assert_eq!(err.error, ErrorKind::UnsupportedSrcChangeUnrecoverable);
        assert!(err.details.contains("added a field (y)"));
        assert!(cache.is_empty());
        assert!(!compiler.has_shipped());
    }

    #[test]
    fn test_validation_fails_before_front_end() {
        let (front_end, mut compiler) = setup(vec![]);
        let tree = |init: &str| {
            SyntaxNode::new(NodeKind::File).with_child(
                SyntaxNode::named(NodeKind::Property, "x")
                    .with_child(SyntaxNode::leaf(NodeKind::Initializer, init)),
            )
        };
        let edit = input(MAIN).with_states(
            Arc::new(ValidationState::capture(&tree("0"))),
            ValidationState::capture(&tree("1")),
        );

        let err = compiler
            .compile(&[edit], &mut IrClassCache::new())
            .unwrap_err();
        assert_eq!(err.error, ErrorKind::UnsupportedSrcChangeFieldModified);
        assert_eq!(err.source_unit.as_deref(), Some(MAIN));
        assert_eq!(front_end.call_count(), 0);
    }

    #[test]
    fn test_prebuild_rejects_before_front_end() {
        let (front_end, mut compiler) = setup(vec![]);
        let err = compiler
            .compile(&[input("app/build.gradle.kts")], &mut IrClassCache::new())
            .unwrap_err();
        assert_eq!(err.error, ErrorKind::GradleBuildFile);
        assert_eq!(front_end.call_count(), 0);
    }

    #[test]
    fn test_cancellation_returns_empty() {
        let (front_end, mut compiler) = setup(vec![]);
        front_end.set(MAIN, vec![helper()]);
        front_end.cancel_next(1);
        let mut cache = IrClassCache::new();

        let outcome = compiler.compile(&[input(MAIN)], &mut cache).unwrap();
        assert!(outcome.is_cancelled());
        assert!(outcome.into_output().is_empty());
        assert!(cache.is_empty());
        assert!(!compiler.has_shipped());
    }

    #[test]
    fn test_compilation_error_is_recoverable() {
        let (front_end, mut compiler) = setup(vec![]);
        front_end.fail(
            MAIN,
            FrontEndError::Compilation {
                unit: MAIN.into(),
                detail: "unresolved reference: fo".into(),
            },
        );
        let err = compiler
            .compile(&[input(MAIN)], &mut IrClassCache::new())
            .unwrap_err();
        assert_eq!(err.error, ErrorKind::CompilationError);
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_non_private_inline_function() {
        let inline = |body: &str, is_private: bool| {
            IrClass::new("com/example/UtilKt").with_method(
                IrMethod::new("twice", "(I)I", body).with_flags(MethodFlags {
                    is_inline: true,
                    is_private,
                    is_static: true,
                }),
            )
        };

        let (front_end, mut compiler) = setup(vec![inline("x * 2", false)]);
        front_end.set(MAIN, vec![inline("x + x", false)]);
        let err = compiler
            .compile(&[input(MAIN)], &mut IrClassCache::new())
            .unwrap_err();
        assert_eq!(err.error, ErrorKind::NonPrivateInlineFunction);

        let (front_end, mut compiler) = setup(vec![inline("x * 2", true)]);
        front_end.set(MAIN, vec![inline("x + x", true)]);
        assert!(compiler.compile(&[input(MAIN)], &mut IrClassCache::new()).is_ok());
    }

    #[test]
    fn test_support_classes_partitioned() {
        let lambda = |body: &str| {
            IrClass::new("com/example/Screen$bar$1")
                .with_super("kotlin/jvm/internal/Lambda")
                .with_method(IrMethod::new("<init>", "()V", "super()"))
                .with_method(IrMethod::new("invoke", "()V", body).in_group(9))
        };
        let (front_end, mut compiler) = setup(vec![screen("1", Some(3)), lambda("a")]);
        let mut cache = IrClassCache::new();
        front_end.set(MAIN, vec![screen("1", Some(3)), lambda("a")]);
        compiler.compile(&[input(MAIN)], &mut cache).unwrap();

        // Lambda gains a bridge method: fine for support classes
        let reshaped = lambda("b").with_method(
            IrMethod::new("invoke", "()Ljava/lang/Object;", "bridge").in_group(9),
        );
        front_end.set(MAIN, vec![screen("1", Some(3)), reshaped]);
        let output = compiled(compiler.compile(&[input(MAIN)], &mut cache).unwrap());

        assert!(output.classes.is_empty());
        assert_eq!(output.support_classes.len(), 1);
        assert_eq!(output.group_ids.iter().copied().collect::<Vec<_>>(), vec![9]);
        assert!(!output.reset_state);
    }

    #[test]
    fn test_module_groups_without_cross_module() {
        let front_end = Arc::new(FakeFrontEnd::new().without_cross_module());
        let mut compiler = LiveEditCompiler::new(front_end.clone());
        front_end.set("app/Main.kt", vec![screen("1", Some(3))]);
        front_end.set("lib/Util.kt", vec![helper()]);

        let inputs = [
            CompileInput::new(CompileRequest::new("app/Main.kt").in_module("app")),
            CompileInput::new(CompileRequest::new("lib/Util.kt").in_module("lib")),
        ];
        let output = compiled(compiler.compile(&inputs, &mut IrClassCache::new()).unwrap());
        assert_eq!(front_end.call_count(), 2);
        assert_eq!(output.class_count(), 2);
    }

    #[test]
    fn test_cross_module_single_call() {
        let (front_end, mut compiler) = setup(vec![]);
        front_end.set("app/Main.kt", vec![screen("1", Some(3))]);
        front_end.set("lib/Util.kt", vec![helper()]);

        let inputs = [
            CompileInput::new(CompileRequest::new("app/Main.kt").in_module("app")),
            CompileInput::new(CompileRequest::new("lib/Util.kt").in_module("lib")),
            CompileInput::new(CompileRequest::new("app/Main.kt").in_module("app")),
        ];
        compiler.compile(&inputs, &mut IrClassCache::new()).unwrap();
        assert_eq!(
            front_end.calls(),
            vec![vec!["lib/Util.kt".to_string(), "app/Main.kt".to_string()]]
        );
    }
}
