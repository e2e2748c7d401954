//! Baseline class sources.
//!
//! The differ compares against the IrClassCache first and falls back to the
//! classes of the deployed build artifact. Before any edit has been committed
//! the cache is empty, so the first edit of a session is diffed against the
//! artifact alone.

use rustc_hash::FxHashMap;

use super::cache::IrClassCache;
use super::class::IrClass;

/// Source of previously compiled classes, looked up by name.
pub trait ClassProvider: Send + Sync {
    fn get_class(&self, name: &str) -> Option<IrClass>;
}

/// Provider with no classes (no deployed artifact available).
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyProvider;

impl ClassProvider for EmptyProvider {
    fn get_class(&self, _name: &str) -> Option<IrClass> {
        None
    }
}

/// Explicit snapshot of the classes shipped in the deployed artifact.
#[derive(Debug, Default, Clone)]
pub struct ArtifactSnapshot {
    classes: FxHashMap<String, IrClass>,
}

impl ArtifactSnapshot {
    pub fn new(classes: impl IntoIterator<Item = IrClass>) -> Self {
        Self {
            classes: classes.into_iter().map(|c| (c.name.clone(), c)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl ClassProvider for ArtifactSnapshot {
    fn get_class(&self, name: &str) -> Option<IrClass> {
        self.classes.get(name).cloned()
    }
}

/// Cache-first view with a deployed-artifact fallback.
pub struct Baseline<'a> {
    cache: &'a IrClassCache,
    artifact: &'a dyn ClassProvider,
}

impl<'a> Baseline<'a> {
    pub fn new(cache: &'a IrClassCache, artifact: &'a dyn ClassProvider) -> Self {
        Self { cache, artifact }
    }
}

impl ClassProvider for Baseline<'_> {
    fn get_class(&self, name: &str) -> Option<IrClass> {
        self.cache
            .get(name)
            .cloned()
            .or_else(|| self.artifact.get_class(name))
    }
}
