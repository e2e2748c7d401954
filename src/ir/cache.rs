//! Last-known-good class state of the running process.
//!
//! Entries are committed only after a successful compile-and-diff cycle and
//! are never evicted; a redeploy starts a fresh (cleared) cache.

use rustc_hash::FxHashMap;

use super::class::IrClass;
use super::provider::ClassProvider;

#[derive(Debug, Default)]
pub struct IrClassCache {
    classes: FxHashMap<String, IrClass>,
}

impl IrClassCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&IrClass> {
        self.classes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Insert or replace one class (last write wins).
    pub fn update(&mut self, class: IrClass) {
        crate::debug!("cache"; "update {}", class.name);
        self.classes.insert(class.name.clone(), class);
    }

    /// Insert or replace every class in order.
    pub fn update_all(&mut self, classes: impl IntoIterator<Item = IrClass>) {
        for class in classes {
            self.update(class);
        }
    }

    pub fn clear(&mut self) {
        self.classes.clear();
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl ClassProvider for IrClassCache {
    fn get_class(&self, name: &str) -> Option<IrClass> {
        self.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{IrField, IrMethod};

    #[test]
    fn test_empty_cache() {
        let cache = IrClassCache::new();
        assert!(cache.is_empty());
        assert!(cache.get("a/B").is_none());
        assert!(cache.get_class("a/B").is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let mut cache = IrClassCache::new();
        cache.update(IrClass::new("a/B").with_method(IrMethod::new("f", "()I", "1")));
        cache.update(IrClass::new("a/B").with_method(IrMethod::new("f", "()I", "2")));

        assert_eq!(cache.len(), 1);
        let stored = cache.get("a/B").unwrap();
        assert_eq!(stored.methods[0], IrMethod::new("f", "()I", "2"));
    }

    #[test]
    fn test_update_all_and_clear() {
        let mut cache = IrClassCache::new();
        cache.update_all([
            IrClass::new("a/B").with_field(IrField::new("x", "I")),
            IrClass::new("a/C"),
        ]);
        assert!(cache.contains("a/B"));
        assert!(cache.contains("a/C"));

        cache.clear();
        assert!(cache.is_empty());
    }
}
