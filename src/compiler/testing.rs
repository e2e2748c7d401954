//! Scriptable front end for tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::frontend::{CompileRequest, FrontEnd, FrontEndError};
use crate::ir::{ClassProvider, IrClass};

pub struct FakeFrontEnd {
    outputs: Mutex<FxHashMap<String, Vec<IrClass>>>,
    failures: Mutex<FxHashMap<String, FrontEndError>>,
    cancellations: AtomicUsize,
    cross_module: AtomicBool,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeFrontEnd {
    pub fn new() -> Self {
        Self {
            outputs: Mutex::new(FxHashMap::default()),
            failures: Mutex::new(FxHashMap::default()),
            cancellations: AtomicUsize::new(0),
            cross_module: AtomicBool::new(true),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn without_cross_module(self) -> Self {
        self.cross_module.store(false, Ordering::SeqCst);
        self
    }

    /// Classes produced whenever `unit` is compiled.
    pub fn set(&self, unit: &str, classes: Vec<IrClass>) {
        self.outputs.lock().insert(unit.to_string(), classes);
    }

    pub fn fail(&self, unit: &str, error: FrontEndError) {
        self.failures.lock().insert(unit.to_string(), error);
    }

    pub fn clear_failure(&self, unit: &str) {
        self.failures.lock().remove(unit);
    }

    /// Cancel the next `n` calls.
    pub fn cancel_next(&self, n: usize) {
        self.cancellations.store(n, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Source units of every call, in call order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }
}

impl FrontEnd for FakeFrontEnd {
    fn compile(
        &self,
        requests: &[CompileRequest],
        _prior: &dyn ClassProvider,
    ) -> Result<Vec<IrClass>, FrontEndError> {
        self.calls
            .lock()
            .push(requests.iter().map(|r| r.source_unit.clone()).collect());

        let cancelled = self
            .cancellations
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if cancelled {
            return Err(FrontEndError::Cancelled);
        }

        let mut classes = Vec::new();
        for request in requests {
            if let Some(error) = self.failures.lock().get(&request.source_unit) {
                return Err(error.clone());
            }
            if let Some(output) = self.outputs.lock().get(&request.source_unit) {
                classes.extend(output.iter().cloned());
            }
        }
        Ok(classes)
    }

    fn supports_cross_module(&self) -> bool {
        self.cross_module.load(Ordering::SeqCst)
    }
}
