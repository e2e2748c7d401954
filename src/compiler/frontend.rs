//! Front-end compiler collaborator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ir::{ClassProvider, IrClass};

/// One unit of work for the front end.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompileRequest {
    /// Changed source unit (file path).
    pub source_unit: String,
    /// Module the unit belongs to.
    #[serde(default)]
    pub module: String,
    /// Function, property or class the edit originated in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaration: Option<String>,
}

impl CompileRequest {
    pub fn new(source_unit: impl Into<String>) -> Self {
        Self {
            source_unit: source_unit.into(),
            module: String::new(),
            declaration: None,
        }
    }

    pub fn in_module(mut self, module: impl Into<String>) -> Self {
        self.module = module.into();
        self
    }

    pub fn for_declaration(mut self, declaration: impl Into<String>) -> Self {
        self.declaration = Some(declaration.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrontEndError {
    /// Cooperative cancellation (the user kept typing).
    #[error("compilation cancelled")]
    Cancelled,

    #[error("{unit}: {detail}")]
    Compilation { unit: String, detail: String },

    #[error("front end failed: {0}")]
    Internal(String),
}

/// Turns changed source units into compiled classes.
///
/// `prior` resolves classes that were compiled before, for references into
/// code outside the requested units.
pub trait FrontEnd: Send + Sync {
    fn compile(
        &self,
        requests: &[CompileRequest],
        prior: &dyn ClassProvider,
    ) -> Result<Vec<IrClass>, FrontEndError>;

    /// Whether units of different modules can be compiled in one call.
    fn supports_cross_module(&self) -> bool {
        true
    }
}
