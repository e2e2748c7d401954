//! Edit events produced by the change-detection boundary.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::compiler::CompileRequest;
use crate::syntax::SyntaxNode;
use crate::validate::UnsupportedSyntaxKind;

/// One syntax-tree mutation of a source unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditEvent {
    pub source_unit: String,
    #[serde(default)]
    pub module: String,
    /// Function, property or class the edit originated in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaration: Option<String>,
    /// Edited tree of the whole unit, when the front end handed one over.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree: Option<SyntaxNode>,
    /// Non-fatal observations of the validator, filled in by the session.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub unsupported: BTreeSet<UnsupportedSyntaxKind>,
}

impl EditEvent {
    pub fn new(source_unit: impl Into<String>) -> Self {
        Self {
            source_unit: source_unit.into(),
            module: String::new(),
            declaration: None,
            tree: None,
            unsupported: BTreeSet::new(),
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

    pub fn with_tree(mut self, tree: SyntaxNode) -> Self {
        self.tree = Some(tree);
        self
    }

    pub fn request(&self) -> CompileRequest {
        let request = CompileRequest::new(&self.source_unit).in_module(&self.module);
        match &self.declaration {
            Some(declaration) => request.for_declaration(declaration),
            None => request,
        }
    }
}
