//! Structural summary of a source unit.
//!
//! Captured once per snapshot and compared against the summary of the edited
//! tree. Every text stored here is normalized, so two states built from trees
//! that only differ in comments or whitespace are equal.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::syntax::{NodeKind, SyntaxNode, normalize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumEntryShape {
    pub name: String,
    /// Normalized constructor arguments, empty when the entry has none.
    pub args: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationState {
    pub imports: BTreeSet<String>,
    /// Qualified property name -> normalized initializer (`=1`, `by lazy{1}`).
    pub properties: BTreeMap<String, String>,
    /// Qualified class name -> entries in declaration order.
    pub enums: BTreeMap<String, Vec<EnumEntryShape>>,
    /// Qualified class name -> constructor signatures (primary first).
    /// Every class of the unit has an entry, possibly empty.
    pub constructors: BTreeMap<String, Vec<String>>,
    pub init_blocks: BTreeMap<String, Vec<String>>,
}

impl ValidationState {
    pub fn capture(root: &SyntaxNode) -> Self {
        let mut state = Self::default();
        state.visit(&root.without_trivia(), "");
        state
    }

    /// Whether the class exists in this state.
    pub fn has_class(&self, path: &str) -> bool {
        self.constructors.contains_key(path)
    }

    fn visit(&mut self, node: &SyntaxNode, scope: &str) {
        match node.kind {
            NodeKind::Import => {
                self.imports.insert(normalize(&node.text));
            }
            NodeKind::Class => self.visit_class(node, scope),
            NodeKind::Property => self.visit_property(node, scope),
            // Locals are not fields
            NodeKind::Function => {}
            _ => {
                for child in &node.children {
                    self.visit(child, scope);
                }
            }
        }
    }

    fn visit_class(&mut self, node: &SyntaxNode, scope: &str) {
        let path = qualify(scope, node.name());

        let entries: Vec<_> = node
            .children_of(NodeKind::EnumEntry)
            .map(|entry| EnumEntryShape {
                name: entry.name().to_string(),
                args: entry
                    .child(NodeKind::Arguments)
                    .map(|a| normalize(&a.text))
                    .unwrap_or_default(),
            })
            .collect();
        if !entries.is_empty() {
            self.enums.insert(path.clone(), entries);
        }

        let mut constructors = Vec::new();
        if let Some(primary) = node.child(NodeKind::PrimaryConstructor) {
            constructors.push(format!("primary{}", parameters(primary)));
        }
        for secondary in node.children_of(NodeKind::SecondaryConstructor) {
            let delegation = secondary
                .child(NodeKind::DelegationCall)
                .map(|d| normalize(&d.text))
                .unwrap_or_default();
            constructors.push(format!("constructor{}:{}", parameters(secondary), delegation));
        }
        self.constructors.insert(path.clone(), constructors);

        let init_blocks: Vec<_> = node
            .children_of(NodeKind::InitBlock)
            .map(|b| normalize(&b.text))
            .collect();
        if !init_blocks.is_empty() {
            self.init_blocks.insert(path.clone(), init_blocks);
        }

        for child in &node.children {
            match child.kind {
                NodeKind::EnumEntry
                | NodeKind::PrimaryConstructor
                | NodeKind::SecondaryConstructor
                | NodeKind::InitBlock => {}
                _ => self.visit(child, &path),
            }
        }
    }

    fn visit_property(&mut self, node: &SyntaxNode, scope: &str) {
        let initializer = if let Some(init) = node.child(NodeKind::Initializer) {
            format!("={}", normalize(&init.text))
        } else if let Some(delegate) = node.child(NodeKind::Delegate) {
            format!("by {}", normalize(&delegate.text))
        } else {
            String::new()
        };
        self.properties
            .insert(qualify(scope, node.name()), initializer);
    }
}

fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{scope}.{name}")
    }
}

fn parameters(constructor: &SyntaxNode) -> String {
    constructor
        .child(NodeKind::Parameters)
        .map(|p| normalize(&p.text))
        .unwrap_or_else(|| "()".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color_enum() -> SyntaxNode {
        SyntaxNode::new(NodeKind::File)
            .with_child(SyntaxNode::leaf(NodeKind::Import, "import  a.b.C"))
            .with_child(
                SyntaxNode::named(NodeKind::Class, "Color")
                    .with_child(
                        SyntaxNode::new(NodeKind::PrimaryConstructor)
                            .with_child(SyntaxNode::leaf(NodeKind::Parameters, "(val rgb: Int)")),
                    )
                    .with_child(
                        SyntaxNode::named(NodeKind::EnumEntry, "RED")
                            .with_child(SyntaxNode::leaf(NodeKind::Arguments, "(0xFF0000)")),
                    )
                    .with_child(SyntaxNode::named(NodeKind::EnumEntry, "GREEN"))
                    .with_child(
                        SyntaxNode::named(NodeKind::Function, "label").with_child(
                            SyntaxNode::named(NodeKind::Property, "local")
                                .with_child(SyntaxNode::leaf(NodeKind::Initializer, "1")),
                        ),
                    ),
            )
            .with_child(
                SyntaxNode::named(NodeKind::Property, "cache")
                    .with_child(SyntaxNode::leaf(NodeKind::Delegate, "lazy { load() }")),
            )
    }

    #[test]
    fn test_capture() {
        let state = ValidationState::capture(&color_enum());

        assert!(state.imports.contains("import a.b.C"));
        assert_eq!(state.enums["Color"].len(), 2);
        assert_eq!(state.enums["Color"][0].args, "(0xFF0000)");
        assert_eq!(state.constructors["Color"], vec!["primary(val rgb:Int)"]);
        assert_eq!(state.properties["cache"], "by lazy{load()}");
        assert!(state.has_class("Color"));
    }

    #[test]
    fn test_function_locals_are_not_fields() {
        let state = ValidationState::capture(&color_enum());
        assert!(!state.properties.keys().any(|k| k.contains("local")));
    }

    #[test]
    fn test_nested_classes_are_qualified() {
        let tree = SyntaxNode::new(NodeKind::File).with_child(
            SyntaxNode::named(NodeKind::Class, "Outer").with_child(
                SyntaxNode::named(NodeKind::Class, "Companion").with_child(
                    SyntaxNode::named(NodeKind::Property, "MAX")
                        .with_child(SyntaxNode::leaf(NodeKind::Initializer, "10")),
                ),
            ),
        );
        let state = ValidationState::capture(&tree);
        assert_eq!(state.properties["Outer.Companion.MAX"], "=10");
        assert!(state.has_class("Outer.Companion"));
    }

    #[test]
    fn test_trivia_nodes_ignored() {
        let with_comment = color_enum()
            .with_child(SyntaxNode::leaf(NodeKind::Comment, "/* trailing */"));
        assert_eq!(
            ValidationState::capture(&with_comment),
            ValidationState::capture(&color_enum())
        );
    }
}
