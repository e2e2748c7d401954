//! Declaration syntax tree.
//!
//! A reduced tree handed over by the front end's parser. Only the node kinds
//! the structural validator inspects are distinguished; everything else is
//! `Other`. Each node carries the source text of its whole span.
//!
//! ```text
//! File
//! ├── Import            "import a.b.C"
//! ├── Property  x       "val x = 1"
//! │   └── Initializer   "1"
//! └── Class  Color
//!     ├── PrimaryConstructor
//!     │   └── Parameters   "(val rgb: Int)"
//!     ├── EnumEntry  RED
//!     │   └── Arguments    "(0xFF0000)"
//!     └── Function  label
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    File,
    Import,
    /// Class, interface, object or companion.
    Class,
    EnumEntry,
    /// Value arguments of a call or enum entry.
    Arguments,
    /// Parameter list of a constructor or function.
    Parameters,
    PrimaryConstructor,
    SecondaryConstructor,
    /// `: this(..)` / `: super(..)` delegation of a secondary constructor.
    DelegationCall,
    InitBlock,
    Property,
    Initializer,
    /// `by lazy { .. }` and other delegated property initializers.
    Delegate,
    Function,
    Comment,
    Whitespace,
    Other,
}

impl NodeKind {
    /// Trivia never affects program structure.
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::Comment | Self::Whitespace)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            name: None,
            text: String::new(),
            children: Vec::new(),
        }
    }

    pub fn named(kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(kind)
        }
    }

    pub fn leaf(kind: NodeKind, text: impl Into<String>) -> Self {
        Self::new(kind).with_text(text)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_child(mut self, child: SyntaxNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }

    /// First direct child of the given kind.
    pub fn child(&self, kind: NodeKind) -> Option<&SyntaxNode> {
        self.children.iter().find(|c| c.kind == kind)
    }

    /// Direct children of the given kind, in source order.
    pub fn children_of(&self, kind: NodeKind) -> impl Iterator<Item = &SyntaxNode> {
        self.children.iter().filter(move |c| c.kind == kind)
    }

    /// Copy of the tree without comment and whitespace nodes.
    pub fn without_trivia(&self) -> SyntaxNode {
        SyntaxNode {
            kind: self.kind,
            name: self.name.clone(),
            text: self.text.clone(),
            children: self
                .children
                .iter()
                .filter(|c| !c.kind.is_trivia())
                .map(SyntaxNode::without_trivia)
                .collect(),
        }
    }

    /// Pre-order traversal of the whole tree.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }
}

pub struct Walk<'a> {
    stack: Vec<&'a SyntaxNode>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a SyntaxNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
