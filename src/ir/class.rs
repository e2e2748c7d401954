//! Immutable snapshot of one compiled class.
//!
//! Names use the JVM internal form (`com/example/MainKt$main$1`). Equality of
//! two classes is structural: fields and methods are compared as sets, so a
//! front end that emits members in a different order produces an equal class.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::hash::BodyHash;

/// Method name of a static (class-level) initializer.
pub const STATIC_INITIALIZER: &str = "<clinit>";
/// Method name of an instance constructor.
pub const CONSTRUCTOR: &str = "<init>";

/// Opaque recomposition-scope identifier.
pub type GroupId = i32;

// =============================================================================
// Members
// =============================================================================

/// Identity of a method inside its class: `(name, descriptor)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodSlot {
    pub name: String,
    pub desc: String,
}

impl MethodSlot {
    pub fn new(name: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            desc: desc.into(),
        }
    }
}

impl fmt::Display for MethodSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.desc)
    }
}

/// Modifiers of a method that matter for hot-swapping.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(default)]
pub struct MethodFlags {
    pub is_private: bool,
    pub is_static: bool,
    /// Body is copied into call sites by the front end.
    pub is_inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IrField {
    pub name: String,
    pub desc: String,
    #[serde(default)]
    pub is_static: bool,
}

impl IrField {
    pub fn new(name: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            desc: desc.into(),
            is_static: false,
        }
    }

    pub fn static_field(name: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            is_static: true,
            ..Self::new(name, desc)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IrMethod {
    pub name: String,
    pub desc: String,
    /// Hash of the executable body.
    pub body: BodyHash,
    #[serde(default)]
    pub flags: MethodFlags,
    /// Recomposable scope this method body belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupId>,
}

impl IrMethod {
    /// Create a method, hashing the given body.
    pub fn new(name: impl Into<String>, desc: impl Into<String>, body: impl AsRef<[u8]>) -> Self {
        Self {
            name: name.into(),
            desc: desc.into(),
            body: BodyHash::of(body),
            flags: MethodFlags::default(),
            group: None,
        }
    }

    pub fn with_flags(mut self, flags: MethodFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Mark the method as the body of a recomposable scope.
    pub fn in_group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }

    pub fn slot(&self) -> MethodSlot {
        MethodSlot::new(&self.name, &self.desc)
    }

    pub fn is_static_initializer(&self) -> bool {
        self.name == STATIC_INITIALIZER
    }

    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR
    }
}

// =============================================================================
// IrClass
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrClass {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub super_name: Option<String>,
    #[serde(default)]
    pub interfaces: BTreeSet<String>,
    #[serde(default)]
    pub fields: Vec<IrField>,
    #[serde(default)]
    pub methods: Vec<IrMethod>,
    /// Source unit the class was compiled from (for error reporting).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

impl IrClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            super_name: Some("java/lang/Object".to_string()),
            interfaces: BTreeSet::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            source_file: None,
        }
    }

    pub fn with_super(mut self, super_name: impl Into<String>) -> Self {
        self.super_name = Some(super_name.into());
        self
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.insert(interface.into());
        self
    }

    pub fn with_field(mut self, field: IrField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_method(mut self, method: IrMethod) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_source(mut self, source_file: impl Into<String>) -> Self {
        self.source_file = Some(source_file.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&IrField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn method(&self, name: &str, desc: &str) -> Option<&IrMethod> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.desc == desc)
    }

    pub fn static_initializer(&self) -> Option<&IrMethod> {
        self.methods.iter().find(|m| m.is_static_initializer())
    }

    pub fn field_names(&self) -> BTreeSet<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn slots(&self) -> BTreeSet<MethodSlot> {
        self.methods.iter().map(IrMethod::slot).collect()
    }

    /// Name of the enclosing scope (`a/B$c$1` -> `a/B$c`), if nested.
    pub fn outer_name(&self) -> Option<&str> {
        self.name
            .rsplit_once('$')
            .map(|(outer, _)| outer)
            .filter(|outer| !outer.is_empty())
    }

    /// Last `$`-separated segment of the name, without the package.
    pub fn simple_name(&self) -> &str {
        let unqualified = self.name.rsplit('/').next().unwrap_or(&self.name);
        unqualified.rsplit('$').next().unwrap_or(unqualified)
    }

    fn field_set(&self) -> BTreeSet<&IrField> {
        self.fields.iter().collect()
    }

    fn method_set(&self) -> BTreeSet<&IrMethod> {
        self.methods.iter().collect()
    }
}

impl PartialEq for IrClass {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.super_name == other.super_name
            && self.interfaces == other.interfaces
            && self.field_set() == other.field_set()
            && self.method_set() == other.method_set()
    }
}

impl Eq for IrClass {}

impl fmt::Display for IrClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// =============================================================================
// Tests
// =============================================================================
