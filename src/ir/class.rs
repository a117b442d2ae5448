//! Class and Method identities, and the typed entities that own them.
//!
//! Identity follows spec §3 literally: a `Class`'s identity is its
//! fully-qualified name; a `Method`'s identity is its declaring class plus
//! subsignature (return type, name, ordered parameter types). Both are kept
//! as cheap-to-clone, `Arc<str>`-backed newtypes since they are used
//! pervasively as map keys across def/use, the call graph, and the patch
//! tag table.

use std::fmt;
use std::sync::Arc;

/// Fully-qualified type name (e.g. `android.content.Intent`, `int`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef(Arc<str>);

impl TypeRef {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for primitive integer-like types, used by `ServicePatcher` to
    /// decide whether a synthesized bridge return value is `0` or `null`.
    pub fn is_primitive_integer(&self) -> bool {
        matches!(self.0.as_ref(), "int" | "long" | "short" | "byte" | "char")
    }

    pub fn is_void(&self) -> bool {
        self.0.as_ref() == "void"
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TypeRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Class identity: fully-qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(Arc<str>);

impl ClassId {
    pub fn new(fqn: impl Into<Arc<str>>) -> Self {
        Self(fqn.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last dotted component, used to build deterministic bridge names
    /// (spec §4.2: `bridge_<dotted-class-name-with-underscores>_<kind-tag>`).
    pub fn dotted_to_underscored(&self) -> String {
        self.0.replace('.', "_")
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ClassId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Method identity: declaring class + subsignature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodId {
    pub declaring_class: ClassId,
    pub name: Arc<str>,
    pub param_types: Arc<[TypeRef]>,
    pub return_type: TypeRef,
}

impl MethodId {
    pub fn new(
        declaring_class: ClassId,
        name: impl Into<Arc<str>>,
        param_types: impl Into<Vec<TypeRef>>,
        return_type: impl Into<TypeRef>,
    ) -> Self {
        Self {
            declaring_class,
            name: name.into(),
            param_types: param_types.into().into(),
            return_type: return_type.into(),
        }
    }

    pub fn subsignature(&self) -> String {
        format!(
            "{} {}({})",
            self.return_type,
            self.name,
            self.param_types
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(",")
        )
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring_class, self.subsignature())
    }
}

/// Where a class came from. Only application classes are mutated by
/// patching (the patch container) or walked for ICC dispatch sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    Application,
    Platform,
}

/// A loaded class. Mutable only in that the designated patch container
/// class accrues synthesized bridge methods post-load (spec §3).
#[derive(Debug, Clone)]
pub struct Class {
    pub id: ClassId,
    pub methods: Vec<MethodId>,
    pub superclass: Option<ClassId>,
    pub interfaces: Vec<ClassId>,
    pub origin: Origin,
}

impl Class {
    pub fn new(id: ClassId, origin: Origin) -> Self {
        Self {
            id,
            methods: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            origin,
        }
    }

    pub fn with_superclass(mut self, superclass: ClassId) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn with_interfaces(mut self, interfaces: impl IntoIterator<Item = ClassId>) -> Self {
        self.interfaces.extend(interfaces);
        self
    }

    pub fn with_methods(mut self, methods: impl IntoIterator<Item = MethodId>) -> Self {
        self.methods.extend(methods);
        self
    }

    pub fn declares(&self, method: &MethodId) -> bool {
        self.methods.contains(method)
    }
}
