//! IR values (spec §3 `Value`) and statement identity.

use super::class::{ClassId, MethodId, TypeRef};
use std::sync::Arc;

/// A local variable name, scoped to the `Body` that declares it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Local(pub Arc<str>);

impl Local {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }
}

impl std::fmt::Display for Local {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dispatch kind for an `InvokeExpr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvokeKind {
    Virtual,
    Special,
    Interface,
    Static,
}

/// spec §3 `Value`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Local(Local, TypeRef),
    StringConstant(String),
    IntConstant(i64),
    ClassConstant(ClassId),
    NullConstant,
    NewExpr(TypeRef),
    InstanceFieldRef {
        base: Box<Value>,
        field: Arc<str>,
    },
    StaticFieldRef {
        field: Arc<str>,
    },
    ParameterRef {
        index: usize,
        ty: TypeRef,
    },
    InvokeExpr {
        kind: InvokeKind,
        method: MethodId,
        base: Option<Box<Value>>,
        args: Vec<Value>,
    },
}

impl Value {
    /// The local this value reads, if it is (or is based on) one — used by
    /// the def/use walk to find which local a statement uses.
    pub fn base_local(&self) -> Option<&Local> {
        match self {
            Value::Local(l, _) => Some(l),
            Value::InstanceFieldRef { base, .. } => base.base_local(),
            Value::InvokeExpr { base: Some(b), .. } => b.base_local(),
            _ => None,
        }
    }

    pub fn as_string_constant(&self) -> Option<&str> {
        match self {
            Value::StringConstant(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int_constant(&self) -> Option<i64> {
        match self {
            Value::IntConstant(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_class_constant(&self) -> Option<&ClassId> {
        match self {
            Value::ClassConstant(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_invoke(&self) -> Option<(&InvokeKind, &MethodId, Option<&Value>, &[Value])> {
        match self {
            Value::InvokeExpr { kind, method, base, args } => {
                Some((kind, method, base.as_deref(), args.as_slice()))
            }
            _ => None,
        }
    }
}

/// Global identity of one statement: its owning method plus its stable
/// position within that method's ordered statement sequence (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StmtId {
    pub method: MethodId,
    pub index: usize,
}

impl StmtId {
    pub fn new(method: MethodId, index: usize) -> Self {
        Self { method, index }
    }
}

impl std::fmt::Display for StmtId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.method, self.index)
    }
}
