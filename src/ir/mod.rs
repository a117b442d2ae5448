//! IR & CallGraph model (spec §3, component 1).
//!
//! Types here are immutable after load except for two monotonic extensions
//! performed during patching: the patch-container class gains bridge
//! methods, and invocation statements gain `CallGraphPatchingTag`s (owned by
//! [`crate::patching`], not this module, since tagging is purely a
//! patching-time concern).

mod body;
mod callgraph;
mod class;
mod statement;
mod value;

pub use body::Body;
pub use callgraph::{CallGraph, EdgeKind, EdgeRef};
pub use class::{Class, ClassId, MethodId, Origin, TypeRef};
pub use statement::Statement;
pub use value::{InvokeKind, Local, StmtId, Value};

use rustc_hash::FxHashMap;

/// Owns the whole loaded program: classes, bodies, and the (initially
/// unpatched) call graph. The spec's "global, mutable class hierarchy"
/// design note (§9) is realized here as a single value owned by the
/// orchestrator's caller; patchers borrow it immutably except for the
/// designated patch container class.
#[derive(Debug, Default)]
pub struct IrContext {
    classes: FxHashMap<ClassId, Class>,
    bodies: FxHashMap<MethodId, Body>,
    pub call_graph: CallGraph,
}

impl IrContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_class(&mut self, class: Class) {
        for method in &class.methods {
            self.call_graph.ensure_method(method);
        }
        self.classes.insert(class.id.clone(), class);
    }

    pub fn add_body(&mut self, body: Body) {
        self.call_graph.ensure_method(&body.owner);
        self.bodies.insert(body.owner.clone(), body);
    }

    pub fn lookup_class(&self, id: &ClassId) -> Option<&Class> {
        self.classes.get(id)
    }

    pub fn lookup_class_mut(&mut self, id: &ClassId) -> Option<&mut Class> {
        self.classes.get_mut(id)
    }

    pub fn body_of(&self, method: &MethodId) -> Option<&Body> {
        self.bodies.get(method)
    }

    /// spec §3: "a method with no body is never a traversal-continuation
    /// target".
    pub fn has_body(&self, method: &MethodId) -> bool {
        self.bodies.contains_key(method)
    }

    pub fn application_classes(&self) -> impl Iterator<Item = &Class> {
        self.classes.values().filter(|c| c.origin == Origin::Application)
    }

    pub fn is_subclass_of_including(&self, c: &ClassId, sup: &ClassId) -> bool {
        if c == sup {
            return true;
        }
        let Some(class) = self.classes.get(c) else {
            return false;
        };
        if class.interfaces.iter().any(|i| i == sup) {
            return true;
        }
        match &class.superclass {
            Some(parent) => self.is_subclass_of_including(parent, sup),
            None => false,
        }
    }

    pub fn is_superclass_of_including(&self, c: &ClassId, sub: &ClassId) -> bool {
        self.is_subclass_of_including(sub, c)
    }

    pub fn register_bridge_method(&mut self, container: &ClassId, method: MethodId, body: Body) {
        if let Some(class) = self.classes.get_mut(container) {
            if !class.methods.contains(&method) {
                class.methods.push(method.clone());
            }
        }
        self.add_body(body);
    }
}
