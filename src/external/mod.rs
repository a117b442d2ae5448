//! Collaborator interfaces this crate consumes but does not implement
//! (spec §6): manifest parsing and initial IR/call-graph construction are
//! explicitly out of scope. These traits are the seam; `IrContext` already
//! satisfies `IrProvider` directly (it *is* the one production provider),
//! and `InMemoryManifestAnalysis` is the one production `ManifestAnalysis`
//! — a plain data holder, since turning manifest XML into these sets is
//! the out-of-scope part, not holding the sets themselves.

use crate::ir::{CallGraph, Class, ClassId, IrContext, MethodId};
use rustc_hash::{FxHashMap, FxHashSet};

/// spec §6 `IRProvider`. `IrContext` is the sole implementation; patchers in
/// [`crate::patching`] take `&IrContext` directly rather than `&dyn
/// IrProvider` (no dynamic dispatch needed within one process), but the
/// trait documents the exact read surface a provider must offer.
pub trait IrProvider {
    fn application_classes(&self) -> Vec<&Class>;
    fn is_subclass_of_including(&self, c: &ClassId, sup: &ClassId) -> bool;
    fn is_superclass_of_including(&self, c: &ClassId, sub: &ClassId) -> bool;
    fn lookup_class(&self, name: &ClassId) -> Option<&Class>;
    fn has_body(&self, method: &MethodId) -> bool;
    fn call_graph(&self) -> &CallGraph;
}

impl IrProvider for IrContext {
    fn application_classes(&self) -> Vec<&Class> {
        self.application_classes().collect()
    }

    fn is_subclass_of_including(&self, c: &ClassId, sup: &ClassId) -> bool {
        IrContext::is_subclass_of_including(self, c, sup)
    }

    fn is_superclass_of_including(&self, c: &ClassId, sub: &ClassId) -> bool {
        IrContext::is_superclass_of_including(self, c, sub)
    }

    fn lookup_class(&self, name: &ClassId) -> Option<&Class> {
        IrContext::lookup_class(self, name)
    }

    fn has_body(&self, method: &MethodId) -> bool {
        IrContext::has_body(self, method)
    }

    fn call_graph(&self) -> &CallGraph {
        &self.call_graph
    }
}

/// spec §6 `ManifestAnalysis`: declared component names and authorities by
/// role, empty sets when unknown. Queried only by patcher fallback paths.
pub trait ManifestAnalysis {
    fn activity_names(&self) -> &FxHashSet<ClassId>;
    fn service_names(&self) -> &FxHashSet<ClassId>;
    fn receiver_names(&self) -> &FxHashSet<ClassId>;
    fn provider_names(&self) -> &FxHashSet<ClassId>;
    /// authority string -> declaring provider class.
    fn provider_authorities(&self) -> &FxHashMap<String, ClassId>;
}

/// Plain in-memory holder for manifest-declared facts. Production callers
/// populate this from parsed manifest XML (out of scope here); tests build
/// it by hand, the same object either way.
#[derive(Debug, Clone, Default)]
pub struct InMemoryManifestAnalysis {
    activities: FxHashSet<ClassId>,
    services: FxHashSet<ClassId>,
    receivers: FxHashSet<ClassId>,
    providers: FxHashSet<ClassId>,
    authorities: FxHashMap<String, ClassId>,
}

impl InMemoryManifestAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_activity(mut self, class: ClassId) -> Self {
        self.activities.insert(class);
        self
    }

    pub fn with_service(mut self, class: ClassId) -> Self {
        self.services.insert(class);
        self
    }

    pub fn with_receiver(mut self, class: ClassId) -> Self {
        self.receivers.insert(class);
        self
    }

    pub fn with_provider(mut self, class: ClassId, authority: impl Into<String>) -> Self {
        self.authorities.insert(authority.into(), class.clone());
        self.providers.insert(class);
        self
    }
}

impl ManifestAnalysis for InMemoryManifestAnalysis {
    fn activity_names(&self) -> &FxHashSet<ClassId> {
        &self.activities
    }

    fn service_names(&self) -> &FxHashSet<ClassId> {
        &self.services
    }

    fn receiver_names(&self) -> &FxHashSet<ClassId> {
        &self.receivers
    }

    fn provider_names(&self) -> &FxHashSet<ClassId> {
        &self.providers
    }

    fn provider_authorities(&self) -> &FxHashMap<String, ClassId> {
        &self.authorities
    }
}
