//! `CallGraphPatcher` hierarchy and the patch-tag table (spec §4.2).
//!
//! Each concrete patcher is bound to one [`PatcherKind`] and emits bridge
//! methods exclusively into a single synthetic *patch container class*
//! (spec §3's "dedicated patch container class"), the same "one mutable
//! extension point" shape the teacher uses for its synthesized
//! `<clinit>`-merge class in `features/effect_analysis`.

mod activity;
mod async_task;
mod broadcast;
mod content_provider;
mod messenger;
mod orchestrator;
mod service;

pub use activity::ActivityPatcher;
pub use async_task::{AsyncTaskPatcher, ExecutorPatcher, ThreadPatcher};
pub use broadcast::BroadcastReceiverPatcher;
pub use content_provider::ContentProviderPatcher;
pub use messenger::MessengerPatcher;
pub use orchestrator::{PatchSummary, PatchingOrchestrator};
pub use service::ServicePatcher;

use crate::diagnostics::DiagnosticSink;
use crate::errors::{IccError, Result};
use crate::external::ManifestAnalysis;
use crate::icc::ComponentSummaryTable;
use crate::ir::{Body, ClassId, EdgeKind, IrContext, Local, MethodId, StmtId, TypeRef};
use rustc_hash::{FxHashMap, FxHashSet};

/// spec §4.2 `CallGraphPatcher` (abstract). Each statement of each body is
/// offered to every registered patcher, in fixed registration order
/// (orchestrated by [`PatchingOrchestrator`]); a patcher claims a statement
/// via `should_patch` and mutates the scene via `patch`.
pub trait CallGraphPatcher {
    fn kind(&self) -> PatcherKind;
    fn should_patch(&self, body: &Body, stmt: usize) -> bool;

    /// Idempotent per `(stmt, kind)`: if a bridge for the resolved target
    /// already exists, only the tag is (re-)attached.
    fn patch(
        &self,
        ctx: &mut IrContext,
        manifest: &dyn ManifestAnalysis,
        tags: &mut PatchTags,
        summary: &mut ComponentSummaryTable,
        sink: &dyn DiagnosticSink,
        body: &Body,
        stmt: usize,
    ) -> Result<()>;
}

/// Tag applied to a patcher: identical variant set to the ICC members of
/// [`crate::ir::EdgeKind`], kept as its own type because not every
/// `EdgeKind` variant corresponds to a patcher (the ordinary dispatch kinds
/// don't).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatcherKind {
    Activity,
    Service,
    BroadcastReceiver,
    ContentProvider,
    Messenger,
    AsyncTask,
    Executor,
    Thread,
}

impl PatcherKind {
    pub fn edge_kind(self) -> EdgeKind {
        match self {
            PatcherKind::Activity => EdgeKind::Activity,
            PatcherKind::Service => EdgeKind::Service,
            PatcherKind::BroadcastReceiver => EdgeKind::BroadcastReceiver,
            PatcherKind::ContentProvider => EdgeKind::ContentProvider,
            PatcherKind::Messenger => EdgeKind::Messenger,
            PatcherKind::AsyncTask => EdgeKind::AsyncTask,
            PatcherKind::Executor => EdgeKind::Executor,
            PatcherKind::Thread => EdgeKind::Thread,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            PatcherKind::Activity => "activity",
            PatcherKind::Service => "service",
            PatcherKind::BroadcastReceiver => "broadcast",
            PatcherKind::ContentProvider => "provider",
            PatcherKind::Messenger => "messenger",
            PatcherKind::AsyncTask => "async_task",
            PatcherKind::Executor => "executor",
            PatcherKind::Thread => "thread",
        }
    }
}

/// The single class all synthesized bridge methods are declared on (spec
/// §3: "patch container class"). A fixed, reserved name rather than
/// something an application could plausibly declare itself.
pub fn patch_container_class() -> ClassId {
    ClassId::new("$IccCore$PatchContainer")
}

/// Deterministic bridge name: `bridge_<dotted-class-name-with-underscores>_<kind-tag>`
/// (spec §4.2). Idempotence follows from this being a pure function of its
/// inputs.
pub fn bridge_name(target: &ClassId, kind: PatcherKind) -> String {
    format!("bridge_{}_{}", target.dotted_to_underscored(), kind.tag())
}

/// Per-statement, multi-valued patch tags (spec §3 `CallGraphPatchingTag`,
/// §9 "tag stickiness" open question resolved as: tags are multi-valued per
/// statement, one synthetic edge per tag).
#[derive(Debug, Default)]
pub struct PatchTags {
    by_stmt: FxHashMap<StmtId, Vec<(PatcherKind, MethodId)>>,
}

impl PatchTags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `(kind, bridge)` to `stmt`, idempotently: re-attaching the
    /// same `(stmt, kind, bridge)` triple is a no-op (spec §4.2: "patch is
    /// idempotent per (stmt, kind)").
    pub fn attach(&mut self, stmt: StmtId, kind: PatcherKind, bridge: MethodId) {
        let entries = self.by_stmt.entry(stmt).or_default();
        if !entries.iter().any(|(k, b)| *k == kind && *b == bridge) {
            entries.push((kind, bridge));
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&StmtId, &PatcherKind, &MethodId)> {
        self.by_stmt.iter().flat_map(|(stmt, tags)| tags.iter().map(move |(k, b)| (stmt, k, b)))
    }
}

/// Ensure a bridge method with the given identity and body exists on the
/// patch container, returning its `MethodId`. If a method of that name
/// already exists with a different subsignature, this is the spec's sole
/// fatal condition (`InternalInvariantViolation`) — bridge names are
/// supposed to be deterministic by `(class, kind)`, so a same-name,
/// different-signature collision means something mutated the patch
/// container out of band.
pub(crate) fn ensure_bridge(
    ctx: &mut IrContext,
    bridge: MethodId,
    body: Body,
) -> Result<MethodId> {
    let container = patch_container_class();
    if ctx.lookup_class(&container).is_none() {
        ctx.add_class(crate::ir::Class::new(container.clone(), crate::ir::Origin::Application));
    }
    let class = ctx.lookup_class(&container).expect("just ensured");
    if let Some(existing) = class.methods.iter().find(|m| m.name == bridge.name) {
        if existing != &bridge {
            return Err(IccError::InternalInvariantViolation {
                bridge: bridge.name.to_string(),
                existing: existing.subsignature(),
                attempted: bridge.subsignature(),
            });
        }
        return Ok(existing.clone());
    }
    ctx.register_bridge_method(&container, bridge.clone(), body);
    Ok(bridge)
}

/// Resolve target classes from a message-object local, falling back to
/// every manifest-declared component of the matching role when resolution
/// yields nothing (spec §4.2 "Fallback behavior").
pub(crate) fn resolve_or_fallback(intent_local: &Local, body: &Body, ctx: &IrContext, manifest_role: &FxHashSet<ClassId>) -> Vec<ClassId> {
    let targets = crate::intent::target_recovery::recover_target_classes(intent_local, body, ctx);
    if !targets.is_empty() {
        return targets;
    }
    manifest_role.iter().cloned().collect()
}

/// `NEW target; INVOKESPECIAL target.<init>(); <entry-call>; RETURN` — the
/// common bridge-body shape shared by Activity/Service/BroadcastReceiver
/// bridges: construct the target, invoke its entry callback, return a value
/// synthesized from `entry_return`.
pub(crate) fn lifecycle_bridge_body(owner: MethodId, target: &ClassId, entry_name: &str, entry_param_types: Vec<TypeRef>, entry_return: TypeRef) -> Body {
    use crate::ir::{InvokeKind, Statement, Value};

    let t = Local::new("t");
    let target_ty = TypeRef::new(target.as_str());
    let ctor = MethodId::new(target.clone(), "<init>", vec![], TypeRef::new("void"));
    let entry_method = MethodId::new(target.clone(), entry_name, entry_param_types.clone(), entry_return.clone());
    let args = entry_param_types
        .iter()
        .map(|t| if t.is_primitive_integer() { Value::IntConstant(0) } else { Value::NullConstant })
        .collect::<Vec<_>>();

    let stmts = vec![
        Statement::Assign(t.clone(), Value::NewExpr(target_ty.clone())),
        Statement::Invoke(Value::InvokeExpr {
            kind: InvokeKind::Special,
            method: ctor,
            base: Some(Box::new(Value::Local(t.clone(), target_ty.clone()))),
            args: vec![],
        }),
        Statement::Invoke(Value::InvokeExpr {
            kind: InvokeKind::Virtual,
            method: entry_method,
            base: Some(Box::new(Value::Local(t.clone(), target_ty.clone()))),
            args,
        }),
        synthesize_return(&entry_return),
    ];
    Body::new(owner, stmts)
}

/// Synthesize a return value appropriate for `ty`: `void` returns nothing,
/// primitive-integer-like types return `0`, everything else returns `null`
/// (spec §4.2 ServicePatcher: "null for reference, 0 for integers").
pub(crate) fn synthesize_return(ty: &TypeRef) -> crate::ir::Statement {
    use crate::ir::{Statement, Value};
    if ty.is_void() {
        Statement::Return(None)
    } else if ty.is_primitive_integer() || ty.as_str() == "boolean" {
        Statement::Return(Some(Value::IntConstant(0)))
    } else {
        Statement::Return(Some(Value::NullConstant))
    }
}
