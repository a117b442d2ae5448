//! `PatchingOrchestrator` (spec §4.2): drives every registered
//! [`CallGraphPatcher`] over every application-class method body, then
//! materializes one synthetic call-graph edge per [`PatchTags`] entry.

use super::{CallGraphPatcher, PatchTags};
use crate::diagnostics::DiagnosticSink;
use crate::errors::Result;
use crate::external::ManifestAnalysis;
use crate::icc::ComponentSummaryTable;
use crate::ir::IrContext;

/// Outcome of one full orchestration pass, for logging/tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchSummary {
    pub bridges_created: usize,
    pub statements_patched: usize,
    pub edges_synthesized: usize,
}

/// Holds the fixed-order patcher list (spec §4.2: "each statement of each
/// body is offered to every registered patcher, in fixed registration
/// order") and runs one pass over a scene.
pub struct PatchingOrchestrator {
    patchers: Vec<Box<dyn CallGraphPatcher>>,
}

impl Default for PatchingOrchestrator {
    fn default() -> Self {
        Self::with_default_patchers()
    }
}

impl PatchingOrchestrator {
    pub fn new(patchers: Vec<Box<dyn CallGraphPatcher>>) -> Self {
        Self { patchers }
    }

    /// All six named channels, in the order spec §4.2 lists them.
    pub fn with_default_patchers() -> Self {
        Self::new(vec![
            Box::new(super::ActivityPatcher),
            Box::new(super::ServicePatcher),
            Box::new(super::BroadcastReceiverPatcher),
            Box::new(super::ContentProviderPatcher),
            Box::new(super::MessengerPatcher),
            Box::new(super::AsyncTaskPatcher),
            Box::new(super::ExecutorPatcher),
            Box::new(super::ThreadPatcher),
        ])
    }

    /// Run one full pass: every statement of every application class's
    /// method body is offered to every patcher in registration order; a
    /// patcher claiming a statement mutates the scene and attaches its tag.
    /// Tags are then materialized into synthetic call-graph edges.
    pub fn run(&self, ctx: &mut IrContext, manifest: &dyn ManifestAnalysis, sink: &dyn DiagnosticSink, summary: &mut ComponentSummaryTable) -> Result<PatchSummary> {
        let mut tags = PatchTags::new();
        let mut statements_patched = 0usize;

        let bodies: Vec<_> = ctx
            .application_classes()
            .flat_map(|class| class.methods.iter().cloned())
            .filter_map(|method| ctx.body_of(&method).cloned().map(|body| (method, body)))
            .collect();

        for (_, body) in &bodies {
            for stmt_idx in 0..body.len() {
                let mut any_claimed = false;
                for patcher in &self.patchers {
                    if patcher.should_patch(body, stmt_idx) {
                        patcher.patch(ctx, manifest, &mut tags, summary, sink, body, stmt_idx)?;
                        any_claimed = true;
                    }
                }
                if any_claimed {
                    statements_patched += 1;
                }
            }
        }

        let bridges_created = count_bridges(ctx);
        let mut edges_synthesized = 0usize;
        for (stmt, kind, bridge) in tags.entries() {
            ctx.call_graph.add_edge(&stmt.method, bridge, Some(stmt.clone()), kind.edge_kind());
            edges_synthesized += 1;
        }

        Ok(PatchSummary {
            bridges_created,
            statements_patched,
            edges_synthesized,
        })
    }
}

fn count_bridges(ctx: &IrContext) -> usize {
    ctx.lookup_class(&super::patch_container_class()).map(|c| c.methods.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingDiagnosticSink;
    use crate::external::InMemoryManifestAnalysis;
    use crate::ir::{Body, Class, ClassId, InvokeKind, Local, MethodId, Origin, Statement, TypeRef, Value};

    #[test]
    fn orchestrator_patches_explicit_service_dispatch_and_synthesizes_edge() {
        let mut ctx = IrContext::new();
        let caller = MethodId::new(ClassId::new("com.example.Caller"), "m", vec![], TypeRef::new("void"));
        ctx.add_class(Class::new(ClassId::new("com.example.Caller"), Origin::Application).with_methods(vec![caller.clone()]));
        ctx.add_class(Class::new(ClassId::new("com.example.TestService"), Origin::Application));

        let i = Local::new("i");
        let intent_ty = TypeRef::new("android.content.Intent");
        let stmts = vec![
            Statement::Assign(i.clone(), Value::NewExpr(intent_ty.clone())),
            Statement::Invoke(Value::InvokeExpr {
                kind: InvokeKind::Virtual,
                method: MethodId::new(ClassId::new("android.content.Intent"), "setClassName", vec![TypeRef::new("String"), TypeRef::new("String")], intent_ty.clone()),
                base: Some(Box::new(Value::Local(i.clone(), intent_ty.clone()))),
                args: vec![Value::StringConstant("com.example".into()), Value::StringConstant("TestService".into())],
            }),
            Statement::Invoke(Value::InvokeExpr {
                kind: InvokeKind::Virtual,
                method: MethodId::new(ClassId::new("com.example.Caller"), "startService", vec![intent_ty.clone()], TypeRef::new("android.content.ComponentName")),
                base: None,
                args: vec![Value::Local(i.clone(), intent_ty)],
            }),
        ];
        ctx.add_body(Body::new(caller.clone(), stmts));

        let orchestrator = PatchingOrchestrator::with_default_patchers();
        let manifest = InMemoryManifestAnalysis::new();
        let sink = CollectingDiagnosticSink::new();
        let mut summary = ComponentSummaryTable::new();
        let result = orchestrator.run(&mut ctx, &manifest, &sink, &mut summary).unwrap();

        assert_eq!(result.statements_patched, 1);
        assert_eq!(result.bridges_created, 1);
        assert_eq!(result.edges_synthesized, 1);
        assert_eq!(ctx.call_graph.edges_out_of(&caller).len(), 1);
    }

    #[test]
    fn rerunning_orchestrator_is_idempotent() {
        let mut ctx = IrContext::new();
        let caller = MethodId::new(ClassId::new("com.example.Caller"), "m", vec![], TypeRef::new("void"));
        ctx.add_class(Class::new(ClassId::new("com.example.Caller"), Origin::Application).with_methods(vec![caller.clone()]));
        ctx.add_class(Class::new(ClassId::new("com.example.TestActivity"), Origin::Application));

        let i = Local::new("i");
        let intent_ty = TypeRef::new("android.content.Intent");
        let stmts = vec![
            Statement::Assign(i.clone(), Value::NewExpr(intent_ty.clone())),
            Statement::Invoke(Value::InvokeExpr {
                kind: InvokeKind::Virtual,
                method: MethodId::new(ClassId::new("android.content.Intent"), "setClassName", vec![TypeRef::new("String"), TypeRef::new("String")], intent_ty.clone()),
                base: Some(Box::new(Value::Local(i.clone(), intent_ty.clone()))),
                args: vec![Value::StringConstant("com.example".into()), Value::StringConstant("TestActivity".into())],
            }),
            Statement::Invoke(Value::InvokeExpr {
                kind: InvokeKind::Virtual,
                method: MethodId::new(ClassId::new("android.app.Activity"), "startActivity", vec![intent_ty.clone()], TypeRef::new("void")),
                base: None,
                args: vec![Value::Local(i.clone(), intent_ty)],
            }),
        ];
        ctx.add_body(Body::new(caller.clone(), stmts));

        let orchestrator = PatchingOrchestrator::with_default_patchers();
        let manifest = InMemoryManifestAnalysis::new();
        let sink = CollectingDiagnosticSink::new();
        let mut summary = ComponentSummaryTable::new();
        orchestrator.run(&mut ctx, &manifest, &sink, &mut summary).unwrap();
        let second = orchestrator.run(&mut ctx, &manifest, &sink, &mut summary).unwrap();

        assert_eq!(second.bridges_created, 1);
        let caller_class = ctx.lookup_class(&ClassId::new("$IccCore$PatchContainer")).unwrap();
        assert_eq!(caller_class.methods.len(), 1);
    }
}
