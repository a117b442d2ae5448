//! `ActivityPatcher` (spec §4.2): `startActivity`/`startActivityForResult`.

use super::{bridge_name, ensure_bridge, lifecycle_bridge_body, patch_container_class, resolve_or_fallback, CallGraphPatcher, PatchTags, PatcherKind};
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::errors::Result;
use crate::external::ManifestAnalysis;
use crate::icc::{Channel, ComponentSummaryTable, ICCCallerInfo};
use crate::intent::analysis::extract_intent_contents;
use crate::ir::{Body, IrContext, MethodId, TypeRef};

const TRIGGER_METHODS: &[&str] = &["startActivity", "startActivityForResult"];

#[derive(Debug, Default)]
pub struct ActivityPatcher;

impl CallGraphPatcher for ActivityPatcher {
    fn kind(&self) -> PatcherKind {
        PatcherKind::Activity
    }

    fn should_patch(&self, body: &Body, stmt: usize) -> bool {
        let Some(stmt) = body.statement_at(stmt) else { return false };
        let Some(expr) = stmt.invoke_expr() else { return false };
        let Some((_, method, _, _)) = expr.as_invoke() else { return false };
        TRIGGER_METHODS.contains(&method.name.as_ref())
    }

    fn patch(
        &self,
        ctx: &mut IrContext,
        manifest: &dyn ManifestAnalysis,
        tags: &mut PatchTags,
        summary: &mut ComponentSummaryTable,
        sink: &dyn DiagnosticSink,
        body: &Body,
        stmt_idx: usize,
    ) -> Result<()> {
        let stmt_id = body.stmt_id(stmt_idx);
        let stmt = body.statement_at(stmt_idx).expect("should_patch verified this index");
        let expr = stmt.invoke_expr().expect("should_patch verified this is an invoke");
        let (_, method, _, args) = expr.as_invoke().expect("should_patch verified this is an invoke");

        let Some(intent_local) = args.first().and_then(|a| a.base_local()) else {
            return Ok(());
        };

        let resolved_before_fallback = crate::intent::target_recovery::recover_target_classes(intent_local, body, ctx);
        let targets = resolve_or_fallback(intent_local, body, ctx, manifest.activity_names());
        if resolved_before_fallback.is_empty() {
            sink.record(
                Diagnostic::new(DiagnosticKind::ResolutionIncomplete, "activity target unresolved, falling back to manifest enumeration")
                    .with_stmt(stmt_id.clone()),
            );
        }

        let contents = extract_intent_contents(intent_local, stmt_idx, body, ctx);
        let content = contents.into_iter().next().unwrap_or_else(crate::intent::IntentContent::unresolved);

        let container = patch_container_class();
        for target in targets {
            let bridge = MethodId::new(container.clone(), bridge_name(&target, PatcherKind::Activity), vec![], TypeRef::new("void"));
            let bridge_body = lifecycle_bridge_body(bridge.clone(), &target, "onCreate", vec![TypeRef::new("android.os.Bundle")], TypeRef::new("void"));
            tags.attach(stmt_id.clone(), PatcherKind::Activity, bridge.clone());
            ensure_bridge(ctx, bridge, bridge_body)?;
        }

        summary.record_caller(
            body.owner.declaring_class.clone(),
            Channel::Icc,
            ICCCallerInfo::IntentCaller {
                component: body.owner.declaring_class.clone(),
                method: body.owner.clone(),
                call_site: stmt_id,
                intent_content: content,
                icc_method_name: method.name.to_string(),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingDiagnosticSink;
    use crate::external::InMemoryManifestAnalysis;
    use crate::ir::{Class, ClassId, InvokeKind, Local, Origin, Statement, Value};

    fn caller_method() -> MethodId {
        MethodId::new(ClassId::new("com.example.MainActivity"), "onClick", vec![], TypeRef::new("void"))
    }

    fn start_activity() -> MethodId {
        MethodId::new(ClassId::new("android.app.Activity"), "startActivity", vec![TypeRef::new("android.content.Intent")], TypeRef::new("void"))
    }

    #[test]
    fn creates_bridge_and_tag_for_explicit_target() {
        let mut ctx = IrContext::new();
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
                method: start_activity(),
                base: None,
                args: vec![Value::Local(i.clone(), intent_ty)],
            }),
        ];
        let body = Body::new(caller_method(), stmts);

        let patcher = ActivityPatcher;
        assert!(patcher.should_patch(&body, 2));

        let manifest = InMemoryManifestAnalysis::new();
        let mut tags = PatchTags::new();
        let mut summary = ComponentSummaryTable::new();
        let sink = CollectingDiagnosticSink::new();

        patcher.patch(&mut ctx, &manifest, &mut tags, &mut summary, &sink, &body, 2).unwrap();

        let bridge_name = super::bridge_name(&ClassId::new("com.example.TestActivity"), PatcherKind::Activity);
        assert!(ctx.lookup_class(&patch_container_class()).unwrap().methods.iter().any(|m| m.name.as_ref() == bridge_name));
        assert_eq!(tags.entries().count(), 1);
        assert_eq!(sink.diagnostics().len(), 0);
    }

    #[test]
    fn falls_back_to_manifest_when_unresolved() {
        let mut ctx = IrContext::new();
        let i = Local::new("i");
        let intent_ty = TypeRef::new("android.content.Intent");
        let stmts = vec![
            Statement::Identity(i.clone(), crate::ir::Value::ParameterRef { index: 1, ty: intent_ty.clone() }),
            Statement::Invoke(Value::InvokeExpr {
                kind: InvokeKind::Virtual,
                method: start_activity(),
                base: None,
                args: vec![Value::Local(i.clone(), intent_ty)],
            }),
        ];
        let body = Body::new(caller_method(), stmts);

        let manifest = InMemoryManifestAnalysis::new().with_activity(ClassId::new("com.example.OtherActivity"));
        let mut tags = PatchTags::new();
        let mut summary = ComponentSummaryTable::new();
        let sink = CollectingDiagnosticSink::new();

        ActivityPatcher.patch(&mut ctx, &manifest, &mut tags, &mut summary, &sink, &body, 1).unwrap();

        assert_eq!(tags.entries().count(), 1);
        assert_eq!(sink.count_of(crate::diagnostics::DiagnosticKind::ResolutionIncomplete), 1);
    }
}
