//! `ServicePatcher` (spec §4.2): mirrors `ActivityPatcher` for
//! `startService`/`bindService`.

use super::{bridge_name, ensure_bridge, lifecycle_bridge_body, patch_container_class, resolve_or_fallback, CallGraphPatcher, PatchTags, PatcherKind};
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::errors::Result;
use crate::external::ManifestAnalysis;
use crate::icc::{Channel, ComponentSummaryTable, ICCCallerInfo};
use crate::intent::analysis::extract_intent_contents;
use crate::ir::{Body, IrContext, MethodId, TypeRef};

const START_METHODS: &[&str] = &["startService"];
const BIND_METHODS: &[&str] = &["bindService"];

#[derive(Debug, Default)]
pub struct ServicePatcher;

impl ServicePatcher {
    fn is_start(name: &str) -> bool {
        START_METHODS.contains(&name)
    }

    fn is_bind(name: &str) -> bool {
        BIND_METHODS.contains(&name)
    }
}

impl CallGraphPatcher for ServicePatcher {
    fn kind(&self) -> PatcherKind {
        PatcherKind::Service
    }

    fn should_patch(&self, body: &Body, stmt: usize) -> bool {
        let Some(stmt) = body.statement_at(stmt) else { return false };
        let Some(expr) = stmt.invoke_expr() else { return false };
        let Some((_, method, _, _)) = expr.as_invoke() else { return false };
        Self::is_start(method.name.as_ref()) || Self::is_bind(method.name.as_ref())
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

        let (entry_name, entry_params, entry_return): (&str, Vec<TypeRef>, TypeRef) = if Self::is_start(method.name.as_ref()) {
            ("onStartCommand", vec![TypeRef::new("android.content.Intent"), TypeRef::new("int"), TypeRef::new("int")], TypeRef::new("int"))
        } else {
            ("onBind", vec![TypeRef::new("android.content.Intent")], TypeRef::new("android.os.IBinder"))
        };

        let resolved_before_fallback = crate::intent::target_recovery::recover_target_classes(intent_local, body, ctx);
        let targets = resolve_or_fallback(intent_local, body, ctx, manifest.service_names());
        if resolved_before_fallback.is_empty() {
            sink.record(
                Diagnostic::new(DiagnosticKind::ResolutionIncomplete, "service target unresolved, falling back to manifest enumeration")
                    .with_stmt(stmt_id.clone()),
            );
        }

        let contents = extract_intent_contents(intent_local, stmt_idx, body, ctx);
        let content = contents.into_iter().next().unwrap_or_else(crate::intent::IntentContent::unresolved);

        let container = patch_container_class();
        for target in targets {
            let bridge = MethodId::new(container.clone(), bridge_name(&target, PatcherKind::Service), vec![], TypeRef::new("void"));
            let bridge_body = lifecycle_bridge_body(bridge.clone(), &target, entry_name, entry_params.clone(), entry_return.clone());
            tags.attach(stmt_id.clone(), PatcherKind::Service, bridge.clone());
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
