//! `BroadcastReceiverPatcher` (spec §4.2): `sendBroadcast` family and the
//! two `registerReceiver` overloads.

use super::{ensure_bridge, lifecycle_bridge_body, patch_container_class, CallGraphPatcher, PatchTags, PatcherKind};
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::errors::Result;
use crate::external::ManifestAnalysis;
use crate::icc::{Channel, ComponentSummaryTable, ICCCalleeInfo, ICCCallerInfo};
use crate::intent::analysis::extract_intent_contents;
use crate::intent::target_recovery::recover_target_classes;
use crate::intent::{ComponentRole, IntentFilter};
use crate::ir::{Body, ClassId, IrContext, Local, MethodId, TypeRef};
use rustc_hash::FxHashSet;

const SEND_METHODS: &[&str] = &["sendBroadcast", "sendOrderedBroadcast", "sendStickyBroadcast"];
const REGISTER_METHODS: &[&str] = &["registerReceiver"];

#[derive(Debug, Default)]
pub struct BroadcastReceiverPatcher;

impl CallGraphPatcher for BroadcastReceiverPatcher {
    fn kind(&self) -> PatcherKind {
        PatcherKind::BroadcastReceiver
    }

    fn should_patch(&self, body: &Body, stmt: usize) -> bool {
        let Some(stmt) = body.statement_at(stmt) else { return false };
        let Some(expr) = stmt.invoke_expr() else { return false };
        let Some((_, method, _, _)) = expr.as_invoke() else { return false };
        SEND_METHODS.contains(&method.name.as_ref()) || REGISTER_METHODS.contains(&method.name.as_ref())
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

        if REGISTER_METHODS.contains(&method.name.as_ref()) {
            self.patch_register(ctx, tags, summary, body, stmt_idx, &stmt_id, args)
        } else {
            self.patch_send(ctx, manifest, tags, summary, sink, body, stmt_idx, &stmt_id, method.name.to_string(), args)
        }
    }
}

impl BroadcastReceiverPatcher {
    #[allow(clippy::too_many_arguments)]
    fn patch_send(
        &self,
        ctx: &mut IrContext,
        manifest: &dyn ManifestAnalysis,
        tags: &mut PatchTags,
        summary: &mut ComponentSummaryTable,
        sink: &dyn DiagnosticSink,
        body: &Body,
        stmt_idx: usize,
        stmt_id: &crate::ir::StmtId,
        icc_method_name: String,
        args: &[crate::ir::Value],
    ) -> Result<()> {
        let Some(intent_local) = args.first().and_then(|a| a.base_local()) else {
            return Ok(());
        };

        let resolved = recover_target_classes(intent_local, body, ctx);
        let receivers = manifest.receiver_names();
        let mut used_fallback = false;
        let mut targets: Vec<ClassId> = resolved.into_iter().filter(|c| receivers.contains(c)).collect();
        if targets.is_empty() {
            used_fallback = true;
            targets = receivers.iter().cloned().collect();
            sink.record(
                Diagnostic::new(DiagnosticKind::ResolutionIncomplete, "broadcast target unresolved, falling back to every manifest receiver")
                    .with_stmt(stmt_id.clone()),
            );
        }

        let contents = extract_intent_contents(intent_local, stmt_idx, body, ctx);
        let content = contents.into_iter().next().unwrap_or_else(crate::intent::IntentContent::unresolved);

        let container = patch_container_class();
        for target in &targets {
            let name = if used_fallback {
                format!("bridge_{}_broadcast_fallback", target.dotted_to_underscored())
            } else {
                super::bridge_name(target, PatcherKind::BroadcastReceiver)
            };
            let bridge = MethodId::new(container.clone(), name, vec![], TypeRef::new("void"));
            let bridge_body = lifecycle_bridge_body(bridge.clone(), target, "onReceive", vec![TypeRef::new("android.content.Context"), TypeRef::new("android.content.Intent")], TypeRef::new("void"));
            tags.attach(stmt_id.clone(), PatcherKind::BroadcastReceiver, bridge.clone());
            ensure_bridge(ctx, bridge, bridge_body)?;
        }

        summary.record_caller(
            body.owner.declaring_class.clone(),
            Channel::Icc,
            ICCCallerInfo::IntentCaller {
                component: body.owner.declaring_class.clone(),
                method: body.owner.clone(),
                call_site: stmt_id.clone(),
                intent_content: content,
                icc_method_name,
            },
        );
        Ok(())
    }

    fn patch_register(
        &self,
        ctx: &mut IrContext,
        tags: &mut PatchTags,
        summary: &mut ComponentSummaryTable,
        body: &Body,
        stmt_idx: usize,
        stmt_id: &crate::ir::StmtId,
        args: &[crate::ir::Value],
    ) -> Result<()> {
        let Some(receiver_local) = args.first().and_then(|a| a.base_local()) else {
            return Ok(());
        };
        let Some(receiver_class) = recover_runtime_class(receiver_local, body) else {
            // Spec §4.2: a dynamic receiver whose class cannot be recovered
            // is skipped rather than fanned out.
            return Ok(());
        };

        let filter = args.get(1).and_then(|a| a.base_local()).map(|l| collect_intent_filter(l, body)).unwrap_or_else(|| IntentFilter::new(ComponentRole::BroadcastReceiver));

        let entry_method = MethodId::new(receiver_class.clone(), "onReceive", vec![TypeRef::new("android.content.Context"), TypeRef::new("android.content.Intent")], TypeRef::new("void"));

        summary.record_callee(
            receiver_class.clone(),
            Channel::Icc,
            ICCCalleeInfo::IntentCallee {
                component: receiver_class.clone(),
                exported: true,
                permissions: FxHashSet::default(),
                filters: vec![filter],
                entry_method: entry_method.clone(),
            },
        );

        let container = patch_container_class();
        let name = format!("bridge_{}_dynamic_registration", receiver_class.dotted_to_underscored());
        let bridge = MethodId::new(container, name, vec![], TypeRef::new("void"));
        let bridge_body = lifecycle_bridge_body(bridge.clone(), &receiver_class, "onReceive", vec![TypeRef::new("android.content.Context"), TypeRef::new("android.content.Intent")], TypeRef::new("void"));
        tags.attach(stmt_id.clone(), PatcherKind::BroadcastReceiver, bridge.clone());
        ensure_bridge(ctx, bridge, bridge_body)?;
        let _ = stmt_idx;
        Ok(())
    }
}

/// Recover the runtime class of a local from its own (unique) `NewExpr`
/// new-site, without walking any builder calls — used for the receiver
/// argument of `registerReceiver`, which is a plain constructed object, not
/// a message-object builder.
fn recover_runtime_class(local: &Local, body: &Body) -> Option<ClassId> {
    let sites = body.new_sites_of(local);
    let &site = sites.first()?;
    if sites.len() != 1 {
        return None;
    }
    match body.statement_at(site)? {
        crate::ir::Statement::Assign(_, crate::ir::Value::NewExpr(ty)) => Some(ClassId::new(ty.as_str())),
        _ => None,
    }
}

/// Localized builder walk over `addAction`/`addCategory`/`addDataScheme`
/// mirroring the shape of [`crate::intent::analysis::extract_intent_contents`]
/// but against an `IntentFilter` local rather than a message object.
fn collect_intent_filter(local: &Local, body: &Body) -> IntentFilter {
    let mut filter = IntentFilter::new(ComponentRole::BroadcastReceiver);
    let sites = body.new_sites_of(local);
    let Some(&new_site) = sites.first() else {
        return filter;
    };

    for use_idx in body.uses_of_local(local) {
        if use_idx <= new_site || !body.defs_of_at(local, use_idx).contains(&new_site) {
            continue;
        }
        let Some(stmt) = body.statement_at(use_idx) else { continue };
        let Some(expr) = stmt.invoke_expr() else { continue };
        let Some((_, method, Some(base), args)) = expr.as_invoke() else { continue };
        if base.base_local() != Some(local) {
            continue;
        }
        match method.name.as_ref() {
            "addAction" => {
                filter.actions.insert(args.first().and_then(|a| a.as_string_constant()).unwrap_or(crate::intent::ANY).to_string());
            }
            "addCategory" => {
                filter.categories.insert(args.first().and_then(|a| a.as_string_constant()).unwrap_or(crate::intent::ANY).to_string());
            }
            "addDataScheme" => {
                let mut data = crate::intent::UriData::unresolved();
                data.scheme = args.first().and_then(|a| a.as_string_constant()).unwrap_or(crate::intent::ANY).to_string();
                filter.data.insert(data);
            }
            _ => {}
        }
    }
    filter
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingDiagnosticSink;
    use crate::external::InMemoryManifestAnalysis;
    use crate::ir::{InvokeKind, Statement, Value};

    fn caller_method() -> MethodId {
        MethodId::new(ClassId::new("Caller"), "m", vec![], TypeRef::new("void"))
    }

    /// spec E3: dynamic receiver registration.
    #[test]
    fn e3_dynamic_receiver_registration() {
        let mut ctx = IrContext::new();
        let r = Local::new("r");
        let f = Local::new("f");
        let receiver_ty = TypeRef::new("com.example.MyReceiver");
        let filter_ty = TypeRef::new("android.content.IntentFilter");
        let stmts = vec![
            Statement::Assign(r.clone(), Value::NewExpr(receiver_ty.clone())),
            Statement::Assign(f.clone(), Value::NewExpr(filter_ty.clone())),
            Statement::Invoke(Value::InvokeExpr {
                kind: InvokeKind::Virtual,
                method: MethodId::new(ClassId::new("android.content.IntentFilter"), "addAction", vec![TypeRef::new("String")], filter_ty.clone()),
                base: Some(Box::new(Value::Local(f.clone(), filter_ty.clone()))),
                args: vec![Value::StringConstant("ACTION_DYNAMIC_1".into())],
            }),
            Statement::Invoke(Value::InvokeExpr {
                kind: InvokeKind::Virtual,
                method: MethodId::new(ClassId::new("Caller"), "registerReceiver", vec![TypeRef::new("android.content.BroadcastReceiver"), filter_ty.clone()], TypeRef::new("android.content.Intent")),
                base: None,
                args: vec![Value::Local(r.clone(), receiver_ty), Value::Local(f.clone(), filter_ty)],
            }),
        ];
        let body = Body::new(caller_method(), stmts);

        let patcher = BroadcastReceiverPatcher;
        assert!(patcher.should_patch(&body, 3));

        let manifest = InMemoryManifestAnalysis::new();
        let mut tags = PatchTags::new();
        let mut summary = ComponentSummaryTable::new();
        let sink = CollectingDiagnosticSink::new();
        patcher.patch(&mut ctx, &manifest, &mut tags, &mut summary, &sink, &body, 3).unwrap();

        let receiver_class = ClassId::new("com.example.MyReceiver");
        let callees = summary.callees_of(&receiver_class, Channel::Icc);
        assert_eq!(callees.len(), 1);
        match &callees[0] {
            ICCCalleeInfo::IntentCallee { exported, filters, .. } => {
                assert!(*exported);
                assert_eq!(filters.len(), 1);
                assert!(filters[0].actions.contains("ACTION_DYNAMIC_1"));
            }
            _ => panic!("expected IntentCallee"),
        }

        let bridge_name = format!("bridge_{}_dynamic_registration", receiver_class.dotted_to_underscored());
        assert!(ctx.lookup_class(&patch_container_class()).unwrap().methods.iter().any(|m| m.name.as_ref() == bridge_name));
    }

    /// spec E2: unresolved broadcast falls back to every manifest receiver.
    #[test]
    fn e2_unresolved_broadcast_falls_back_to_manifest() {
        let mut ctx = IrContext::new();
        let i = Local::new("i");
        let intent_ty = TypeRef::new("android.content.Intent");
        let stmts = vec![
            Statement::Identity(i.clone(), Value::ParameterRef { index: 1, ty: intent_ty.clone() }),
            Statement::Invoke(Value::InvokeExpr {
                kind: InvokeKind::Virtual,
                method: MethodId::new(ClassId::new("Caller"), "sendBroadcast", vec![intent_ty.clone()], TypeRef::new("void")),
                base: None,
                args: vec![Value::Local(i.clone(), intent_ty)],
            }),
        ];
        let body = Body::new(caller_method(), stmts);

        let manifest = InMemoryManifestAnalysis::new()
            .with_receiver(ClassId::new("com.example.ReceiverOne"))
            .with_receiver(ClassId::new("com.example.ReceiverTwo"));
        let mut tags = PatchTags::new();
        let mut summary = ComponentSummaryTable::new();
        let sink = CollectingDiagnosticSink::new();
        BroadcastReceiverPatcher.patch(&mut ctx, &manifest, &mut tags, &mut summary, &sink, &body, 1).unwrap();

        assert_eq!(tags.entries().count(), 2);
        for receiver in ["com.example.ReceiverOne", "com.example.ReceiverTwo"] {
            let name = format!("bridge_{}_broadcast_fallback", ClassId::new(receiver).dotted_to_underscored());
            assert!(ctx.lookup_class(&patch_container_class()).unwrap().methods.iter().any(|m| m.name.as_ref() == name));
        }
    }
}
