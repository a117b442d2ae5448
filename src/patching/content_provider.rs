//! `ContentProviderPatcher` (spec §4.2): `ContentResolver` methods resolved
//! by URI authority rather than by class-name/component-name setters.

use super::{ensure_bridge, patch_container_class, CallGraphPatcher, PatchTags, PatcherKind};
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::errors::Result;
use crate::external::ManifestAnalysis;
use crate::icc::{Channel, ComponentSummaryTable, ICCCallerInfo};
use crate::intent::uri::resolve_uri;
use crate::intent::IntentContent;
use crate::ir::{Body, ClassId, InvokeKind, IrContext, MethodId, Statement, TypeRef, Value};

const RESOLVER_METHODS: &[&str] = &["query", "insert", "update", "delete", "getType", "openFileDescriptor", "openAssetFileDescriptor"];

#[derive(Debug, Default)]
pub struct ContentProviderPatcher;

impl CallGraphPatcher for ContentProviderPatcher {
    fn kind(&self) -> PatcherKind {
        PatcherKind::ContentProvider
    }

    fn should_patch(&self, body: &Body, stmt: usize) -> bool {
        let Some(stmt) = body.statement_at(stmt) else { return false };
        let Some(expr) = stmt.invoke_expr() else { return false };
        let Some((_, method, _, _)) = expr.as_invoke() else { return false };
        RESOLVER_METHODS.contains(&method.name.as_ref())
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

        let Some(uri_arg) = args.first() else {
            return Ok(());
        };
        let data = resolve_uri(uri_arg, body, stmt_idx);

        let authorities = manifest.provider_authorities();
        let targets: Vec<ClassId> = if data.host == crate::intent::ANY {
            sink.record(
                Diagnostic::new(DiagnosticKind::ResolutionIncomplete, "content uri authority unresolved, falling back to every manifest provider")
                    .with_stmt(stmt_id.clone()),
            );
            manifest.provider_names().iter().cloned().collect()
        } else {
            match authorities.get(&data.host) {
                Some(class) => vec![class.clone()],
                None => {
                    sink.record(
                        Diagnostic::new(DiagnosticKind::ResolutionIncomplete, format!("content uri authority '{}' matches no declared provider", data.host))
                            .with_stmt(stmt_id.clone()),
                    );
                    vec![]
                }
            }
        };

        let mut content = IntentContent::new_candidate();
        content.mark_data(data);

        let container = patch_container_class();
        for target in &targets {
            content.mark_component(Some(target.clone()));
            let (entry_name, entry_return) = bridge_entry(method.name.as_ref());
            let bridge = MethodId::new(container.clone(), bridge_name(target, method.name.as_ref()), vec![], TypeRef::new("void"));
            let bridge_body = provider_bridge_body(bridge.clone(), target, entry_name, entry_return);
            tags.attach(stmt_id.clone(), PatcherKind::ContentProvider, bridge.clone());
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

/// `openFileDescriptor`/`openAssetFileDescriptor` bridge to the provider's
/// `openFile`/`openAssetFile`; every other resolver method keeps its name.
fn bridge_entry(resolver_method: &str) -> (&'static str, TypeRef) {
    match resolver_method {
        "insert" => ("insert", TypeRef::new("android.net.Uri")),
        "update" => ("update", TypeRef::new("int")),
        "delete" => ("delete", TypeRef::new("int")),
        "getType" => ("getType", TypeRef::new("String")),
        "openFileDescriptor" => ("openFile", TypeRef::new("android.os.ParcelFileDescriptor")),
        "openAssetFileDescriptor" => ("openAssetFile", TypeRef::new("android.content.res.AssetFileDescriptor")),
        _ => ("query", TypeRef::new("android.database.Cursor")),
    }
}

fn bridge_name(target: &ClassId, resolver_method: &str) -> String {
    let (entry_name, _) = bridge_entry(resolver_method);
    format!("bridge_{}_provider_{}", target.dotted_to_underscored(), entry_name)
}

/// `NEW provider; <init>(); <entry>(Uri,...); RETURN` — the provider bridge
/// shares the lifecycle shape of [`super::lifecycle_bridge_body`] but the
/// entry callback always takes a `Uri` first, so it is built directly
/// rather than reusing that helper's fixed parameter list.
fn provider_bridge_body(owner: MethodId, target: &ClassId, entry_name: &str, entry_return: TypeRef) -> Body {
    let t = crate::ir::Local::new("p");
    let target_ty = TypeRef::new(target.as_str());
    let ctor = MethodId::new(target.clone(), "<init>", vec![], TypeRef::new("void"));
    let entry_method = MethodId::new(target.clone(), entry_name, vec![TypeRef::new("android.net.Uri")], entry_return.clone());

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
            base: Some(Box::new(Value::Local(t.clone(), target_ty))),
            args: vec![Value::NullConstant],
        }),
        super::synthesize_return(&entry_return),
    ];
    Body::new(owner, stmts)
}
