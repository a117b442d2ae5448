//! `AsyncTaskPatcher`/`ExecutorPatcher`/`ThreadPatcher` (spec §4.2): three
//! thin variants over the same new-site resolution shape as §4.1 — each
//! dispatch call's receiver local is resolved to its own `NewExpr` runtime
//! type, and a bridge into that type's work method is synthesized.

use super::{ensure_bridge, patch_container_class, CallGraphPatcher, PatchTags, PatcherKind};
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::errors::Result;
use crate::external::ManifestAnalysis;
use crate::icc::{Channel, ComponentSummaryTable, ICCCallerInfo};
use crate::ir::{Body, ClassId, InvokeKind, IrContext, Local, MethodId, Statement, TypeRef, Value};

/// Shared dispatch logic for the three worker-style channels: resolve the
/// dispatched object's own runtime class from its new-site, then bridge into
/// its work method.
fn dispatch(
    kind: PatcherKind,
    work_method: &str,
    work_params: Vec<TypeRef>,
    work_return: TypeRef,
    ctx: &mut IrContext,
    tags: &mut PatchTags,
    summary: &mut ComponentSummaryTable,
    sink: &dyn DiagnosticSink,
    body: &Body,
    stmt_idx: usize,
    receiver_local: &Local,
) -> Result<()> {
    let stmt_id = body.stmt_id(stmt_idx);

    let Some(runtime_class) = recover_runtime_class(receiver_local, body) else {
        sink.record(
            Diagnostic::new(DiagnosticKind::ResolutionIncomplete, "worker dispatch target could not be recovered")
                .with_stmt(stmt_id.clone()),
        );
        return Ok(());
    };

    let container = patch_container_class();
    let name = super::bridge_name(&runtime_class, kind);
    let bridge = MethodId::new(container, name, vec![], TypeRef::new("void"));
    let bridge_body = worker_bridge_body(bridge.clone(), &runtime_class, work_method, work_params, work_return);
    tags.attach(stmt_id.clone(), kind, bridge.clone());
    let bridge = ensure_bridge(ctx, bridge, bridge_body)?;

    summary.record_caller(
        body.owner.declaring_class.clone(),
        Channel::Icc,
        ICCCallerInfo::MessengerCaller {
            component: body.owner.declaring_class.clone(),
            method: body.owner.clone(),
            call_site: stmt_id,
            message_type: bridge.name.to_string(),
        },
    );
    Ok(())
}

fn recover_runtime_class(local: &Local, body: &Body) -> Option<ClassId> {
    let sites = body.new_sites_of(local);
    let &site = sites.first()?;
    if sites.len() != 1 {
        return None;
    }
    match body.statement_at(site)? {
        Statement::Assign(_, Value::NewExpr(ty)) => Some(ClassId::new(ty.as_str())),
        _ => None,
    }
}

fn worker_bridge_body(owner: MethodId, target: &ClassId, work_method: &str, work_params: Vec<TypeRef>, work_return: TypeRef) -> Body {
    let t = Local::new("w");
    let target_ty = TypeRef::new(target.as_str());
    let ctor = MethodId::new(target.clone(), "<init>", vec![], TypeRef::new("void"));
    let entry = MethodId::new(target.clone(), work_method, work_params.clone(), work_return.clone());
    let args = work_params.iter().map(|_| Value::NullConstant).collect();

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
            method: entry,
            base: Some(Box::new(Value::Local(t.clone(), target_ty))),
            args,
        }),
        super::synthesize_return(&work_return),
    ];
    Body::new(owner, stmts)
}

/// `AsyncTask.execute()`/`executeOnExecutor(...)` bridges into `doInBackground`.
#[derive(Debug, Default)]
pub struct AsyncTaskPatcher;

const ASYNC_TASK_METHODS: &[&str] = &["execute", "executeOnExecutor"];

impl CallGraphPatcher for AsyncTaskPatcher {
    fn kind(&self) -> PatcherKind {
        PatcherKind::AsyncTask
    }

    fn should_patch(&self, body: &Body, stmt: usize) -> bool {
        let Some(stmt) = body.statement_at(stmt) else { return false };
        let Some(expr) = stmt.invoke_expr() else { return false };
        let Some((_, method, Some(_), _)) = expr.as_invoke() else { return false };
        ASYNC_TASK_METHODS.contains(&method.name.as_ref())
    }

    fn patch(
        &self,
        ctx: &mut IrContext,
        _manifest: &dyn ManifestAnalysis,
        tags: &mut PatchTags,
        summary: &mut ComponentSummaryTable,
        sink: &dyn DiagnosticSink,
        body: &Body,
        stmt_idx: usize,
    ) -> Result<()> {
        let stmt = body.statement_at(stmt_idx).expect("should_patch verified this index");
        let expr = stmt.invoke_expr().expect("should_patch verified this is an invoke");
        let (_, _, base, _) = expr.as_invoke().expect("should_patch verified this is an invoke");
        let Some(receiver) = base.and_then(|b| b.base_local()) else { return Ok(()) };
        dispatch(PatcherKind::AsyncTask, "doInBackground", vec![TypeRef::new("java.lang.Object[]")], TypeRef::new("java.lang.Object"), ctx, tags, summary, sink, body, stmt_idx, receiver)
    }
}

/// `Executor.execute(Runnable)`/`ExecutorService.submit(Runnable)` bridges
/// into the submitted `Runnable`'s own `run()`.
#[derive(Debug, Default)]
pub struct ExecutorPatcher;

const EXECUTOR_METHODS: &[&str] = &["execute", "submit"];

impl CallGraphPatcher for ExecutorPatcher {
    fn kind(&self) -> PatcherKind {
        PatcherKind::Executor
    }

    fn should_patch(&self, body: &Body, stmt: usize) -> bool {
        let Some(stmt) = body.statement_at(stmt) else { return false };
        let Some(expr) = stmt.invoke_expr() else { return false };
        let Some((_, method, Some(_), args)) = expr.as_invoke() else { return false };
        EXECUTOR_METHODS.contains(&method.name.as_ref()) && !args.is_empty()
    }

    fn patch(
        &self,
        ctx: &mut IrContext,
        _manifest: &dyn ManifestAnalysis,
        tags: &mut PatchTags,
        summary: &mut ComponentSummaryTable,
        sink: &dyn DiagnosticSink,
        body: &Body,
        stmt_idx: usize,
    ) -> Result<()> {
        let stmt = body.statement_at(stmt_idx).expect("should_patch verified this index");
        let expr = stmt.invoke_expr().expect("should_patch verified this is an invoke");
        let (_, _, _, args) = expr.as_invoke().expect("should_patch verified this is an invoke");
        let Some(runnable) = args.first().and_then(|a| a.base_local()) else { return Ok(()) };
        dispatch(PatcherKind::Executor, "run", vec![], TypeRef::new("void"), ctx, tags, summary, sink, body, stmt_idx, runnable)
    }
}

/// `Thread.start()` bridges into the `Thread` subclass's own `run()`.
#[derive(Debug, Default)]
pub struct ThreadPatcher;

const THREAD_METHODS: &[&str] = &["start"];

impl CallGraphPatcher for ThreadPatcher {
    fn kind(&self) -> PatcherKind {
        PatcherKind::Thread
    }

    fn should_patch(&self, body: &Body, stmt: usize) -> bool {
        let Some(stmt) = body.statement_at(stmt) else { return false };
        let Some(expr) = stmt.invoke_expr() else { return false };
        let Some((_, method, Some(_), _)) = expr.as_invoke() else { return false };
        THREAD_METHODS.contains(&method.name.as_ref()) && method.declaring_class.as_str().contains("Thread")
    }

    fn patch(
        &self,
        ctx: &mut IrContext,
        _manifest: &dyn ManifestAnalysis,
        tags: &mut PatchTags,
        summary: &mut ComponentSummaryTable,
        sink: &dyn DiagnosticSink,
        body: &Body,
        stmt_idx: usize,
    ) -> Result<()> {
        let stmt = body.statement_at(stmt_idx).expect("should_patch verified this index");
        let expr = stmt.invoke_expr().expect("should_patch verified this is an invoke");
        let (_, _, base, _) = expr.as_invoke().expect("should_patch verified this is an invoke");
        let Some(receiver) = base.and_then(|b| b.base_local()) else { return Ok(()) };
        dispatch(PatcherKind::Thread, "run", vec![], TypeRef::new("void"), ctx, tags, summary, sink, body, stmt_idx, receiver)
    }
}
