//! `IntentAnalysisHelper`: the backward builder-pattern walk (spec §4.1).
//!
//! Message objects are written in builder style with short local lifetimes;
//! a local def/use walk is sufficient and avoids a global points-to
//! analysis (spec's rationale, kept verbatim here because it's the reason
//! this module does *not* reach for an interprocedural points-to crate).

use super::methods::{effect_of, BuilderEffect};
use super::target_recovery::recover_target_classes;
use super::uri::resolve_uri;
use super::{IntentContent, UriData, ValueOrigin};
use crate::ir::{Body, IrContext, Local, Statement, Value};

/// Recover every `IntentContent` candidate for `local` at statement `at`
/// (the dispatch call site). One candidate per distinct `NewExpr` new-site
/// reaching `at`; a single unresolved candidate if none reach it (spec
/// §4.1 step 3).
pub fn extract_intent_contents(local: &Local, at: usize, body: &Body, ctx: &IrContext) -> Vec<IntentContent> {
    let reaching = body.defs_of_at(local, at);
    let mut new_sites: Vec<usize> = reaching
        .into_iter()
        .filter(|&idx| is_new_expr_site(body, idx))
        .collect();
    new_sites.sort_unstable();

    if new_sites.is_empty() {
        return vec![IntentContent::unresolved()];
    }

    new_sites
        .into_iter()
        .map(|new_site| build_candidate(local, new_site, body, ctx))
        .collect()
}

fn is_new_expr_site(body: &Body, idx: usize) -> bool {
    matches!(body.statement_at(idx), Some(Statement::Assign(_, Value::NewExpr(_))))
}

fn build_candidate(local: &Local, new_site: usize, body: &Body, ctx: &IrContext) -> IntentContent {
    let mut candidate = IntentContent::new_candidate();

    let mut use_sites: Vec<usize> = body
        .uses_of_local(local)
        .into_iter()
        .filter(|&use_idx| use_idx > new_site && body.defs_of_at(local, use_idx).contains(&new_site))
        .collect();
    use_sites.sort_unstable();

    for use_idx in use_sites {
        let Some(stmt) = body.statement_at(use_idx) else { continue };
        let Some(expr) = stmt.invoke_expr() else { continue };
        let Some((_kind, method, Some(base), args)) = expr.as_invoke() else { continue };
        if base.base_local() != Some(local) {
            continue;
        }
        let Some(effect) = effect_of(method.name.as_ref()) else { continue };
        apply_effect(&mut candidate, effect, local, use_idx, args, body, ctx);
    }

    candidate
}

fn apply_effect(
    candidate: &mut IntentContent,
    effect: BuilderEffect,
    local: &Local,
    use_idx: usize,
    args: &[Value],
    body: &Body,
    ctx: &IrContext,
) {
    match effect {
        BuilderEffect::SetTarget(_) => {
            // Reuse the dedicated target-recovery walk rather than
            // re-deriving the resolution rules here; it already knows how
            // to resolve each of the three setter kinds for this local.
            let targets = recover_target_classes(local, body, ctx);
            if targets.is_empty() {
                candidate.mark_component(None);
            } else {
                for t in targets {
                    candidate.mark_component(Some(t));
                }
            }
        }
        BuilderEffect::SetAction => {
            candidate.mark_action(args.first().and_then(|a| a.as_string_constant()).map(String::from));
        }
        BuilderEffect::AddCategory => {
            candidate.mark_category(args.first().and_then(|a| a.as_string_constant()).map(String::from));
        }
        BuilderEffect::SetData => {
            let data = args.first().map(|a| resolve_uri(a, body, use_idx)).unwrap_or_default();
            candidate.mark_data(data);
        }
        BuilderEffect::SetDataAndType => {
            let mut data = args.first().map(|a| resolve_uri(a, body, use_idx)).unwrap_or_default();
            if let Some(mime) = args.get(1).and_then(|a| a.as_string_constant()) {
                data.mime_type = mime.to_string();
            }
            candidate.mark_data(data);
        }
        BuilderEffect::SetType => {
            let mime = args.first().and_then(|a| a.as_string_constant());
            let data = UriData {
                mime_type: mime.map(String::from).unwrap_or_else(|| super::ANY.to_string()),
                ..UriData::unresolved()
            };
            candidate.mark_data(data);
        }
        BuilderEffect::PutExtra => {
            if let Some(key) = args.first().and_then(|a| a.as_string_constant()) {
                let origin = args.get(1).map(|v| classify_origin(v, use_idx, body)).unwrap_or(ValueOrigin::LocalOrigin);
                candidate.mark_extra(key.to_string(), origin);
            }
        }
        BuilderEffect::SetFlags => {
            if let Some(n) = args.first().and_then(|a| a.as_int_constant()) {
                candidate.mark_flag(n.to_string());
            }
        }
    }
}

fn classify_origin(value: &Value, at: usize, body: &Body) -> ValueOrigin {
    match value {
        Value::StringConstant(s) => ValueOrigin::Constant(s.clone()),
        Value::IntConstant(n) => ValueOrigin::Constant(n.to_string()),
        Value::ParameterRef { .. } => ValueOrigin::ParamOrigin,
        Value::Local(l, _) => {
            let defs = body.defs_of_at(l, at);
            if defs.len() == 1 {
                let def_idx = *defs.iter().next().unwrap();
                match body.statement_at(def_idx) {
                    Some(Statement::Identity(_, Value::ParameterRef { .. })) => ValueOrigin::ParamOrigin,
                    Some(Statement::Assign(_, rhs)) => classify_origin(rhs, def_idx, body),
                    _ => ValueOrigin::LocalOrigin,
                }
            } else {
                ValueOrigin::LocalOrigin
            }
        }
        _ => ValueOrigin::LocalOrigin,
    }
}
