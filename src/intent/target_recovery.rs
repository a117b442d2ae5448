//! Target-class recovery from a message-object value (spec §4.3).
//!
//! "Given a message-object local, recover target classes by walking its
//! def/use once and looking for any recognized 'target setter'... For
//! component-names, recurse into the component-name local's own def/use to
//! find the package+class string-constant arguments of
//! `ComponentName.<init>(String, String)`." Returns a list (possibly
//! empty); emptiness triggers the patcher's manifest fallback.

use super::methods::{effect_of, is_target_setter, BuilderEffect, TargetSetterKind};
use crate::ir::{Body, ClassId, InvokeKind, IrContext, Local, Value};

fn fqn_of(pkg: Option<&str>, class_name: &str) -> String {
    if class_name.contains('.') {
        class_name.to_string()
    } else if let Some(pkg) = pkg {
        format!("{pkg}.{class_name}")
    } else {
        class_name.to_string()
    }
}

/// Recover every explicit target class reachable from uses of `local`
/// within `body`. Each use-site that is a recognized target setter on
/// `local` contributes zero or one resolved class.
pub fn recover_target_classes(local: &Local, body: &Body, ctx: &IrContext) -> Vec<ClassId> {
    let mut out = Vec::new();
    for use_idx in body.uses_of_local(local) {
        let Some(stmt) = body.statement_at(use_idx) else { continue };
        let Some(expr) = stmt.invoke_expr() else { continue };
        let Some((_kind, method, Some(base), args)) = expr.as_invoke() else { continue };
        if base.base_local() != Some(local) || !is_target_setter(method.name.as_ref()) {
            continue;
        }
        match effect_of(method.name.as_ref()) {
            Some(BuilderEffect::SetTarget(TargetSetterKind::ClassConstant)) => {
                if let Some(class) = args.iter().find_map(|a| a.as_class_constant()) {
                    out.push(class.clone());
                }
            }
            Some(BuilderEffect::SetTarget(TargetSetterKind::ClassNameString)) => {
                if let Some(class) = resolve_class_name_string(args, ctx) {
                    out.push(class);
                }
            }
            Some(BuilderEffect::SetTarget(TargetSetterKind::ComponentName)) => {
                if let Some(component_local) = args.first().and_then(|a| a.base_local()) {
                    if let Some(class) = resolve_component_name(component_local, body, use_idx, ctx) {
                        out.push(class);
                    }
                }
            }
            _ => {}
        }
    }
    out
}

/// `setClassName(pkg, String)`: accepts either `(Context, String)` where
/// the class-name string is already fully qualified, or `(String pkg,
/// String className)`. The resolved class must already be loaded in the
/// scene to qualify (spec §4.3).
fn resolve_class_name_string(args: &[Value], ctx: &IrContext) -> Option<ClassId> {
    let pkg = args.first().and_then(|a| a.as_string_constant());
    let class_name = args.get(1).and_then(|a| a.as_string_constant())?;
    let candidate = ClassId::new(fqn_of(pkg, class_name).as_str());
    ctx.lookup_class(&candidate).map(|c| c.id.clone())
}

/// Recurse into the `ComponentName` local's own new-site to find the
/// `ComponentName.<init>(String, String)` package+class string constants.
fn resolve_component_name(component_local: &Local, body: &Body, at: usize, ctx: &IrContext) -> Option<ClassId> {
    let defs = body.defs_of_at(component_local, at);
    if defs.len() != 1 {
        return None;
    }
    let def_idx = *defs.iter().next()?;
    // The constructor call is the use immediately following the new-site in
    // typical three-address form: `t = new ComponentName(); t.<init>(pkg, cls)`.
    for use_idx in body.uses_of_local(component_local) {
        if use_idx < def_idx {
            continue;
        }
        let Some(stmt) = body.statement_at(use_idx) else { continue };
        let Some(expr) = stmt.invoke_expr() else { continue };
        let Some((kind, method, Some(base), args)) = expr.as_invoke() else { continue };
        if !matches!(kind, InvokeKind::Special) || base.base_local() != Some(component_local) {
            continue;
        }
        if method.name.as_ref() != "<init>" {
            continue;
        }
        let pkg = args.first().and_then(|a| a.as_string_constant())?;
        let cls = args.get(1).and_then(|a| a.as_string_constant())?;
        let candidate = ClassId::new(fqn_of(Some(pkg), cls).as_str());
        return ctx.lookup_class(&candidate).map(|c| c.id.clone());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Class, ClassId, MethodId, Origin, Statement, TypeRef};

    fn method(name: &str) -> MethodId {
        MethodId::new(ClassId::new("Caller"), name, vec![], TypeRef::new("void"))
    }

    fn set_class_name_method() -> MethodId {
        MethodId::new(ClassId::new("android.content.Intent"), "setClassName", vec![TypeRef::new("String"), TypeRef::new("String")], TypeRef::new("android.content.Intent"))
    }

    #[test]
    fn resolves_via_class_name_string_when_class_is_loaded() {
        let mut ctx = IrContext::new();
        ctx.add_class(Class::new(ClassId::new("com.example.TestService"), Origin::Application));

        let i = Local::new("i");
        let owner = method("m");
        let stmts = vec![
            Statement::Assign(i.clone(), Value::NewExpr(TypeRef::new("android.content.Intent"))),
            Statement::Invoke(Value::InvokeExpr {
                kind: InvokeKind::Virtual,
                method: set_class_name_method(),
                base: Some(Box::new(Value::Local(i.clone(), TypeRef::new("android.content.Intent")))),
                args: vec![
                    Value::StringConstant("com.example".to_string()),
                    Value::StringConstant("TestService".to_string()),
                ],
            }),
        ];
        let body = Body::new(owner, stmts);

        let targets = recover_target_classes(&i, &body, &ctx);
        assert_eq!(targets, vec![ClassId::new("com.example.TestService")]);
    }

    #[test]
    fn unloaded_class_name_string_resolves_to_nothing() {
        let ctx = IrContext::new();
        let i = Local::new("i");
        let owner = method("m");
        let stmts = vec![Statement::Invoke(Value::InvokeExpr {
            kind: InvokeKind::Virtual,
            method: set_class_name_method(),
            base: Some(Box::new(Value::Local(i.clone(), TypeRef::new("android.content.Intent")))),
            args: vec![
                Value::StringConstant("com.example".to_string()),
                Value::StringConstant("NotLoaded".to_string()),
            ],
        })];
        let body = Body::new(owner, stmts);
        assert!(recover_target_classes(&i, &body, &ctx).is_empty());
    }
}
