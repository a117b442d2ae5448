//! `UriAnalysis`: a constant walk over `Uri.parse(String)` arguments.
//!
//! spec §4.1: "`setData(Uri)` / `setDataAndType` / `setType`: recover
//! scheme/host/path/type from `UriAnalysis` (itself a constant walk over
//! `Uri.parse(String)` arguments); unresolved slots become `ANY`." This is
//! the same shape as the class-name / component-name recovery in
//! `target_recovery.rs`: find the value's def, require it to be a
//! recognized constant-producing call, and otherwise bail to `ANY` rather
//! than attempting points-to.

use super::UriData;
use crate::ir::{Body, Local, Value};

/// Recover `UriData` for a value that should hold a `Uri`, by walking one
/// hop back through def/use to a `Uri.parse(String)` call whose argument is
/// a string constant (directly, or via a local with a single reaching
/// string-constant definition).
pub fn resolve_uri(value: &Value, body: &Body, at: usize) -> UriData {
    match value {
        Value::InvokeExpr { method, args, .. } if method.name.as_ref() == "parse" => {
            match args.first() {
                Some(arg) => resolve_uri_string(arg, body, at)
                    .map(parse_uri_string)
                    .unwrap_or_else(UriData::unresolved),
                None => UriData::unresolved(),
            }
        }
        Value::Local(local, _) => resolve_uri_via_local(local, body, at),
        Value::StringConstant(s) => parse_uri_string(s.clone()),
        _ => UriData::unresolved(),
    }
}

fn resolve_uri_via_local(local: &Local, body: &Body, at: usize) -> UriData {
    let defs = body.defs_of_at(local, at);
    if defs.len() != 1 {
        return UriData::unresolved();
    }
    let def_idx = *defs.iter().next().unwrap();
    let Some(stmt) = body.statement_at(def_idx) else {
        return UriData::unresolved();
    };
    match stmt {
        crate::ir::Statement::Assign(_, rhs) => resolve_uri(rhs, body, def_idx),
        _ => UriData::unresolved(),
    }
}

fn resolve_uri_string(value: &Value, body: &Body, at: usize) -> Option<String> {
    match value {
        Value::StringConstant(s) => Some(s.clone()),
        Value::Local(local, _) => {
            let defs = body.defs_of_at(local, at);
            if defs.len() != 1 {
                return None;
            }
            let def_idx = *defs.iter().next().unwrap();
            match body.statement_at(def_idx)? {
                crate::ir::Statement::Assign(_, rhs) => rhs.as_string_constant().map(String::from),
                _ => None,
            }
        }
        _ => None,
    }
}

fn parse_uri_string(raw: String) -> UriData {
    let (scheme, rest) = match raw.split_once("://") {
        Some((scheme, rest)) => (scheme.to_string(), rest.to_string()),
        None => return UriData::unresolved(),
    };
    let (host, path) = match rest.split_once('/') {
        Some((host, path)) => (host.to_string(), format!("/{path}")),
        None => (rest, String::new()),
    };
    UriData {
        scheme,
        host,
        path,
        mime_type: super::ANY.to_string(),
    }
}
