//! IR statements (spec §3 `Statement`).

use super::value::{Local, Value};

/// One three-address instruction (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Assign(Local, Value),
    Invoke(Value),
    Identity(Local, Value),
    Return(Option<Value>),
    If(Value, usize),
    Goto(usize),
    Throw(Value),
}

impl Statement {
    /// The value(s) this statement reads, paired with a fixed per-statement
    /// sub-index (needed when a statement uses more than one value, e.g.
    /// `Invoke` with several arguments) — mirrors spec §3's
    /// `usesOf(stmt) -> set<(Stmt, ValueBox)>`.
    pub fn used_values(&self) -> Vec<&Value> {
        match self {
            Statement::Assign(_, rhs) => vec![rhs],
            Statement::Invoke(expr) => vec![expr],
            Statement::Identity(_, rhs) => vec![rhs],
            Statement::Return(Some(v)) => vec![v],
            Statement::Return(None) => vec![],
            Statement::If(cond, _) => vec![cond],
            Statement::Goto(_) => vec![],
            Statement::Throw(v) => vec![v],
        }
    }

    /// The local this statement defines, if any.
    pub fn defined_local(&self) -> Option<&Local> {
        match self {
            Statement::Assign(lhs, _) => Some(lhs),
            Statement::Identity(lhs, _) => Some(lhs),
            _ => None,
        }
    }

    /// Successor statement indices within the same body, ignoring the
    /// implicit fallthrough (the caller adds `index + 1` for everything but
    /// `Goto`/`Return`/`Throw`). Branch targets for `If`/`Goto`.
    pub fn branch_target(&self) -> Option<usize> {
        match self {
            Statement::If(_, target) => Some(*target),
            Statement::Goto(target) => Some(*target),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Statement::Return(_) | Statement::Throw(_) | Statement::Goto(_))
    }

    pub fn is_invoke(&self) -> bool {
        matches!(self, Statement::Invoke(_))
            || matches!(self, Statement::Assign(_, v) if v.as_invoke().is_some())
    }

    /// The invoke expression carried by this statement, whether it's a bare
    /// `Invoke` or the rhs of an `Assign` (`x = foo()`).
    pub fn invoke_expr(&self) -> Option<&Value> {
        match self {
            Statement::Invoke(expr) if expr.as_invoke().is_some() => Some(expr),
            Statement::Assign(_, v) if v.as_invoke().is_some() => Some(v),
            _ => None,
        }
    }
}
