//! Non-fatal diagnostic sink.
//!
//! Every recoverable condition described in spec §7 (`ResolutionIncomplete`,
//! `MissingBody`, `BoundExceeded`) is recorded here rather than returned as
//! an `Err`; `ClassHierarchyLookupFailure` is deliberately not modeled as a
//! diagnostic at all (spec: "never fatal... treated as 'does not match'") —
//! callers see it only as an `Option::None` from lookup.

use crate::ir::{MethodId, StmtId};

/// The kind of non-fatal condition that occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A dispatch target could not be resolved precisely; the caller fell
    /// back to manifest enumeration, or (for dynamic receivers) skipped.
    ResolutionIncomplete,
    /// A call-graph edge target has no body; the edge was dropped from
    /// `computeChildren`.
    MissingBody,
    /// A per-entry-point or global traversal bound was reached.
    BoundExceeded,
}

/// One recorded occurrence of a non-fatal condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub entry_point: Option<MethodId>,
    pub stmt: Option<StmtId>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            entry_point: None,
            stmt: None,
        }
    }

    pub fn with_entry_point(mut self, entry_point: MethodId) -> Self {
        self.entry_point = Some(entry_point);
        self
    }

    pub fn with_stmt(mut self, stmt: StmtId) -> Self {
        self.stmt = Some(stmt);
        self
    }
}

/// Single collaborator every component writes non-fatal conditions through.
///
/// Kept as a trait object (rather than a hard dependency on `tracing`) so
/// tests can substitute a collecting sink and assert on emitted
/// diagnostics, per spec §8 invariant 5 ("bounds respected... surfaces as a
/// warning diagnostic").
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, diagnostic: Diagnostic);
}

/// Default sink: forwards every diagnostic to `tracing` at `warn` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnosticSink;

impl DiagnosticSink for TracingDiagnosticSink {
    fn record(&self, diagnostic: Diagnostic) {
        tracing::warn!(
            kind = ?diagnostic.kind,
            entry_point = ?diagnostic.entry_point,
            stmt = ?diagnostic.stmt,
            "{}",
            diagnostic.message
        );
    }
}

/// Test/debug sink: collects every diagnostic for later assertion.
#[derive(Debug, Default)]
pub struct CollectingDiagnosticSink {
    inner: std::sync::Mutex<Vec<Diagnostic>>,
}

impl CollectingDiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.inner.lock().unwrap().clone()
    }

    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.inner.lock().unwrap().iter().filter(|d| d.kind == kind).count()
    }
}

impl DiagnosticSink for CollectingDiagnosticSink {
    fn record(&self, diagnostic: Diagnostic) {
        self.inner.lock().unwrap().push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_sink_records_in_order() {
        let sink = CollectingDiagnosticSink::new();
        sink.record(Diagnostic::new(DiagnosticKind::MissingBody, "a"));
        sink.record(Diagnostic::new(DiagnosticKind::BoundExceeded, "b"));

        let all = sink.diagnostics();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].message, "a");
        assert_eq!(all[1].kind, DiagnosticKind::BoundExceeded);
        assert_eq!(sink.count_of(DiagnosticKind::MissingBody), 1);
    }
}
