//! `BoundedAnyPathFinder` (spec §4.5): resumable, bounded DFS over the call
//! graph driven entirely by an explicit stack plus a `Method -> pending
//! children` map, rather than recursion — the stack/`pending` pair doubles
//! as the visited set, since a method only gets a `pending` entry the first
//! time it is reached.

use crate::config::TraversalBounds;
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::external::IrProvider;
use crate::ir::{EdgeRef, MethodId, Origin};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Package prefixes walked even though their classes are `Origin::Platform`
/// — spec §4.5: "a small, fixed whitelist of platform prefixes whose
/// behavior callers still want visibility into (`java.io.`, `java.util.`,
/// `android.os.`)".
const WHITELISTED_PLATFORM_PREFIXES: &[&str] = &["java.io.", "java.util.", "android.os."];

/// Drives the bounded any-path DFS described in spec §4.5. Constructed once
/// per analysis with a fixed list of entry edges (one per traversal entry
/// point); `next()` is called repeatedly, each call returning the next path
/// that the supplied [`crate::traversal::EdgePredicate`] accepts, until the
/// traversal is exhausted (`None`).
pub struct BoundedAnyPathFinder<'a> {
    ir: &'a dyn IrProvider,
    bounds: TraversalBounds,
    sink: &'a dyn DiagnosticSink,
    entry_edges: VecDeque<EdgeRef>,
    stack: Vec<EdgeRef>,
    pending: FxHashMap<MethodId, VecDeque<EdgeRef>>,
    iterations: usize,
    entry_deadline: Option<Instant>,
    global_deadline: Instant,
    global_exceeded: bool,
}

impl<'a> BoundedAnyPathFinder<'a> {
    pub fn new(ir: &'a dyn IrProvider, bounds: TraversalBounds, sink: &'a dyn DiagnosticSink, entry_edges: Vec<EdgeRef>) -> Self {
        Self {
            ir,
            global_deadline: Instant::now() + Duration::from_secs(bounds.global_wall_clock_secs),
            bounds,
            sink,
            entry_edges: entry_edges.into_iter().collect(),
            stack: Vec::new(),
            pending: FxHashMap::default(),
            iterations: 0,
            entry_deadline: None,
            global_exceeded: false,
        }
    }

    /// Advance the DFS until `predicate` accepts an edge, returning the
    /// accepted path as a snapshot of the stack at that moment, or `None`
    /// once every entry point is exhausted or the global bound is hit.
    pub fn next(&mut self, predicate: &mut dyn super::EdgePredicate) -> Option<Vec<EdgeRef>> {
        loop {
            if self.global_exceeded {
                return None;
            }
            if Instant::now() >= self.global_deadline {
                self.global_exceeded = true;
                self.sink.record(Diagnostic::new(DiagnosticKind::BoundExceeded, "global traversal wall-clock exceeded"));
                return None;
            }

            if self.stack.is_empty() && !self.start_next_entry() {
                return None;
            }

            let entry_deadline = self.entry_deadline.expect("set by start_next_entry");
            if self.stack.len() > self.bounds.max_depth || self.iterations >= self.bounds.max_iterations || Instant::now() >= entry_deadline {
                let entry_point = self.stack[0].src.clone();
                self.sink.record(
                    Diagnostic::new(DiagnosticKind::BoundExceeded, "per-entry-point traversal bound exceeded").with_entry_point(entry_point),
                );
                self.stack.clear();
                self.pending.clear();
                continue;
            }

            self.iterations += 1;
            let top = self.stack.last().expect("stack non-empty").clone();
            if predicate.want(&top) {
                let path = self.stack.clone();
                self.advance();
                return Some(path);
            }
            self.advance();
        }
    }

    fn start_next_entry(&mut self) -> bool {
        let Some(edge) = self.entry_edges.pop_front() else {
            return false;
        };
        self.stack.clear();
        self.pending.clear();
        self.iterations = 0;
        self.entry_deadline = Some(Instant::now() + Duration::from_secs(self.bounds.per_entry_wall_clock_secs));
        let children = self.compute_children(&edge);
        self.pending.insert(edge.tgt.clone(), children);
        self.stack.push(edge);
        true
    }

    /// Peek the top edge's pending children; push the first unvisited one,
    /// or backtrack when none remain (spec §4.5 step 3).
    fn advance(&mut self) {
        loop {
            let Some(top_tgt) = self.stack.last().map(|e| e.tgt.clone()) else {
                return;
            };
            let mut queue = self.pending.remove(&top_tgt).unwrap_or_default();
            let mut next_child = None;
            while let Some(c) = queue.pop_front() {
                if c.tgt != top_tgt && !self.pending.contains_key(&c.tgt) {
                    next_child = Some(c);
                    break;
                }
            }
            self.pending.insert(top_tgt, queue);

            match next_child {
                Some(c) => {
                    let children = self.compute_children(&c);
                    self.pending.insert(c.tgt.clone(), children);
                    self.stack.push(c);
                    return;
                }
                None => {
                    self.stack.pop();
                    if self.stack.is_empty() {
                        return;
                    }
                }
            }
        }
    }

    /// spec §4.5 `computeChildren`: snapshot `edge.tgt`'s out-edges, keeping
    /// only application-origin or whitelisted-platform targets with a
    /// recorded call site and a body to continue into.
    fn compute_children(&self, edge: &EdgeRef) -> VecDeque<EdgeRef> {
        let mut children = VecDeque::new();
        for candidate in self.ir.call_graph().edges_out_of(&edge.tgt) {
            if candidate.src_stmt.is_none() {
                continue;
            }
            if !self.class_allowed(&candidate.tgt) {
                continue;
            }
            if !self.ir.has_body(&candidate.tgt) {
                self.sink.record(
                    Diagnostic::new(DiagnosticKind::MissingBody, format!("traversal target '{}' has no body", candidate.tgt))
                        .with_stmt(candidate.src_stmt.clone().expect("checked above")),
                );
                continue;
            }
            children.push_back(candidate);
        }
        children
    }

    fn class_allowed(&self, method: &MethodId) -> bool {
        match self.ir.lookup_class(&method.declaring_class) {
            Some(class) if class.origin == Origin::Application => true,
            _ => WHITELISTED_PLATFORM_PREFIXES.iter().any(|prefix| method.declaring_class.as_str().starts_with(prefix)),
        }
    }
}
