//! The call graph: a multigraph over methods, tagged edges (spec §3).
//!
//! Backed by `petgraph::stable_graph::StableDiGraph` so that bridge methods
//! and synthesized edges can be inserted after load without invalidating
//! existing node/edge indices — the same reason the teacher reaches for
//! `petgraph` in `features/cross_file/dep_graph.rs` and `symbol_graph.rs`
//! rather than a hand-rolled adjacency map.

use super::class::MethodId;
use super::value::StmtId;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::Direction;
use rustc_hash::FxHashMap;

/// Edge kind: ordinary dispatch kinds plus one variant per ICC channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Static,
    Virtual,
    Special,
    Interface,
    Activity,
    Service,
    BroadcastReceiver,
    ContentProvider,
    Executor,
    AsyncTask,
    Intent,
    Thread,
    Messenger,
}

impl EdgeKind {
    pub fn is_icc(&self) -> bool {
        !matches!(
            self,
            EdgeKind::Static | EdgeKind::Virtual | EdgeKind::Special | EdgeKind::Interface
        )
    }
}

#[derive(Debug, Clone)]
struct EdgeData {
    src_stmt: Option<StmtId>,
    kind: EdgeKind,
}

/// A materialized snapshot of one call-graph edge. The traversal never
/// iterates the graph lazily (spec §9: "iterator-with-external-mutation");
/// `edges_out_of` / `edges_into` return owned `Vec<EdgeRef>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeRef {
    pub src: MethodId,
    pub tgt: MethodId,
    pub src_stmt: Option<StmtId>,
    pub kind: EdgeKind,
}

/// Multigraph over methods (spec §3 `CallGraph`).
#[derive(Debug, Default)]
pub struct CallGraph {
    graph: StableDiGraph<MethodId, EdgeData>,
    index_of: FxHashMap<MethodId, NodeIndex>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure_method(&mut self, method: &MethodId) -> NodeIndex {
        if let Some(&idx) = self.index_of.get(method) {
            return idx;
        }
        let idx = self.graph.add_node(method.clone());
        self.index_of.insert(method.clone(), idx);
        idx
    }

    pub fn contains_method(&self, method: &MethodId) -> bool {
        self.index_of.contains_key(method)
    }

    pub fn method_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Add one call-graph edge. Duplicate `(src, tgt, src_stmt, kind)`
    /// tuples are rejected so that re-running the orchestrator is a no-op
    /// (spec §8 invariant 1: idempotence of patching).
    pub fn add_edge(
        &mut self,
        src: &MethodId,
        tgt: &MethodId,
        src_stmt: Option<StmtId>,
        kind: EdgeKind,
    ) -> EdgeIndex {
        let src_idx = self.ensure_method(src);
        let tgt_idx = self.ensure_method(tgt);

        if let Some(existing) = self.find_edge_index(src_idx, tgt_idx, &src_stmt, kind) {
            return existing;
        }

        self.graph.add_edge(src_idx, tgt_idx, EdgeData { src_stmt, kind })
    }

    fn find_edge_index(
        &self,
        src_idx: NodeIndex,
        tgt_idx: NodeIndex,
        src_stmt: &Option<StmtId>,
        kind: EdgeKind,
    ) -> Option<EdgeIndex> {
        self.graph
            .edges_connecting(src_idx, tgt_idx)
            .find(|e| e.weight().kind == kind && &e.weight().src_stmt == src_stmt)
            .map(|e| e.id())
    }

    pub fn edges_out_of(&self, method: &MethodId) -> Vec<EdgeRef> {
        let Some(&idx) = self.index_of.get(method) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| EdgeRef {
                src: method.clone(),
                tgt: self.graph[e.target()].clone(),
                src_stmt: e.weight().src_stmt.clone(),
                kind: e.weight().kind,
            })
            .collect()
    }

    pub fn edges_into(&self, method: &MethodId) -> Vec<EdgeRef> {
        let Some(&idx) = self.index_of.get(method) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| EdgeRef {
                src: self.graph[e.source()].clone(),
                tgt: method.clone(),
                src_stmt: e.weight().src_stmt.clone(),
                kind: e.weight().kind,
            })
            .collect()
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodId> {
        self.graph.node_weights()
    }
}
