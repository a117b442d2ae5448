//! Method bodies and def/use queries.
//!
//! `defs_of_at` / `uses_of` are backed by a classic reaching-definitions
//! fixpoint (Kildall's algorithm), the same dataflow shape the teacher uses
//! for taint facts in `features/taint_analysis/infrastructure/worklist_solver.rs`:
//! GEN = "this statement defines local L", KILL = "every other definition of
//! L", meet = union over predecessors, iterate to a fixpoint over a
//! worklist. The only generalization here is tracking *all* locals at once
//! instead of one taint fact, since `IntentAnalysisHelper` needs reaching
//! definitions for whichever local currently holds the message object.

use super::class::MethodId;
use super::statement::Statement;
use super::value::{Local, StmtId};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// Ordered sequence of statements making up one method's implementation.
#[derive(Debug, Clone)]
pub struct Body {
    pub owner: MethodId,
    pub statements: Vec<Statement>,
    def_use: DefUseIndex,
}

impl Body {
    pub fn new(owner: MethodId, statements: Vec<Statement>) -> Self {
        let def_use = DefUseIndex::compute(&owner, &statements);
        Self {
            owner,
            statements,
            def_use,
        }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn stmt_id(&self, index: usize) -> StmtId {
        StmtId::new(self.owner.clone(), index)
    }

    pub fn statement_at(&self, index: usize) -> Option<&Statement> {
        self.statements.get(index)
    }

    /// Every statement that may define `local` and reach the use at `at`
    /// (spec §3: "for each `Local` use at statement `s`, every reaching
    /// definition is contained in `defsOfAt(local, s)`").
    pub fn defs_of_at(&self, local: &Local, at: usize) -> FxHashSet<usize> {
        self.def_use
            .reaching_defs_at(at)
            .get(local)
            .cloned()
            .unwrap_or_default()
    }

    /// All `(stmt_index, used value's base local)` pairs where `stmt` is the
    /// index of a use of `local`.
    pub fn uses_of_local(&self, local: &Local) -> Vec<usize> {
        self.def_use
            .uses
            .iter()
            .filter(|(_, l)| *l == local)
            .map(|(idx, _)| *idx)
            .collect()
    }

    /// New-site statement indices that define `local` via `NewExpr`.
    pub fn new_sites_of(&self, local: &Local) -> Vec<usize> {
        self.statements
            .iter()
            .enumerate()
            .filter_map(|(idx, stmt)| match stmt {
                Statement::Assign(lhs, v) if lhs == local && matches!(v, super::value::Value::NewExpr(_)) => {
                    Some(idx)
                }
                _ => None,
            })
            .collect()
    }
}

/// Precomputed reaching-definitions + use index for one body.
#[derive(Debug, Clone)]
struct DefUseIndex {
    /// `in_facts[stmt][local] = set of defining statement indices`.
    in_facts: Vec<FxHashMap<Local, FxHashSet<usize>>>,
    /// Flattened list of `(use_stmt_index, used_local)`.
    uses: Vec<(usize, Local)>,
}

impl DefUseIndex {
    fn compute(owner: &MethodId, statements: &[Statement]) -> Self {
        let n = statements.len();
        let _ = owner;
        if n == 0 {
            return Self {
                in_facts: Vec::new(),
                uses: Vec::new(),
            };
        }

        let successors = Self::build_successors(statements);
        let predecessors = Self::build_predecessors(n, &successors);

        let mut out_facts: Vec<FxHashMap<Local, FxHashSet<usize>>> = vec![FxHashMap::default(); n];
        let mut in_facts: Vec<FxHashMap<Local, FxHashSet<usize>>> = vec![FxHashMap::default(); n];

        let mut worklist: VecDeque<usize> = (0..n).collect();
        let mut queued: FxHashSet<usize> = (0..n).collect();

        while let Some(stmt_idx) = worklist.pop_front() {
            queued.remove(&stmt_idx);

            // Meet: union predecessor out-facts into this statement's in-facts.
            let mut new_in: FxHashMap<Local, FxHashSet<usize>> = FxHashMap::default();
            for &pred in &predecessors[stmt_idx] {
                for (local, defs) in &out_facts[pred] {
                    new_in.entry(local.clone()).or_default().extend(defs.iter().cloned());
                }
            }

            // Transfer: this statement's own definition kills prior ones for
            // that local and becomes the sole reaching definition downstream.
            let mut new_out = new_in.clone();
            if let Some(local) = statements[stmt_idx].defined_local() {
                let mut only_here = FxHashSet::default();
                only_here.insert(stmt_idx);
                new_out.insert(local.clone(), only_here);
            }

            let changed = in_facts[stmt_idx] != new_in || out_facts[stmt_idx] != new_out;
            in_facts[stmt_idx] = new_in;
            out_facts[stmt_idx] = new_out;

            if changed {
                for &succ in &successors[stmt_idx] {
                    if queued.insert(succ) {
                        worklist.push_back(succ);
                    }
                }
            }
        }

        let mut uses = Vec::new();
        for (idx, stmt) in statements.iter().enumerate() {
            for value in stmt.used_values() {
                if let Some(local) = value.base_local() {
                    uses.push((idx, local.clone()));
                }
            }
        }

        Self { in_facts, uses }
    }

    fn reaching_defs_at(&self, at: usize) -> &FxHashMap<Local, FxHashSet<usize>> {
        static EMPTY: once_cell::sync::Lazy<FxHashMap<Local, FxHashSet<usize>>> =
            once_cell::sync::Lazy::new(FxHashMap::default);
        self.in_facts.get(at).unwrap_or(&EMPTY)
    }

    fn build_successors(statements: &[Statement]) -> Vec<Vec<usize>> {
        let n = statements.len();
        let mut successors = vec![Vec::new(); n];
        for (idx, stmt) in statements.iter().enumerate() {
            match stmt {
                Statement::Goto(target) => successors[idx].push(*target),
                Statement::If(_, target) => {
                    successors[idx].push(*target);
                    if idx + 1 < n {
                        successors[idx].push(idx + 1);
                    }
                }
                Statement::Return(_) | Statement::Throw(_) => {}
                _ => {
                    if idx + 1 < n {
                        successors[idx].push(idx + 1);
                    }
                }
            }
        }
        successors
    }

    fn build_predecessors(n: usize, successors: &[Vec<usize>]) -> Vec<Vec<usize>> {
        let mut predecessors = vec![Vec::new(); n];
        for (idx, succs) in successors.iter().enumerate() {
            for &s in succs {
                if s < n {
                    predecessors[s].push(idx);
                }
            }
        }
        predecessors
    }
}
