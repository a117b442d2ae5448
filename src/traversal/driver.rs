//! `TraversalDriver` (spec §4.6): the plugin-backed `EdgePredicate` that
//! rides on top of [`super::BoundedAnyPathFinder`].
//!
//! `want(e)` clears a per-plugin scratch list, offers every statement of
//! `e.tgt`'s body to every plugin's `process_unit`, and accepts the edge iff
//! at least one plugin accepted at least one statement. After `want`
//! returns `true`, the driver reads back each plugin's accepted statements
//! (the scratch list is a snapshot valid only until the next `want()` call)
//! and invokes `on_target_path` once per accepted statement.

use super::plugin::{CallPath, Plugin};
use crate::ir::{EdgeRef, IrContext, StmtId};

/// spec §4.5's predicate seam: decides whether the DFS should accept
/// (return) the current edge as part of an emitted path.
pub trait EdgePredicate {
    fn want(&mut self, edge: &EdgeRef) -> bool;
}

/// Runs a fixed set of plugins over a [`super::BoundedAnyPathFinder`] until
/// the traversal is exhausted, fanning each accepted path out to every
/// plugin that matched a statement in its final edge's target.
pub struct TraversalDriver<'a> {
    ir: &'a IrContext,
    plugins: Vec<Box<dyn Plugin>>,
    scratch: Vec<Vec<StmtId>>,
}

impl<'a> TraversalDriver<'a> {
    pub fn new(ir: &'a IrContext, plugins: Vec<Box<dyn Plugin>>) -> Self {
        let scratch = vec![Vec::new(); plugins.len()];
        Self { ir, plugins, scratch }
    }

    /// Drain `finder` to completion, dispatching `on_target_path` for every
    /// statement any plugin accepted along the way.
    pub fn run(&mut self, finder: &mut super::BoundedAnyPathFinder<'_>) {
        while let Some(path) = finder.next(self) {
            for i in 0..self.plugins.len() {
                let targets = std::mem::take(&mut self.scratch[i]);
                for target_statement in targets {
                    self.plugins[i].on_target_path(CallPath {
                        path: path.clone(),
                        target_statement,
                    });
                }
            }
        }
    }
}

impl<'a> EdgePredicate for TraversalDriver<'a> {
    fn want(&mut self, edge: &EdgeRef) -> bool {
        for slot in &mut self.scratch {
            slot.clear();
        }
        let Some(body) = self.ir.body_of(&edge.tgt) else {
            return false;
        };

        let mut any = false;
        for idx in 0..body.len() {
            let stmt_id = body.stmt_id(idx);
            for (i, plugin) in self.plugins.iter_mut().enumerate() {
                if plugin.process_unit(&edge.tgt, &stmt_id) {
                    self.scratch[i].push(stmt_id.clone());
                    any = true;
                }
            }
        }
        any
    }
}
