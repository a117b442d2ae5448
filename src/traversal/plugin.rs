//! The plugin seam a traversal consumer implements (spec §4.6, §6
//! `CallPath`).

use crate::ir::{EdgeRef, MethodId, StmtId};

/// spec §6 `CallPath`: the accepted path plus the statement within the
/// final edge's target body that a plugin actually matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallPath {
    pub path: Vec<EdgeRef>,
    pub target_statement: StmtId,
}

/// A single analysis riding on top of [`super::BoundedAnyPathFinder`]
/// through [`super::TraversalDriver`]. `process_unit` is asked about every
/// statement of every edge target the traversal visits; `on_target_path` is
/// called once per statement it accepted, with the full path that reached
/// it (spec §4.6).
pub trait Plugin {
    /// Inspect one statement of a visited method body. Returning `true`
    /// marks this statement as one of the plugin's "target units" for the
    /// current `want()` call.
    fn process_unit(&mut self, method: &MethodId, stmt: &StmtId) -> bool;

    /// Called once per target unit this plugin accepted, after the
    /// traversal has confirmed the edge leading to it is wanted.
    fn on_target_path(&mut self, path: CallPath);
}
