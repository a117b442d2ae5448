//! Bounded any-path traversal (spec §4.5) and the plugin-driven edge
//! predicate that rides on top of it (spec §4.6).

mod bounded_path_finder;
mod driver;
mod plugin;

pub use bounded_path_finder::BoundedAnyPathFinder;
pub use driver::{EdgePredicate, TraversalDriver};
pub use plugin::{CallPath, Plugin};
