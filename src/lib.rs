/*
 * icc-core — Static Inter-Component Communication resolution
 *
 * Loads a three-address IR + call graph (§3), recovers ICC dispatch
 * targets that ordinary call-graph construction misses — Activity,
 * Service, BroadcastReceiver, ContentProvider, Messenger, AsyncTask,
 * Executor, Thread — by patching synthetic bridge edges into the call
 * graph, then exposes a bounded, resumable any-path traversal driven by
 * pluggable target-unit predicates.
 *
 * Module layout:
 * - ir/          Program model: classes, methods, bodies, def/use, call graph
 * - intent/      Intent-content recovery: builder-chain walk, URI parsing
 * - icc/         Per-component, per-channel summary of ICC callers/callees
 * - patching/    CallGraphPatcher per ICC channel + the orchestrator
 * - traversal/   BoundedAnyPathFinder + plugin-driven EdgePredicate
 * - external/    Collaborator seams this crate consumes but does not implement
 */

pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod external;
pub mod icc;
pub mod intent;
pub mod ir;
pub mod patching;
pub mod traversal;

pub use config::TraversalBounds;
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
pub use errors::{IccError, Result};
pub use icc::{Channel, ComponentSummaryTable};
pub use ir::IrContext;
pub use patching::{PatchSummary, PatchingOrchestrator};
pub use traversal::{BoundedAnyPathFinder, CallPath, EdgePredicate, Plugin, TraversalDriver};
