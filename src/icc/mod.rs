//! ICC caller/callee records and the per-component, per-channel summary
//! table (spec §3, component 4).
//!
//! `ComponentSummaryTable` is keyed by `ClassId` rather than holding a
//! back-reference to the owning `Class`, the same "no cyclic ownership"
//! shape the teacher uses for its per-symbol call-graph summaries in
//! `features/cross_file/symbol_graph.rs`.

use crate::intent::{IntentContent, IntentFilter};
use crate::ir::{ClassId, MethodId, StmtId};
use rustc_hash::{FxHashMap, FxHashSet};

pub type Component = ClassId;

/// The channel an ICC-style edge travels over. Only `Icc` is populated by
/// this crate's patchers; `Rpc`/`Storage`/`Static` are carried so a caller
/// can aggregate other kinds of cross-component facts (binder RPC, content
/// storage, static field sharing) into the same table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Icc,
    Rpc,
    Storage,
    Static,
}

/// One end of an ICC edge, the calling side.
#[derive(Debug, Clone, PartialEq)]
pub enum ICCCallerInfo {
    IntentCaller {
        component: Component,
        method: MethodId,
        call_site: StmtId,
        intent_content: IntentContent,
        icc_method_name: String,
    },
    MessengerCaller {
        component: Component,
        method: MethodId,
        call_site: StmtId,
        message_type: String,
    },
}

impl ICCCallerInfo {
    pub fn call_site(&self) -> &StmtId {
        match self {
            ICCCallerInfo::IntentCaller { call_site, .. } => call_site,
            ICCCallerInfo::MessengerCaller { call_site, .. } => call_site,
        }
    }

    pub fn component(&self) -> &Component {
        match self {
            ICCCallerInfo::IntentCaller { component, .. } => component,
            ICCCallerInfo::MessengerCaller { component, .. } => component,
        }
    }
}

/// One end of an ICC edge, the receiving side.
#[derive(Debug, Clone, PartialEq)]
pub enum ICCCalleeInfo {
    IntentCallee {
        component: Component,
        exported: bool,
        permissions: FxHashSet<String>,
        filters: Vec<IntentFilter>,
        entry_method: MethodId,
    },
    MessengerCallee {
        component: Component,
        exported: bool,
        permissions: FxHashSet<String>,
        entry_method: MethodId,
    },
}

impl ICCCalleeInfo {
    pub fn component(&self) -> &Component {
        match self {
            ICCCalleeInfo::IntentCallee { component, .. } => component,
            ICCCalleeInfo::MessengerCallee { component, .. } => component,
        }
    }
}

#[derive(Debug, Default)]
struct PerChannelSummary {
    callers: FxHashMap<Channel, Vec<ICCCallerInfo>>,
    callees: FxHashMap<Channel, Vec<ICCCalleeInfo>>,
    seen_caller_sites: FxHashMap<Channel, FxHashSet<StmtId>>,
}

/// spec §3 `ComponentSummaryTable`: map<Component, per-channel aggregate>.
/// Invariant: each (caller call-site) appears at most once per channel —
/// enforced here rather than left to callers, since the orchestrator may
/// legitimately attempt to record the same call site twice (idempotent
/// re-run, spec §8 invariant 1).
#[derive(Debug, Default)]
pub struct ComponentSummaryTable {
    entries: FxHashMap<Component, PerChannelSummary>,
}

impl ComponentSummaryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_caller(&mut self, component: Component, channel: Channel, info: ICCCallerInfo) {
        let entry = self.entries.entry(component).or_default();
        let seen = entry.seen_caller_sites.entry(channel).or_default();
        if !seen.insert(info.call_site().clone()) {
            return;
        }
        entry.callers.entry(channel).or_default().push(info);
    }

    pub fn record_callee(&mut self, component: Component, channel: Channel, info: ICCCalleeInfo) {
        self.entries.entry(component).or_default().callees.entry(channel).or_default().push(info);
    }

    pub fn callers_of(&self, component: &Component, channel: Channel) -> &[ICCCallerInfo] {
        self.entries
            .get(component)
            .and_then(|s| s.callers.get(&channel))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn callees_of(&self, component: &Component, channel: Channel) -> &[ICCCalleeInfo] {
        self.entries
            .get(component)
            .and_then(|s| s.callees.get(&channel))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.entries.keys()
    }
}
