//! ICC value types: `IntentFilter`, `IntentContent`, `UriData`, `ValueOrigin`
//! (spec §3). The `ANY` sentinel is the literal token spec.md names: "a
//! filter containing the literal token `ANY` in a slot matches unresolved
//! values" — kept as a plain string constant rather than an enum wrapper so
//! that `content.actions.contains(ANY)` reads exactly like the spec's
//! prose, and so fixture data (`actions = {"ACTION_TEST_1"}`) needs no
//! conversion layer.

pub mod analysis;
pub mod methods;
pub mod target_recovery;
pub mod uri;

use crate::ir::ClassId;
use rustc_hash::{FxHashMap, FxHashSet};

/// Sentinel for an unresolved filter/content slot.
pub const ANY: &str = "ANY";

/// The component role an `IntentFilter` (or a resolved target) plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentRole {
    Activity,
    Service,
    BroadcastReceiver,
    ContentProvider,
}

/// Recovered URI facts for one `setData`/`setDataAndType`/`setType` call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UriData {
    pub scheme: String,
    pub host: String,
    pub path: String,
    pub mime_type: String,
}

impl UriData {
    pub fn unresolved() -> Self {
        Self {
            scheme: ANY.to_string(),
            host: ANY.to_string(),
            path: ANY.to_string(),
            mime_type: ANY.to_string(),
        }
    }
}

impl Default for UriData {
    fn default() -> Self {
        Self::unresolved()
    }
}

/// spec §3 `IntentFilter`: `(component-role, set<action>, set<category>, set<UriData>)`.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentFilter {
    pub role: ComponentRole,
    pub actions: FxHashSet<String>,
    pub categories: FxHashSet<String>,
    pub data: FxHashSet<UriData>,
}

impl IntentFilter {
    pub fn new(role: ComponentRole) -> Self {
        Self {
            role,
            actions: FxHashSet::default(),
            categories: FxHashSet::default(),
            data: FxHashSet::default(),
        }
    }

    /// A declared filter slot matches a dispatched value if either side is
    /// the `ANY` sentinel, or the literal values agree.
    fn slot_matches(declared: &FxHashSet<String>, dispatched: &FxHashSet<String>) -> bool {
        if declared.is_empty() || dispatched.contains(ANY) {
            return true;
        }
        declared.iter().any(|d| d == ANY || dispatched.contains(d))
    }

    pub fn matches_actions(&self, actions: &FxHashSet<String>) -> bool {
        Self::slot_matches(&self.actions, actions)
    }
}

/// Where one `putExtra` value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueOrigin {
    Constant(String),
    LocalOrigin,
    ParamOrigin,
}

/// Recognized intent flag constants (e.g. `FLAG_ACTIVITY_NEW_TASK`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Flag(pub String);

/// spec §3 `IntentContent`: recovered facts for one message-object value at
/// one dispatch site.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntentContent {
    pub explicit: bool,
    pub precise: bool,
    pub component_names: FxHashSet<ClassId>,
    pub actions: FxHashSet<String>,
    pub categories: FxHashSet<String>,
    pub data: FxHashSet<UriData>,
    pub extras: FxHashMap<String, ValueOrigin>,
    pub flags: FxHashSet<Flag>,
}

impl IntentContent {
    /// A fresh candidate seeded from one `NewExpr` new-site (spec §4.1 step
    /// 1). Starts optimistically precise; each builder call ANDs its own
    /// resolution outcome in, so one unresolved slot makes the whole
    /// content imprecise and it stays that way (spec §3: "`precise` is true
    /// iff *every* recovered slot... came from a constant flow").
    pub fn new_candidate() -> Self {
        Self {
            explicit: false,
            precise: true,
            ..Default::default()
        }
    }

    /// The unresolved content returned when the message object has no
    /// new-site in the body (spec §4.1 step 3: came from a parameter or
    /// field).
    pub fn unresolved() -> Self {
        Self {
            explicit: false,
            precise: false,
            ..Default::default()
        }
    }

    pub fn mark_action(&mut self, action: Option<String>) {
        self.note_precision(action.is_some());
        self.actions.insert(action.unwrap_or_else(|| ANY.to_string()));
    }

    pub fn mark_category(&mut self, category: Option<String>) {
        self.note_precision(category.is_some());
        self.categories.insert(category.unwrap_or_else(|| ANY.to_string()));
    }

    pub fn mark_component(&mut self, class: Option<ClassId>) {
        self.explicit = true;
        self.note_precision(class.is_some());
        if let Some(c) = class {
            self.component_names.insert(c);
        }
    }

    pub fn mark_data(&mut self, data: UriData) {
        let resolved = data.scheme != ANY || data.host != ANY || data.path != ANY || data.mime_type != ANY;
        self.note_precision(resolved);
        self.data.insert(data);
    }

    pub fn mark_extra(&mut self, key: String, origin: ValueOrigin) {
        self.extras.insert(key, origin);
    }

    pub fn mark_flag(&mut self, flag: impl Into<String>) {
        self.flags.insert(Flag(flag.into()));
    }

    fn note_precision(&mut self, slot_resolved: bool) {
        self.precise = self.precise && slot_resolved;
    }
}
