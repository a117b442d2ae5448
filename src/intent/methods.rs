//! `IntentMethods` registry (spec §2 component 3): a closed table
//! describing which builder-style method names set an ICC target, and by
//! what means, versus which only contribute filter/extras content.
//!
//! Built once as a `static` lookup table, the same shape as the teacher's
//! `PatternRegistry` (`features/effect_analysis/infrastructure/patterns/registry.rs`)
//! — a name-keyed table consulted by the analysis walk rather than a chain
//! of `if`/`else` on method names.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

/// How a recognized "target setter" resolves its target (spec §4.1 step 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetSetterKind {
    /// `setClass(Context, Class)` — target from a `ClassConstant` argument.
    ClassConstant,
    /// `setClassName(pkg, String)` — target from a package + class-name
    /// string pair.
    ClassNameString,
    /// `setComponent(ComponentName)` — target recovered by recursing into
    /// the `ComponentName` local's own def/use (spec §4.3).
    ComponentName,
}

/// The effect a recognized builder call has on an in-progress
/// `IntentContent` candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuilderEffect {
    SetTarget(TargetSetterKind),
    SetAction,
    AddCategory,
    SetData,
    SetDataAndType,
    SetType,
    PutExtra,
    SetFlags,
}

static REGISTRY: Lazy<FxHashMap<&'static str, BuilderEffect>> = Lazy::new(|| {
    use BuilderEffect::*;
    use TargetSetterKind::*;
    let mut m = FxHashMap::default();
    m.insert("setClass", SetTarget(ClassConstant));
    m.insert("setClassName", SetTarget(ClassNameString));
    m.insert("setComponent", SetTarget(ComponentName));
    m.insert("setAction", SetAction);
    m.insert("addCategory", AddCategory);
    m.insert("setData", SetData);
    m.insert("setDataAndType", SetDataAndType);
    m.insert("setType", SetType);
    m.insert("putExtra", PutExtra);
    m.insert("addFlags", SetFlags);
    m.insert("setFlags", SetFlags);
    m
});

/// Look up the effect of a builder method by name; `None` for any method
/// not in the closed registry (the walk in `analysis.rs` simply ignores
/// unrecognized invocations on the aliased base local).
pub fn effect_of(method_name: &str) -> Option<BuilderEffect> {
    REGISTRY.get(method_name).copied()
}

/// True for the three recognized ways of setting an explicit ICC target.
pub fn is_target_setter(method_name: &str) -> bool {
    matches!(effect_of(method_name), Some(BuilderEffect::SetTarget(_)))
}
