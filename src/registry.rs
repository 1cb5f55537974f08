//! `Flavor` and the rules for wrapping a target with one, idempotently.
//!
//! Every container's shared inner state (`object::Inner`, `array::Inner`,
//! ...) carries a `TargetState`, and the flavor itself lives on the
//! lightweight wrapper handle (`Reactive<T>`, `ReactiveArray<T>`, ...) that
//! shares that `Rc` with its siblings. Two wrapper values referencing the
//! same `Rc` and the same flavor are behaviorally identical — there is no
//! separate proxy identity to track beyond that.

use std::cell::Cell;

/// Which of the four kinds a handle currently behaves as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Flavor {
    MutableDeep,
    MutableShallow,
    ReadonlyDeep,
    ReadonlyShallow,
}

impl Flavor {
    pub fn is_readonly(self) -> bool {
        matches!(self, Flavor::ReadonlyDeep | Flavor::ReadonlyShallow)
    }

    pub fn is_shallow(self) -> bool {
        matches!(self, Flavor::MutableShallow | Flavor::ReadonlyShallow)
    }
}

/// Per-Target state that isn't specific to any one flavor's view of it.
pub(crate) struct TargetState {
    /// Set by `mark_raw`; once set, `reactive()`/`readonly()` on this
    /// target are no-ops that hand back the existing handle unchanged.
    raw_marked: Cell<bool>,
}

impl TargetState {
    pub(crate) fn new() -> Self {
        TargetState {
            raw_marked: Cell::new(false),
        }
    }

    pub(crate) fn is_raw_marked(&self) -> bool {
        self.raw_marked.get()
    }

    pub(crate) fn mark_raw(&self) {
        self.raw_marked.set(true);
    }
}

/// Returns the flavor a handle should have after a wrap request, or `None`
/// if the target is raw-marked and no wrap should happen at all.
///
/// - No existing flavor: the requested flavor wins outright.
/// - Requesting `reactive()`/`shallow_reactive()` (non-readonly) on an
///   already-readonly handle is a no-op: readonly cannot be undone by
///   wrapping.
/// - Requesting `readonly()`/`shallow_readonly()` on an already-mutable
///   handle layers readonly on top, sharing the same underlying target.
/// - Requesting the same kind of flavor again is idempotent.
pub(crate) fn resolve_wrap(
    current: Option<Flavor>,
    requested: Flavor,
    state: &TargetState,
) -> Option<Flavor> {
    if state.is_raw_marked() {
        return None;
    }
    match current {
        None => Some(requested),
        Some(existing) if existing.is_readonly() && !requested.is_readonly() => Some(existing),
        Some(_) => Some(requested),
    }
}

/// Implemented by every public wrapper type (`Reactive<T>`, `ReactiveArray<T>`,
/// `ReactiveMap<K, V>`, `ReactiveSet<T>`, `Ref<T>`, `Computed<T>`) so the
/// flavor-introspection free functions below work uniformly across all of
/// them.
pub trait ReactiveHandle {
    #[doc(hidden)]
    fn flavor(&self) -> Flavor;
}

/// True for mutable handles, false for readonly ones.
pub fn is_reactive(x: &impl ReactiveHandle) -> bool {
    !x.flavor().is_readonly()
}

pub fn is_readonly(x: &impl ReactiveHandle) -> bool {
    x.flavor().is_readonly()
}

pub fn is_shallow(x: &impl ReactiveHandle) -> bool {
    x.flavor().is_shallow()
}

/// Every value that implements `ReactiveHandle` is, by construction, one
/// of the four wrapped flavors, so this is always `true`; kept as a named
/// function for a complete introspection surface alongside
/// `is_reactive`/`is_readonly`/`is_shallow`.
pub fn is_proxy(_x: &impl ReactiveHandle) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_target_takes_requested_flavor() {
        let state = TargetState::new();
        assert_eq!(
            resolve_wrap(None, Flavor::MutableDeep, &state),
            Some(Flavor::MutableDeep)
        );
    }

    #[test]
    fn mutable_request_on_readonly_is_unchanged() {
        let state = TargetState::new();
        let result = resolve_wrap(Some(Flavor::ReadonlyDeep), Flavor::MutableDeep, &state);
        assert_eq!(result, Some(Flavor::ReadonlyDeep));
    }

    #[test]
    fn readonly_over_mutable_layers_readonly() {
        let state = TargetState::new();
        let result = resolve_wrap(Some(Flavor::MutableDeep), Flavor::ReadonlyDeep, &state);
        assert_eq!(result, Some(Flavor::ReadonlyDeep));
    }

    #[test]
    fn raw_marked_target_never_wraps() {
        let state = TargetState::new();
        state.mark_raw();
        assert_eq!(resolve_wrap(None, Flavor::MutableDeep, &state), None);
    }
}
