//! `ReactiveSet<T>` — a reactive unique set, and its weak counterpart.
//!
//! Same shape as `ReactiveMap` with the value half dropped: one dependency
//! set per member (keyed by the member itself, so `has()` on an absent
//! member still subscribes, same rule as the map) plus an `Iterate`
//! sentinel for whole-set observers (`len`, iteration).

use std::cell::RefCell;
use std::collections::HashSet;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;

use crate::effect::{new_dep_set, DepSet};
use crate::key::{TrackOp, TriggerOp};
use crate::registry::{resolve_wrap, Flavor, ReactiveHandle, TargetState};
use crate::tracker::{collect_effects, run_triggered, track};

struct Inner<T> {
    data: RefCell<HashSet<T>>,
    member_deps: RefCell<FxHashMap<T, DepSet>>,
    iterate_dep: DepSet,
    target_state: TargetState,
}

pub struct ReactiveSet<T> {
    inner: Rc<Inner<T>>,
    flavor: Flavor,
}

impl<T> Clone for ReactiveSet<T> {
    fn clone(&self) -> Self {
        ReactiveSet {
            inner: Rc::clone(&self.inner),
            flavor: self.flavor,
        }
    }
}

impl<T> ReactiveHandle for ReactiveSet<T> {
    fn flavor(&self) -> Flavor {
        self.flavor
    }
}

impl<T: Eq + Hash + Clone + 'static> ReactiveSet<T> {
    pub fn new(members: HashSet<T>) -> Self {
        Self::with_flavor(members, Flavor::MutableDeep)
    }

    pub fn new_shallow(members: HashSet<T>) -> Self {
        Self::with_flavor(members, Flavor::MutableShallow)
    }

    fn with_flavor(members: HashSet<T>, flavor: Flavor) -> Self {
        ReactiveSet {
            inner: Rc::new(Inner {
                data: RefCell::new(members),
                member_deps: RefCell::new(FxHashMap::default()),
                iterate_dep: new_dep_set(),
                target_state: TargetState::new(),
            }),
            flavor,
        }
    }

    pub fn readonly(&self) -> Self {
        self.wrap_as(Flavor::ReadonlyDeep)
    }

    pub fn shallow_readonly(&self) -> Self {
        self.wrap_as(Flavor::ReadonlyShallow)
    }

    fn wrap_as(&self, requested: Flavor) -> Self {
        let flavor =
            resolve_wrap(Some(self.flavor), requested, &self.inner.target_state).unwrap_or(self.flavor);
        ReactiveSet {
            inner: Rc::clone(&self.inner),
            flavor,
        }
    }

    pub fn mark_raw(&self) {
        self.inner.target_state.mark_raw();
    }

    fn member_dep(&self, value: &T) -> DepSet {
        if let Some(dep) = self.inner.member_deps.borrow().get(value) {
            return Rc::clone(dep);
        }
        let dep = new_dep_set();
        self.inner
            .member_deps
            .borrow_mut()
            .insert(value.clone(), Rc::clone(&dep));
        dep
    }

    fn writable(&self) -> bool {
        if self.flavor.is_readonly() {
            crate::debug_warn!("attempted to mutate a readonly reactive set; write ignored");
            false
        } else {
            true
        }
    }

    /// Subscribes even when `value` is currently absent from the set.
    pub fn has(&self, value: &T) -> bool {
        let dep = self.member_dep(value);
        track(&dep, TrackOp::Has);
        self.inner.data.borrow().contains(value)
    }

    pub fn len(&self) -> usize {
        track(&self.inner.iterate_dep, TrackOp::Iterate);
        self.inner.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Adds `value`; a no-op if already a member.
    pub fn add(&self, value: T) {
        if !self.writable() {
            return;
        }
        let inserted = self.inner.data.borrow_mut().insert(value.clone());
        if !inserted {
            return;
        }
        let dep = self.member_dep(&value);
        let effects = collect_effects(&[&dep, &self.inner.iterate_dep]);
        run_triggered(effects, TriggerOp::Add);
    }

    pub fn delete(&self, value: &T) -> bool {
        if !self.writable() {
            return false;
        }
        let removed = self.inner.data.borrow_mut().remove(value);
        if removed {
            let dep = self.member_dep(value);
            let effects = collect_effects(&[&dep, &self.inner.iterate_dep]);
            run_triggered(effects, TriggerOp::Delete);
        }
        removed
    }

    /// Empties the set, retriggering every member and `Iterate`.
    pub fn clear(&self) {
        if !self.writable() {
            return;
        }
        let had_members = !self.inner.data.borrow().is_empty();
        self.inner.data.borrow_mut().clear();
        if !had_members {
            return;
        }
        let member_deps: Vec<DepSet> = self.inner.member_deps.borrow().values().cloned().collect();
        let mut refs: Vec<&DepSet> = vec![&self.inner.iterate_dep];
        refs.extend(member_deps.iter());
        let effects = collect_effects(&refs);
        run_triggered(effects, TriggerOp::Clear);
    }

    /// Snapshot of the members; subscribes to `Iterate`.
    pub fn to_vec(&self) -> Vec<T> {
        track(&self.inner.iterate_dep, TrackOp::Iterate);
        self.inner.data.borrow().iter().cloned().collect()
    }
}

pub fn reactive_set<T: Eq + Hash + Clone + 'static>(members: HashSet<T>) -> ReactiveSet<T> {
    ReactiveSet::new(members)
}

/// The weak-membership variant of `ReactiveSet`: members are held as
/// `Weak<T>`, so a dropped owner naturally leaves the set. No `len`,
/// `clear`, or iteration.
pub struct ReactiveWeakSet<T> {
    inner: Rc<RefCell<HashSet<usize>>>,
    holders: Rc<RefCell<Vec<Weak<T>>>>,
    member_deps: Rc<RefCell<FxHashMap<usize, DepSet>>>,
}

impl<T> Clone for ReactiveWeakSet<T> {
    fn clone(&self) -> Self {
        ReactiveWeakSet {
            inner: Rc::clone(&self.inner),
            holders: Rc::clone(&self.holders),
            member_deps: Rc::clone(&self.member_deps),
        }
    }
}

impl<T> ReactiveWeakSet<T> {
    pub fn new() -> Self {
        ReactiveWeakSet {
            inner: Rc::new(RefCell::new(HashSet::new())),
            holders: Rc::new(RefCell::new(Vec::new())),
            member_deps: Rc::new(RefCell::new(FxHashMap::default())),
        }
    }

    fn member_dep(&self, ptr: usize) -> DepSet {
        let mut deps = self.member_deps.borrow_mut();
        Rc::clone(deps.entry(ptr).or_insert_with(new_dep_set))
    }

    pub fn has(&self, value: &Rc<T>) -> bool {
        let ptr = Rc::as_ptr(value) as usize;
        let dep = self.member_dep(ptr);
        track(&dep, TrackOp::Has);
        self.inner.borrow().contains(&ptr)
    }

    pub fn add(&self, value: &Rc<T>) {
        let ptr = Rc::as_ptr(value) as usize;
        let inserted = self.inner.borrow_mut().insert(ptr);
        if inserted {
            self.holders.borrow_mut().push(Rc::downgrade(value));
            let dep = self.member_dep(ptr);
            let effects = collect_effects(&[&dep]);
            run_triggered(effects, TriggerOp::Add);
        }
    }

    pub fn delete(&self, value: &Rc<T>) -> bool {
        let ptr = Rc::as_ptr(value) as usize;
        let removed = self.inner.borrow_mut().remove(&ptr);
        if removed {
            let dep = self.member_dep(ptr);
            let effects = collect_effects(&[&dep]);
            run_triggered(effects, TriggerOp::Delete);
        }
        removed
    }
}

impl<T> Default for ReactiveWeakSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::create_effect;
    use std::cell::Cell;

    #[test]
    fn add_triggers_iterate_and_member_readers() {
        let set: ReactiveSet<i32> = ReactiveSet::new(HashSet::new());
        let s2 = set.clone();
        let runs = Rc::new(Cell::new(0));
        let runs2 = Rc::clone(&runs);
        create_effect(move || {
            runs2.set(runs2.get() + 1);
            let _ = s2.has(&1);
        });
        assert_eq!(runs.get(), 1);
        set.add(1);
        assert_eq!(runs.get(), 2);
        set.add(1);
        assert_eq!(runs.get(), 2, "adding an already-present member must not retrigger");
    }
}
