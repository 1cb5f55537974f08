//! `ReactiveMap<K, V>` — a reactive keyed map.
//!
//! One dependency set per key plus the `MapKeyIterate` sentinel for
//! operations that observe the key set as a whole (`has` misses included:
//! a `has()` that currently returns `false` still must subscribe, since a
//! later `set()` of that key needs to retrigger it). `ReactiveWeakMap` is
//! the same shape with `Rc<K>` keys held weakly, so a dropped owner's key
//! naturally stops resolving.

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;

use crate::effect::{new_dep_set, DepSet};
use crate::key::{TrackOp, TriggerOp};
use crate::registry::{resolve_wrap, Flavor, ReactiveHandle, TargetState};
use crate::tracker::{collect_effects, run_triggered, track};
use crate::util::{same_value, SameValue};

struct Inner<K, V> {
    data: RefCell<HashMap<K, V>>,
    key_deps: RefCell<FxHashMap<K, DepSet>>,
    iterate_dep: DepSet,
    target_state: TargetState,
}

pub struct ReactiveMap<K, V> {
    inner: Rc<Inner<K, V>>,
    flavor: Flavor,
}

impl<K, V> Clone for ReactiveMap<K, V> {
    fn clone(&self) -> Self {
        ReactiveMap {
            inner: Rc::clone(&self.inner),
            flavor: self.flavor,
        }
    }
}

impl<K, V> ReactiveHandle for ReactiveMap<K, V> {
    fn flavor(&self) -> Flavor {
        self.flavor
    }
}

impl<K: Eq + Hash + Clone + 'static, V: 'static> ReactiveMap<K, V> {
    pub fn new(entries: HashMap<K, V>) -> Self {
        Self::with_flavor(entries, Flavor::MutableDeep)
    }

    pub fn new_shallow(entries: HashMap<K, V>) -> Self {
        Self::with_flavor(entries, Flavor::MutableShallow)
    }

    fn with_flavor(entries: HashMap<K, V>, flavor: Flavor) -> Self {
        ReactiveMap {
            inner: Rc::new(Inner {
                data: RefCell::new(entries),
                key_deps: RefCell::new(FxHashMap::default()),
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
        ReactiveMap {
            inner: Rc::clone(&self.inner),
            flavor,
        }
    }

    pub fn mark_raw(&self) {
        self.inner.target_state.mark_raw();
    }

    fn key_dep(&self, key: &K) -> DepSet {
        if let Some(dep) = self.inner.key_deps.borrow().get(key) {
            return Rc::clone(dep);
        }
        let dep = new_dep_set();
        self.inner
            .key_deps
            .borrow_mut()
            .insert(key.clone(), Rc::clone(&dep));
        dep
    }

    fn writable(&self) -> bool {
        if self.flavor.is_readonly() {
            crate::debug_warn!("attempted to mutate a readonly reactive map; write ignored");
            false
        } else {
            true
        }
    }

    /// Subscribes to `key` even when it's currently absent, so a later
    /// `set` retriggers this reader.
    pub fn has(&self, key: &K) -> bool {
        let dep = self.key_dep(key);
        track(&dep, TrackOp::Has);
        self.inner.data.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        track(&self.inner.iterate_dep, TrackOp::Iterate);
        self.inner.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Clone + 'static, V: Clone + SameValue + 'static> ReactiveMap<K, V> {
    pub fn get(&self, key: &K) -> Option<V> {
        let dep = self.key_dep(key);
        track(&dep, TrackOp::Get);
        self.inner.data.borrow().get(key).cloned()
    }

    /// Writes `key`: an `ADD` if the key is new, a `SET` if it already
    /// existed. Both retrigger `MapKeyIterate` as well as the key itself,
    /// since a value-iterating reader (e.g. `entries()`) must see the
    /// change even when the key set didn't grow.
    pub fn set(&self, key: K, value: V) {
        if !self.writable() {
            return;
        }
        let had_key = self.inner.data.borrow().contains_key(&key);
        let changed = {
            let mut data = self.inner.data.borrow_mut();
            match data.get(&key) {
                Some(existing) if same_value(existing, &value) => false,
                _ => {
                    data.insert(key.clone(), value);
                    true
                }
            }
        };
        if !changed {
            return;
        }
        let key_dep = self.key_dep(&key);
        let op = if had_key { TriggerOp::Set } else { TriggerOp::Add };
        let effects = collect_effects(&[&key_dep, &self.inner.iterate_dep]);
        run_triggered(effects, op);
    }

    /// Removes `key`, retriggering that key and `MapKeyIterate`.
    pub fn delete(&self, key: &K) -> Option<V> {
        if !self.writable() {
            return None;
        }
        let removed = self.inner.data.borrow_mut().remove(key);
        if removed.is_some() {
            let key_dep = self.key_dep(key);
            let effects = collect_effects(&[&key_dep, &self.inner.iterate_dep]);
            run_triggered(effects, TriggerOp::Delete);
        }
        removed
    }

    /// Empties the map, retriggering every key and `MapKeyIterate`.
    pub fn clear(&self) {
        if !self.writable() {
            return;
        }
        let had_entries = !self.inner.data.borrow().is_empty();
        self.inner.data.borrow_mut().clear();
        if !had_entries {
            return;
        }
        let key_deps: Vec<DepSet> = self
            .inner
            .key_deps
            .borrow()
            .values()
            .cloned()
            .collect();
        let mut refs: Vec<&DepSet> = vec![&self.inner.iterate_dep];
        refs.extend(key_deps.iter());
        let effects = collect_effects(&refs);
        run_triggered(effects, TriggerOp::Clear);
    }

    /// Snapshot of the entries; subscribes to `MapKeyIterate`.
    pub fn entries(&self) -> Vec<(K, V)> {
        track(&self.inner.iterate_dep, TrackOp::Iterate);
        self.inner
            .data
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

pub fn reactive_map<K: Eq + Hash + Clone + 'static, V: 'static>(
    entries: HashMap<K, V>,
) -> ReactiveMap<K, V> {
    ReactiveMap::new(entries)
}

/// The weak-keyed variant of `ReactiveMap`: keys are held as `Weak<K>`, so
/// a dropped owner stops the entry from resolving. No `len`, `clear`, or
/// iteration: the key set is never meant to be enumerable.
pub struct ReactiveWeakMap<K, V> {
    inner: Rc<RefCell<HashMap<usize, (Weak<K>, V)>>>,
    key_deps: Rc<RefCell<FxHashMap<usize, DepSet>>>,
}

impl<K, V> Clone for ReactiveWeakMap<K, V> {
    fn clone(&self) -> Self {
        ReactiveWeakMap {
            inner: Rc::clone(&self.inner),
            key_deps: Rc::clone(&self.key_deps),
        }
    }
}

impl<K, V: Clone + SameValue + 'static> ReactiveWeakMap<K, V> {
    pub fn new() -> Self {
        ReactiveWeakMap {
            inner: Rc::new(RefCell::new(HashMap::new())),
            key_deps: Rc::new(RefCell::new(FxHashMap::default())),
        }
    }

    fn key_dep(&self, ptr: usize) -> DepSet {
        let mut deps = self.key_deps.borrow_mut();
        Rc::clone(deps.entry(ptr).or_insert_with(new_dep_set))
    }

    pub fn get(&self, key: &Rc<K>) -> Option<V> {
        let ptr = Rc::as_ptr(key) as usize;
        let dep = self.key_dep(ptr);
        track(&dep, TrackOp::Get);
        self.inner.borrow().get(&ptr).map(|(_, v)| v.clone())
    }

    pub fn has(&self, key: &Rc<K>) -> bool {
        let ptr = Rc::as_ptr(key) as usize;
        let dep = self.key_dep(ptr);
        track(&dep, TrackOp::Has);
        self.inner.borrow().contains_key(&ptr)
    }

    pub fn set(&self, key: &Rc<K>, value: V) {
        let ptr = Rc::as_ptr(key) as usize;
        let changed = {
            let mut data = self.inner.borrow_mut();
            match data.get(&ptr) {
                Some((_, existing)) if same_value(existing, &value) => false,
                _ => {
                    data.insert(ptr, (Rc::downgrade(key), value));
                    true
                }
            }
        };
        if changed {
            let dep = self.key_dep(ptr);
            let effects = collect_effects(&[&dep]);
            run_triggered(effects, TriggerOp::Set);
        }
    }

    pub fn delete(&self, key: &Rc<K>) {
        let ptr = Rc::as_ptr(key) as usize;
        if self.inner.borrow_mut().remove(&ptr).is_some() {
            let dep = self.key_dep(ptr);
            let effects = collect_effects(&[&dep]);
            run_triggered(effects, TriggerOp::Delete);
        }
    }
}

impl<K, V: Clone + SameValue + 'static> Default for ReactiveWeakMap<K, V> {
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
    fn set_new_key_triggers_iterate_readers() {
        let map: ReactiveMap<String, i32> = ReactiveMap::new(HashMap::new());
        let m2 = map.clone();
        let runs = Rc::new(Cell::new(0));
        let runs2 = Rc::clone(&runs);
        create_effect(move || {
            runs2.set(runs2.get() + 1);
            let _ = m2.len();
        });
        assert_eq!(runs.get(), 1);
        map.set("a".to_string(), 1);
        assert_eq!(runs.get(), 2);
        map.set("a".to_string(), 1);
        assert_eq!(runs.get(), 2, "setting an equal value again must not retrigger");
    }

    #[test]
    fn has_on_missing_key_retriggers_after_later_set() {
        let map: ReactiveMap<String, i32> = ReactiveMap::new(HashMap::new());
        let m2 = map.clone();
        let runs = Rc::new(Cell::new(0));
        let runs2 = Rc::clone(&runs);
        create_effect(move || {
            runs2.set(runs2.get() + 1);
            let _ = m2.has(&"missing".to_string());
        });
        assert_eq!(runs.get(), 1);
        map.set("missing".to_string(), 1);
        assert_eq!(runs.get(), 2, "has() on an absent key must still subscribe");
    }

    #[test]
    fn set_on_existing_key_retriggers_entries_readers() {
        let mut initial = HashMap::new();
        initial.insert("a".to_string(), 1);
        let map: ReactiveMap<String, i32> = ReactiveMap::new(initial);
        let m2 = map.clone();
        let runs = Rc::new(Cell::new(0));
        let runs2 = Rc::clone(&runs);
        create_effect(move || {
            runs2.set(runs2.get() + 1);
            let _ = m2.entries();
        });
        assert_eq!(runs.get(), 1);
        map.set("a".to_string(), 2);
        assert_eq!(
            runs.get(),
            2,
            "a SET on an already-present key must still retrigger value-iterating readers"
        );
    }
}
