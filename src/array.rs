//! `ReactiveArray<T>` — a reactive ordered sequence.
//!
//! A `Vec<T>` wrapper with one dependency set per index plus the `Length`
//! and `Iterate` sentinel keys. Index-mutating methods trigger their index
//! (and `Length`/`Iterate` only when the length actually changes),
//! length-mutating methods always trigger `Length` and `Iterate`, and a
//! removal additionally retriggers every index at or after the removal
//! point, since the values living there have shifted.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::effect::{new_dep_set, untracked, DepSet};
use crate::key::{TrackOp, TriggerOp};
use crate::registry::{resolve_wrap, Flavor, ReactiveHandle, TargetState};
use crate::tracker::{collect_effects, run_triggered, track};
use crate::util::{same_value, SameValue};

struct Inner<T> {
    data: RefCell<Vec<T>>,
    index_deps: RefCell<FxHashMap<usize, DepSet>>,
    length_dep: DepSet,
    iterate_dep: DepSet,
    target_state: TargetState,
}

/// A reactive ordered sequence.
pub struct ReactiveArray<T> {
    inner: Rc<Inner<T>>,
    flavor: Flavor,
}

impl<T> Clone for ReactiveArray<T> {
    fn clone(&self) -> Self {
        ReactiveArray {
            inner: Rc::clone(&self.inner),
            flavor: self.flavor,
        }
    }
}

impl<T> ReactiveHandle for ReactiveArray<T> {
    fn flavor(&self) -> Flavor {
        self.flavor
    }
}

impl<T: 'static> ReactiveArray<T> {
    pub fn new(values: Vec<T>) -> Self {
        Self::with_flavor(values, Flavor::MutableDeep)
    }

    pub fn new_shallow(values: Vec<T>) -> Self {
        Self::with_flavor(values, Flavor::MutableShallow)
    }

    fn with_flavor(values: Vec<T>, flavor: Flavor) -> Self {
        ReactiveArray {
            inner: Rc::new(Inner {
                data: RefCell::new(values),
                index_deps: RefCell::new(FxHashMap::default()),
                length_dep: new_dep_set(),
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
        ReactiveArray {
            inner: Rc::clone(&self.inner),
            flavor,
        }
    }

    pub fn mark_raw(&self) {
        self.inner.target_state.mark_raw();
    }

    fn index_dep(&self, index: usize) -> DepSet {
        let mut deps = self.inner.index_deps.borrow_mut();
        Rc::clone(deps.entry(index).or_insert_with(new_dep_set))
    }

    fn writable(&self) -> bool {
        if self.flavor.is_readonly() {
            crate::debug_warn!("attempted to mutate a readonly reactive array; write ignored");
            false
        } else {
            true
        }
    }

    pub fn len(&self) -> usize {
        track(&self.inner.length_dep, TrackOp::Get);
        self.inner.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + SameValue + 'static> ReactiveArray<T> {
    /// Reads the element at `index`, subscribing only to that index.
    pub fn get(&self, index: usize) -> Option<T> {
        let dep = self.index_dep(index);
        track(&dep, TrackOp::Get);
        self.inner.data.borrow().get(index).cloned()
    }

    /// Writes `index`: a `SET` if `index` is already in-bounds, an `ADD`
    /// if it extends the array by exactly one. Only triggers on an actual
    /// value change.
    pub fn set(&self, index: usize, value: T) {
        if !self.writable() {
            return;
        }
        let len_before = self.inner.data.borrow().len();
        let (op, changed) = if index < len_before {
            let changed = {
                let mut data = self.inner.data.borrow_mut();
                if same_value(&data[index], &value) {
                    false
                } else {
                    data[index] = value;
                    true
                }
            };
            (TriggerOp::Set, changed)
        } else if index == len_before {
            self.inner.data.borrow_mut().push(value);
            (TriggerOp::Add, true)
        } else {
            tracing::debug!("ReactiveArray::set index {index} out of bounds, ignored");
            return;
        };

        if !changed {
            return;
        }

        let index_dep = self.index_dep(index);
        let mut deps = vec![&index_dep];
        if op == TriggerOp::Add {
            deps.push(&self.inner.length_dep);
            deps.push(&self.inner.iterate_dep);
        }
        let effects = collect_effects(&deps);
        run_triggered(effects, op);
    }

    /// Appends `value`, always extending the length.
    pub fn push(&self, value: T) {
        if !self.writable() {
            return;
        }
        untracked(|| self.inner.data.borrow_mut().push(value));
        self.notify_length_changed(TriggerOp::Add);
    }

    /// Removes and returns the last element, shrinking the length by one
    /// if non-empty.
    pub fn pop(&self) -> Option<T> {
        if !self.writable() {
            return None;
        }
        let removed_index = self.inner.data.borrow().len().checked_sub(1)?;
        let value = untracked(|| self.inner.data.borrow_mut().pop());
        if value.is_some() {
            self.notify_removal_from(removed_index, TriggerOp::Delete);
        }
        value
    }

    /// Inserts `value` at `index`, shifting every element from `index`
    /// onward, so every index dep from `index` on is retriggered in
    /// addition to `Length`/`Iterate`.
    pub fn insert(&self, index: usize, value: T) {
        if !self.writable() {
            return;
        }
        untracked(|| self.inner.data.borrow_mut().insert(index, value));
        self.notify_removal_from(index, TriggerOp::Add);
    }

    /// Removes the element at `index`, shifting every element after it
    /// down by one and retriggering `index` and every later index dep.
    pub fn remove(&self, index: usize) -> Option<T> {
        if !self.writable() {
            return None;
        }
        let len = self.inner.data.borrow().len();
        if index >= len {
            return None;
        }
        let value = untracked(|| self.inner.data.borrow_mut().remove(index));
        self.notify_removal_from(index, TriggerOp::Delete);
        Some(value)
    }

    /// A combined remove+insert over `start..start+delete_count`,
    /// triggering exactly like `remove`/`insert` would for the affected
    /// range.
    pub fn splice(&self, start: usize, delete_count: usize, values: Vec<T>) -> Vec<T> {
        if !self.writable() {
            return Vec::new();
        }
        let removed = untracked(|| {
            let mut data = self.inner.data.borrow_mut();
            let end = (start + delete_count).min(data.len());
            let removed: Vec<T> = data.splice(start..end, values).collect();
            removed
        });
        self.notify_removal_from(start, TriggerOp::Delete);
        removed
    }

    /// Shrinks the array to `new_len` in one step (a no-op if `new_len` is
    /// already `>=` the current length). Retriggers `length_dep`,
    /// `iterate_dep`, and every index dep `>= new_len` together, which
    /// `pop`/`remove` can't do atomically since each only shifts one index
    /// at a time.
    pub fn truncate(&self, new_len: usize) {
        if !self.writable() {
            return;
        }
        let current_len = self.inner.data.borrow().len();
        if new_len >= current_len {
            return;
        }
        untracked(|| self.inner.data.borrow_mut().truncate(new_len));
        self.notify_removal_from(new_len, TriggerOp::Delete);
    }

    /// Linear scan; subscribes to `Iterate` plus every index dep, since the
    /// result depends on each element's identity, not just the array's
    /// shape.
    pub fn contains(&self, value: &T) -> bool {
        track(&self.inner.iterate_dep, TrackOp::Has);
        let len = self.inner.data.borrow().len();
        for i in 0..len {
            track(&self.index_dep(i), TrackOp::Has);
        }
        self.inner.data.borrow().iter().any(|v| v == value)
    }

    pub fn index_of(&self, value: &T) -> Option<usize> {
        track(&self.inner.iterate_dep, TrackOp::Has);
        let len = self.inner.data.borrow().len();
        for i in 0..len {
            track(&self.index_dep(i), TrackOp::Has);
        }
        self.inner.data.borrow().iter().position(|v| v == value)
    }

    /// Snapshot of the whole array; subscribes to `Iterate`.
    pub fn to_vec(&self) -> Vec<T> {
        track(&self.inner.iterate_dep, TrackOp::Iterate);
        self.inner.data.borrow().clone()
    }

    pub fn to_raw(&self) -> Vec<T> {
        self.inner.data.borrow().clone()
    }

    fn notify_length_changed(&self, op: TriggerOp) {
        let effects = collect_effects(&[&self.inner.length_dep, &self.inner.iterate_dep]);
        run_triggered(effects, op);
    }

    fn notify_removal_from(&self, start: usize, op: TriggerOp) {
        let index_deps: Vec<DepSet> = {
            let deps = self.inner.index_deps.borrow();
            deps.iter()
                .filter(|(index, _)| **index >= start)
                .map(|(_, dep)| Rc::clone(dep))
                .collect()
        };
        let mut refs: Vec<&DepSet> = vec![&self.inner.length_dep, &self.inner.iterate_dep];
        refs.extend(index_deps.iter());
        let effects = collect_effects(&refs);
        run_triggered(effects, op);
    }
}

pub fn reactive_array<T: 'static>(values: Vec<T>) -> ReactiveArray<T> {
    ReactiveArray::new(values)
}

pub fn shallow_reactive_array<T: 'static>(values: Vec<T>) -> ReactiveArray<T> {
    ReactiveArray::new_shallow(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::create_effect;
    use std::cell::Cell;

    #[test]
    fn set_on_unrelated_index_does_not_rerun() {
        let arr = ReactiveArray::new(vec![1, 2, 3]);
        let a2 = arr.clone();
        let runs = Rc::new(Cell::new(0));
        let runs2 = Rc::clone(&runs);
        create_effect(move || {
            runs2.set(runs2.get() + 1);
            let _ = a2.get(0);
        });
        assert_eq!(runs.get(), 1);
        arr.set(1, 99);
        assert_eq!(runs.get(), 1, "writing index 1 must not rerun a reader of index 0");
        arr.set(0, 42);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn push_triggers_length_and_iterate_readers() {
        let arr = ReactiveArray::new(vec![1, 2]);
        let a2 = arr.clone();
        let runs = Rc::new(Cell::new(0));
        let runs2 = Rc::clone(&runs);
        create_effect(move || {
            runs2.set(runs2.get() + 1);
            let _ = a2.len();
        });
        assert_eq!(runs.get(), 1);
        arr.push(3);
        assert_eq!(runs.get(), 2);
        assert_eq!(arr.len(), 3);
    }

    #[test]
    fn readonly_mutation_is_ignored() {
        let arr = ReactiveArray::new(vec![1, 2, 3]);
        let ro = arr.readonly();
        ro.push(4);
        assert_eq!(arr.len(), 3);
    }

    #[test]
    fn contains_rerenders_when_an_overwritten_element_changes_membership() {
        let arr = ReactiveArray::new(vec![1, 2, 3]);
        let a2 = arr.clone();
        let runs = Rc::new(Cell::new(0));
        let runs2 = Rc::clone(&runs);
        create_effect(move || {
            runs2.set(runs2.get() + 1);
            let _ = a2.contains(&9);
        });
        assert_eq!(runs.get(), 1);
        arr.set(2, 9);
        assert_eq!(
            runs.get(),
            2,
            "overwriting an element must rerun a contains() reader even though that only \
             triggers the index dep, not Iterate"
        );
    }

    #[test]
    fn index_of_rerenders_when_a_tracked_index_changes() {
        let arr = ReactiveArray::new(vec![1, 2, 3]);
        let a2 = arr.clone();
        let runs = Rc::new(Cell::new(0));
        let runs2 = Rc::clone(&runs);
        create_effect(move || {
            runs2.set(runs2.get() + 1);
            let _ = a2.index_of(&2);
        });
        assert_eq!(runs.get(), 1);
        arr.set(1, 20);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn truncate_shrinks_and_retriggers_length_iterate_and_dropped_indices_together() {
        let arr = ReactiveArray::new(vec![1, 2, 3, 4]);
        let len_reader = arr.clone();
        let len_runs = Rc::new(Cell::new(0));
        let len_runs2 = Rc::clone(&len_runs);
        create_effect(move || {
            len_runs2.set(len_runs2.get() + 1);
            let _ = len_reader.len();
        });

        let idx0_reader = arr.clone();
        let idx0_runs = Rc::new(Cell::new(0));
        let idx0_runs2 = Rc::clone(&idx0_runs);
        create_effect(move || {
            idx0_runs2.set(idx0_runs2.get() + 1);
            let _ = idx0_reader.get(0);
        });

        let idx3_reader = arr.clone();
        let idx3_runs = Rc::new(Cell::new(0));
        let idx3_runs2 = Rc::clone(&idx3_runs);
        create_effect(move || {
            idx3_runs2.set(idx3_runs2.get() + 1);
            let _ = idx3_reader.get(3);
        });

        assert_eq!(len_runs.get(), 1);
        assert_eq!(idx0_runs.get(), 1);
        assert_eq!(idx3_runs.get(), 1);

        arr.truncate(2);

        assert_eq!(arr.to_vec(), vec![1, 2]);
        assert_eq!(len_runs.get(), 2, "length reader must rerun");
        assert_eq!(idx3_runs.get(), 2, "dropped index 3 must rerun");
        assert_eq!(idx0_runs.get(), 1, "untouched index 0 must not rerun");
    }

    #[test]
    fn truncate_to_a_length_at_or_above_current_is_a_no_op() {
        let arr = ReactiveArray::new(vec![1, 2, 3]);
        arr.truncate(5);
        assert_eq!(arr.to_vec(), vec![1, 2, 3]);
        arr.truncate(3);
        assert_eq!(arr.to_vec(), vec![1, 2, 3]);
    }
}
