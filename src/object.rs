//! `Reactive<T>` — field-granular tracking for a plain record.
//!
//! Rust has no transparent property access, so field-granular tracking is
//! realized through *lenses* instead of string keys: a lens is a
//! `fn(&T) -> &F` / `fn(&mut T) -> &mut F` pair, and the getter's function
//! pointer is the stable dependency identity — two reads through the same
//! lens collide in the dependency index, reads through different lenses
//! don't.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::effect::DepSet;
use crate::key::{TrackOp, TriggerOp};
use crate::registry::{resolve_wrap, Flavor, ReactiveHandle, TargetState};
use crate::tracker::{track, trigger};
use crate::util::{same_value, SameValue};

struct Inner<T> {
    data: RefCell<T>,
    field_deps: RefCell<FxHashMap<usize, DepSet>>,
    target_state: TargetState,
}

/// A reactive wrapper around a plain record `T`. Field reads and writes go
/// through lens function pointers rather than named properties.
pub struct Reactive<T> {
    inner: Rc<Inner<T>>,
    flavor: Flavor,
}

impl<T> Clone for Reactive<T> {
    fn clone(&self) -> Self {
        Reactive {
            inner: Rc::clone(&self.inner),
            flavor: self.flavor,
        }
    }
}

impl<T> ReactiveHandle for Reactive<T> {
    fn flavor(&self) -> Flavor {
        self.flavor
    }
}

impl<T: 'static> Reactive<T> {
    /// Wraps `value` as a deeply mutable reactive record.
    pub fn new(value: T) -> Self {
        Self::with_flavor(value, Flavor::MutableDeep)
    }

    /// Wraps `value` as a shallowly mutable reactive record.
    pub fn new_shallow(value: T) -> Self {
        Self::with_flavor(value, Flavor::MutableShallow)
    }

    fn with_flavor(value: T, flavor: Flavor) -> Self {
        Reactive {
            inner: Rc::new(Inner {
                data: RefCell::new(value),
                field_deps: RefCell::new(FxHashMap::default()),
                target_state: TargetState::new(),
            }),
            flavor,
        }
    }

    /// Returns a readonly view sharing the same underlying target, layering
    /// readonly on top per `registry::resolve_wrap`'s rules.
    pub fn readonly(&self) -> Self {
        self.wrap_as(Flavor::ReadonlyDeep)
    }

    /// Shallow counterpart of [`readonly`](Reactive::readonly).
    pub fn shallow_readonly(&self) -> Self {
        self.wrap_as(Flavor::ReadonlyShallow)
    }

    fn wrap_as(&self, requested: Flavor) -> Self {
        let flavor =
            resolve_wrap(Some(self.flavor), requested, &self.inner.target_state).unwrap_or(self.flavor);
        Reactive {
            inner: Rc::clone(&self.inner),
            flavor,
        }
    }

    /// Marks this target ineligible for wrapping: future
    /// `reactive()`/`readonly()` calls on it are no-ops.
    pub fn mark_raw(&self) {
        self.inner.target_state.mark_raw();
    }

    fn field_dep(&self, lens_id: usize) -> DepSet {
        let mut deps = self.inner.field_deps.borrow_mut();
        Rc::clone(
            deps.entry(lens_id)
                .or_insert_with(crate::effect::new_dep_set),
        )
    }

    /// Reads one field through `lens`, subscribing the active effect to
    /// exactly that field's dependency set.
    pub fn get_field<F: Clone + PartialEq + 'static>(&self, lens: fn(&T) -> &F) -> F {
        let dep = self.field_dep(lens as usize);
        track(&dep, TrackOp::Get);
        lens(&self.inner.data.borrow()).clone()
    }

    /// Writes one field through `lens`/`lens_mut` (the read lens supplies
    /// the dependency identity; the write lens supplies mutable access).
    /// No-op with a dev warning on a readonly handle. Only triggers
    /// subscribers if the value actually changed.
    pub fn set_field<F: SameValue + 'static>(
        &self,
        lens: fn(&T) -> &F,
        lens_mut: fn(&mut T) -> &mut F,
        new_value: F,
    ) {
        if self.flavor.is_readonly() {
            crate::debug_warn!("attempted to write to a readonly reactive object; write ignored");
            return;
        }
        let dep = self.field_dep(lens as usize);
        let changed = {
            let mut data = self.inner.data.borrow_mut();
            let slot = lens_mut(&mut data);
            if same_value(slot, &new_value) {
                false
            } else {
                *slot = new_value;
                true
            }
        };
        if changed {
            trigger(&[&dep], TriggerOp::Set);
        }
    }

    /// Reads the whole record without subscribing to any field.
    pub fn with_untracked<O>(&self, f: impl FnOnce(&T) -> O) -> O {
        f(&self.inner.data.borrow())
    }
}

impl<T: Clone + 'static> Reactive<T> {
    pub fn to_raw(&self) -> T {
        self.inner.data.borrow().clone()
    }
}

pub fn reactive<T: 'static>(value: T) -> Reactive<T> {
    Reactive::new(value)
}

pub fn shallow_reactive<T: 'static>(value: T) -> Reactive<T> {
    Reactive::new_shallow(value)
}

pub fn readonly<T: 'static>(target: &Reactive<T>) -> Reactive<T> {
    target.readonly()
}

pub fn shallow_readonly<T: 'static>(target: &Reactive<T>) -> Reactive<T> {
    target.shallow_readonly()
}
