//! `computed` — a lazily-evaluated, memoized derived value.
//!
//! A `Computed<T>` is backed by an `Effect` whose `scheduler` does *not*
//! eagerly rerun the getter. Instead it flips a `dirty` flag and
//! propagates a trigger to the computed's own subscribers. The getter only
//! actually reruns the next time something reads `.get()` on a dirty
//! computed — laziness survives any number of upstream writes between
//! reads.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::effect::{effect, DepSet, Effect, EffectOptions};
use crate::key::{TrackOp, TriggerOp};
use crate::registry::{Flavor, ReactiveHandle};
use crate::tracker::{track, trigger};
use crate::util::{same_value, SameValue};

struct Inner<T> {
    value: RefCell<Option<T>>,
    dirty: Cell<bool>,
    deps: DepSet,
    source_effect: RefCell<Option<Effect>>,
    setter: Option<Box<dyn Fn(T)>>,
}

/// A derived, cached value. Readonly unless created with
/// [`writable_computed`].
pub struct Computed<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Computed {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> ReactiveHandle for Computed<T> {
    fn flavor(&self) -> Flavor {
        if self.inner.setter.is_some() {
            Flavor::MutableDeep
        } else {
            Flavor::ReadonlyDeep
        }
    }
}

/// A readonly computed with no setter.
pub fn computed<T: Clone + SameValue + 'static>(getter: impl Fn() -> T + 'static) -> Computed<T> {
    build(getter, None)
}

/// A computed with a writable setter. The setter is expected to write to
/// the underlying reactive state the getter reads; the computed itself
/// does not store the written value directly.
pub fn writable_computed<T: Clone + SameValue + 'static>(
    getter: impl Fn() -> T + 'static,
    setter: impl Fn(T) + 'static,
) -> Computed<T> {
    build(getter, Some(Box::new(setter)))
}

fn build<T: Clone + SameValue + 'static>(
    getter: impl Fn() -> T + 'static,
    setter: Option<Box<dyn Fn(T)>>,
) -> Computed<T> {
    let inner = Rc::new(Inner {
        value: RefCell::new(None),
        dirty: Cell::new(true),
        deps: crate::effect::new_dep_set(),
        source_effect: RefCell::new(None),
        setter,
    });

    let recompute: Weak<Inner<T>> = Rc::downgrade(&inner);
    let scheduler_target: Weak<Inner<T>> = Rc::downgrade(&inner);

    let options = EffectOptions {
        lazy: true,
        scheduler: Some(Rc::new(move |_effect: Effect| {
            if let Some(inner) = scheduler_target.upgrade() {
                let was_dirty = inner.dirty.replace(true);
                if !was_dirty {
                    trigger(&[&inner.deps], TriggerOp::Set);
                }
            }
        })),
        ..Default::default()
    };

    let source_effect = effect(
        move || {
            let new_value = getter();
            if let Some(inner) = recompute.upgrade() {
                let changed = match &*inner.value.borrow() {
                    Some(old) => !same_value(old, &new_value),
                    None => true,
                };
                *inner.value.borrow_mut() = Some(new_value);
                inner.dirty.set(false);
                let _ = changed;
            }
        },
        options,
    );

    *inner.source_effect.borrow_mut() = Some(source_effect);
    Computed { inner }
}

impl<T: Clone + SameValue + 'static> Computed<T> {
    /// `.value` getter: recomputes only if dirty, then subscribes the
    /// active effect to this computed's own dependency set so changes
    /// propagate transitively through chains of computeds.
    pub fn get(&self) -> T {
        if self.inner.dirty.get() {
            if let Some(source_effect) = self.inner.source_effect.borrow().clone() {
                source_effect.run();
            }
        }
        track(&self.inner.deps, TrackOp::Get);
        self.inner
            .value
            .borrow()
            .clone()
            .expect("computed value populated by its first run")
    }

    /// `.value = v` setter: warns and is a no-op when there is no setter.
    pub fn set(&self, new_value: T) {
        match &self.inner.setter {
            Some(setter) => setter(new_value),
            None => {
                crate::debug_warn!("write to computed without a setter was ignored");
            }
        }
    }

    pub fn get_untracked(&self) -> T {
        if self.inner.dirty.get() {
            if let Some(source_effect) = self.inner.source_effect.borrow().clone() {
                source_effect.run();
            }
        }
        self.inner
            .value
            .borrow()
            .clone()
            .expect("computed value populated by its first run")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::create_effect;
    use crate::reactive_ref::reactive_ref;
    use std::cell::Cell;

    #[test]
    fn computed_is_lazy_until_first_get() {
        let calls = Rc::new(Cell::new(0));
        let calls2 = Rc::clone(&calls);
        let c = computed(move || {
            calls2.set(calls2.get() + 1);
            42
        });
        assert_eq!(calls.get(), 0, "getter must not run before first get()");
        assert_eq!(c.get(), 42);
        assert_eq!(calls.get(), 1);
        assert_eq!(c.get(), 42);
        assert_eq!(calls.get(), 1, "cached, no recompute without dirtying write");
    }

    #[test]
    fn computed_recomputes_after_source_changes_and_propagates() {
        let source = reactive_ref(1);
        let source2 = source.clone();
        let c = computed(move || source2.get() * 10);

        assert_eq!(c.get(), 10);

        let c2 = c.clone();
        let seen = Rc::new(Cell::new(0));
        let seen2 = Rc::clone(&seen);
        create_effect(move || {
            seen2.set(c2.get());
        });
        assert_eq!(seen.get(), 10);

        source.set(2);
        assert_eq!(seen.get(), 20, "downstream effect should see recomputed value");
    }
}
