//! `ref`/`shallow_ref` — a single tracked cell.
//!
//! A `Ref<T>` is the degenerate case of `Reactive<T>` with a single fixed
//! key: reading runs `track`, writing runs a `same_value` comparison then
//! `trigger`.

use std::cell::RefCell;
use std::rc::Rc;

use crate::effect::DepSet;
use crate::key::{TrackOp, TriggerOp};
use crate::registry::{Flavor, ReactiveHandle};
use crate::tracker::{track, trigger};
use crate::util::{same_value, SameValue};

struct Inner<T> {
    value: RefCell<T>,
    deps: DepSet,
}

/// A single reactive cell. `shallow_ref` differs only in whether a
/// non-primitive value assigned into it is itself made reactive on write;
/// that distinction is carried by `flavor`.
pub struct Ref<T> {
    inner: Rc<Inner<T>>,
    flavor: Flavor,
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Ref {
            inner: Rc::clone(&self.inner),
            flavor: self.flavor,
        }
    }
}

impl<T> ReactiveHandle for Ref<T> {
    fn flavor(&self) -> Flavor {
        self.flavor
    }
}

/// Creates a new reactive cell holding `value`.
pub fn reactive_ref<T: 'static>(value: T) -> Ref<T> {
    Ref {
        inner: Rc::new(Inner {
            value: RefCell::new(value),
            deps: crate::effect::new_dep_set(),
        }),
        flavor: Flavor::MutableDeep,
    }
}

/// Like `reactive_ref`, but writes replace the inner value wholesale and
/// are tracked the same way while a non-primitive value stored here is not
/// itself wrapped.
pub fn shallow_ref<T: 'static>(value: T) -> Ref<T> {
    Ref {
        inner: Rc::new(Inner {
            value: RefCell::new(value),
            deps: crate::effect::new_dep_set(),
        }),
        flavor: Flavor::MutableShallow,
    }
}

impl<T: Clone + SameValue + 'static> Ref<T> {
    /// `.value` getter: subscribes the active effect, returns a clone of
    /// the current value.
    pub fn get(&self) -> T {
        track(&self.inner.deps, TrackOp::Get);
        self.inner.value.borrow().clone()
    }

    /// `.value = v` setter: no-op (with a dev warning) on a readonly ref;
    /// otherwise compares with `same_value` and only triggers subscribers
    /// on an actual change.
    pub fn set(&self, new_value: T) {
        if self.flavor.is_readonly() {
            crate::debug_warn!("attempted to write to a readonly ref; write ignored");
            return;
        }
        let changed = {
            let mut current = self.inner.value.borrow_mut();
            if same_value(&*current, &new_value) {
                false
            } else {
                *current = new_value;
                true
            }
        };
        if changed {
            trigger(&[&self.inner.deps], TriggerOp::Set);
        }
    }

    /// Reads without subscribing the active effect.
    pub fn get_untracked(&self) -> T {
        self.inner.value.borrow().clone()
    }

    pub fn to_raw(&self) -> T {
        self.inner.value.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::create_effect;
    use std::cell::Cell;

    #[test]
    fn get_subscribes_and_set_retriggers_on_change() {
        let r = reactive_ref(1);
        let runs = Rc::new(Cell::new(0));
        let r2 = r.clone();
        let runs2 = Rc::clone(&runs);
        create_effect(move || {
            runs2.set(runs2.get() + 1);
            let _ = r2.get();
        });
        assert_eq!(runs.get(), 1);
        r.set(2);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn set_same_value_does_not_retrigger() {
        let r = reactive_ref(1);
        let runs = Rc::new(Cell::new(0));
        let r2 = r.clone();
        let runs2 = Rc::clone(&runs);
        create_effect(move || {
            runs2.set(runs2.get() + 1);
            let _ = r2.get();
        });
        r.set(1);
        assert_eq!(runs.get(), 1, "writing an equal value must not retrigger");
    }

    #[test]
    fn setting_nan_over_nan_does_not_retrigger() {
        let r = reactive_ref(f64::NAN);
        let runs = Rc::new(Cell::new(0));
        let r2 = r.clone();
        let runs2 = Rc::clone(&runs);
        create_effect(move || {
            runs2.set(runs2.get() + 1);
            let _ = r2.get();
        });
        assert_eq!(runs.get(), 1);
        r.set(f64::NAN);
        assert_eq!(runs.get(), 1, "NaN over NaN must not count as a change");
        r.set(1.0);
        assert_eq!(runs.get(), 2, "NaN to a real number is a real change");
    }
}
