//! The re-runnable unit of work that drives change propagation.
//!
//! Rust has no single process-wide observer slot with safe nesting the way
//! a garbage-collected language does, so nesting is handled with an RAII
//! guard: it pushes the active effect onto a thread-local stack and
//! restores the previous frame on drop, on every exit path including a
//! panic unwinding through the tracked closure.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::key::{TrackOp, TriggerOp};

/// `rustc_hash`'s fast hasher over `indexmap`'s insertion-order-preserving
/// map. Used here so a dependency set's subscribers are notified in
/// subscription order rather than whatever order a plain hash map happens
/// to yield.
pub(crate) type FxIndexMap<K, V> =
    indexmap::IndexMap<K, V, std::hash::BuildHasherDefault<rustc_hash::FxHasher>>;

pub(crate) type DepSet = Rc<RefCell<FxIndexMap<usize, Weak<EffectInner>>>>;

pub(crate) fn new_dep_set() -> DepSet {
    Rc::new(RefCell::new(FxIndexMap::default()))
}

/// Observed at a tracked read; handed to `EffectOptions::on_track`.
#[derive(Clone, Copy, Debug)]
pub struct TrackEvent {
    pub op: TrackOp,
}

/// Observed when a subscribed effect is scheduled to rerun; handed to
/// `EffectOptions::on_trigger`.
#[derive(Clone, Copy, Debug)]
pub struct TriggerEvent {
    pub op: TriggerOp,
}

/// Options recognized by `effect()`.
#[derive(Default, Clone)]
pub struct EffectOptions {
    /// Defer the first run; the effect only runs when something explicitly
    /// invokes it or a dependency triggers it.
    pub lazy: bool,
    /// When present, a triggered effect is handed to the scheduler instead
    /// of being run directly — the host decides when (or whether) to call
    /// `Effect::run`. This is the crate's entire batching seam.
    pub scheduler: Option<Rc<dyn Fn(Effect)>>,
    pub on_track: Option<Rc<dyn Fn(TrackEvent)>>,
    pub on_trigger: Option<Rc<dyn Fn(TriggerEvent)>>,
    pub on_stop: Option<Rc<RefCell<Option<Box<dyn FnOnce()>>>>>,
    /// Opt in to being triggered by a write that happens while this effect
    /// is the one currently running.
    pub allow_recurse: bool,
}

pub(crate) struct EffectInner {
    raw_fn: Box<dyn Fn()>,
    active: std::cell::Cell<bool>,
    pub(crate) subscriptions: RefCell<Vec<DepSet>>,
    pub(crate) options: EffectOptions,
}

/// A re-runnable unit of work with its own subscription list.
///
/// Cloning an `Effect` clones the handle, not the computation: all clones
/// observe and can `stop()` the same underlying run.
#[derive(Clone)]
pub struct Effect(pub(crate) Rc<EffectInner>);

thread_local! {
    static ACTIVE_EFFECT_STACK: RefCell<Vec<Rc<EffectInner>>> = RefCell::new(Vec::new());
    static TRACKING_STACK: RefCell<Vec<bool>> = RefCell::new(vec![true]);
}

/// Creates an effect that runs `f` once immediately (unless
/// `options.lazy`) and reruns it whenever a dependency read inside `f`
/// later changes.
pub fn effect(f: impl Fn() + 'static, options: EffectOptions) -> Effect {
    let lazy = options.lazy;
    let inner = Rc::new(EffectInner {
        raw_fn: Box::new(f),
        active: std::cell::Cell::new(true),
        subscriptions: RefCell::new(Vec::new()),
        options,
    });
    let handle = Effect(inner);
    if !lazy {
        handle.run();
    }
    handle
}

/// `effect(f, EffectOptions::default())`.
pub fn create_effect(f: impl Fn() + 'static) -> Effect {
    effect(f, EffectOptions::default())
}

impl Effect {
    /// Detaches every old subscription, pushes this effect as the active
    /// tracker, runs the body (which re-subscribes to whatever it reads
    /// this time), then pops.
    pub fn run(&self) {
        let inner = &self.0;

        if !inner.active.get() {
            // A stopped effect still runs when invoked directly — it just
            // can no longer be re-subscribed to anything.
            (inner.raw_fn)();
            return;
        }

        if is_active(inner) && !inner.options.allow_recurse {
            // Re-entrancy guard: this exact effect is already somewhere up
            // the call stack (a nested computed may sit above it without
            // being the same effect — membership, not top-of-stack
            // equality, is what matters here).
            tracing::trace!("effect re-entrancy skipped");
            return;
        }

        detach_all(inner);

        ACTIVE_EFFECT_STACK.with(|s| s.borrow_mut().push(Rc::clone(inner)));
        TRACKING_STACK.with(|s| s.borrow_mut().push(true));
        let _restore = RestoreOnDrop;

        (inner.raw_fn)();

        // `_restore` drops here (or while unwinding through the call above),
        // popping both stacks on every exit path.
    }

    /// Stops the effect: detaches every subscription edge and marks it
    /// inactive. Idempotent.
    pub fn stop(&self) {
        let inner = &self.0;
        if !inner.active.get() {
            return;
        }
        detach_all(inner);
        inner.active.set(false);
        if let Some(cell) = &inner.options.on_stop {
            if let Some(on_stop) = cell.borrow_mut().take() {
                on_stop();
            }
        }
    }

    /// Like [`run`](Effect::run), but returns
    /// [`ReactivityError::ReentrantEffect`] instead of silently skipping a
    /// disallowed re-entrant run, for callers that want re-entrancy to fail
    /// loudly rather than be treated as the default no-op.
    pub fn try_run(&self) -> Result<(), crate::error::ReactivityError> {
        let inner = &self.0;
        if inner.active.get() && is_active(inner) && !inner.options.allow_recurse {
            return Err(crate::error::ReactivityError::ReentrantEffect);
        }
        self.run();
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.0.active.get()
    }

    pub(crate) fn from_inner(inner: Rc<EffectInner>) -> Self {
        Effect(inner)
    }
}

/// Free-function form of [`Effect::stop`].
pub fn stop(effect: &Effect) {
    effect.stop();
}

struct RestoreOnDrop;

impl Drop for RestoreOnDrop {
    fn drop(&mut self) {
        TRACKING_STACK.with(|s| {
            s.borrow_mut().pop();
        });
        ACTIVE_EFFECT_STACK.with(|s| {
            s.borrow_mut().pop();
        });
    }
}

fn is_active(inner: &Rc<EffectInner>) -> bool {
    let ptr = Rc::as_ptr(inner) as usize;
    ACTIVE_EFFECT_STACK.with(|s| s.borrow().iter().any(|e| Rc::as_ptr(e) as usize == ptr))
}

fn detach_all(inner: &Rc<EffectInner>) {
    let subs = std::mem::take(&mut *inner.subscriptions.borrow_mut());
    let ptr = Rc::as_ptr(inner) as usize;
    for dep in subs {
        dep.borrow_mut().shift_remove(&ptr);
    }
}

/// The effect currently executing, if any.
pub(crate) fn current_effect() -> Option<Rc<EffectInner>> {
    ACTIVE_EFFECT_STACK.with(|s| s.borrow().last().cloned())
}

pub(crate) fn tracking_enabled() -> bool {
    TRACKING_STACK.with(|s| *s.borrow().last().unwrap_or(&true))
}

/// Runs `f` with tracking disabled, regardless of the ambient tracking
/// state, then restores it. Used internally by sequence length-mutating
/// methods so they don't subscribe to their own writes.
pub fn untracked<T>(f: impl FnOnce() -> T) -> T {
    pause_tracking();
    let result = f();
    reset_tracking();
    result
}

/// Pushes `false` onto the tracking-enabled stack.
pub fn pause_tracking() {
    TRACKING_STACK.with(|s| s.borrow_mut().push(false));
}

/// Pushes `true` onto the tracking-enabled stack.
pub fn enable_tracking() {
    TRACKING_STACK.with(|s| s.borrow_mut().push(true));
}

/// Pops the most recent override pushed by `pause_tracking`/`enable_tracking`,
/// restoring whatever was active before it.
pub fn reset_tracking() {
    TRACKING_STACK.with(|s| {
        s.borrow_mut().pop();
    });
}
