//! `track`/`trigger` — the two primitives everything else in this crate is
//! built from.
//!
//! Dependents are first *collected* into an owned snapshot, then *run*, so
//! an effect that itself writes to another tracked target during its run
//! can't mutate the dependency map out from under the in-progress
//! iteration.

use std::rc::Rc;

use crate::effect::{current_effect, tracking_enabled, DepSet, Effect, TrackEvent, TriggerEvent};
use crate::key::{TrackOp, TriggerOp};

/// Subscribes the active effect (if any, and if tracking is enabled) to
/// `dep`. No-op outside an effect or while tracking is paused.
pub(crate) fn track(dep: &DepSet, op: TrackOp) {
    if !tracking_enabled() {
        return;
    }
    let Some(effect_inner) = current_effect() else {
        return;
    };

    let ptr = Rc::as_ptr(&effect_inner) as usize;
    let already_subscribed = dep.borrow().contains_key(&ptr);
    if !already_subscribed {
        dep.borrow_mut().insert(ptr, Rc::downgrade(&effect_inner));
        effect_inner
            .subscriptions
            .borrow_mut()
            .push(Rc::clone(dep));
    }

    if let Some(on_track) = &effect_inner.options.on_track {
        on_track(TrackEvent { op });
    }
}

/// Snapshots every live effect subscribed to any of `deps` into an owned
/// `Vec`, deduplicating by effect identity and pruning dead `Weak` entries
/// as it goes. A single write can touch more than one key on the same
/// target (e.g. a `SET` on an array touches both the index key and,
/// conditionally, `Length`), and an effect subscribed to both must still
/// only run once.
pub(crate) fn collect_effects(deps: &[&DepSet]) -> Vec<Effect> {
    let mut seen = rustc_hash::FxHashSet::default();
    let mut out = Vec::new();
    for dep in deps {
        let mut dead = Vec::new();
        for (ptr, weak) in dep.borrow().iter() {
            match weak.upgrade() {
                Some(inner) => {
                    if seen.insert(*ptr) {
                        out.push(Effect::from_inner(inner));
                    }
                }
                None => dead.push(*ptr),
            }
        }
        if !dead.is_empty() {
            let mut dep_mut = dep.borrow_mut();
            for ptr in dead {
                dep_mut.shift_remove(&ptr);
            }
        }
    }
    out
}

/// Runs (or schedules, per each effect's own `EffectOptions::scheduler`)
/// every effect in `effects`, firing `on_trigger` first.
pub(crate) fn run_triggered(effects: Vec<Effect>, op: TriggerOp) {
    for effect in effects {
        if let Some(on_trigger) = effect.0.options.on_trigger.clone() {
            on_trigger(TriggerEvent { op });
        }
        match &effect.0.options.scheduler {
            Some(scheduler) => scheduler(effect.clone()),
            None => effect.run(),
        }
    }
}

/// Convenience for the common "one target, one key" trigger shape: collects
/// and runs in one call.
pub(crate) fn trigger(deps: &[&DepSet], op: TriggerOp) {
    let effects = collect_effects(deps);
    run_triggered(effects, op);
}
