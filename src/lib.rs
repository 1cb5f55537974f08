//! A fine-grained reactivity core: reactive objects and collections, refs,
//! computed values, and effects.
//!
//! The system is built from two primitives, `track` and `trigger`
//! (`tracker.rs`), wired into a bipartite graph of `Effect`s (`effect.rs`)
//! and per-key dependency sets owned by each reactive target
//! (`object.rs`/`array.rs`/`map.rs`/`set.rs`/`reactive_ref.rs`). `computed`
//! (`computed.rs`) is the one primitive built out of the other two rather
//! than directly out of `track`/`trigger`.

mod macros;

mod array;
mod computed;
mod effect;
mod error;
mod key;
mod map;
mod object;
mod reactive_ref;
mod registry;
mod set;
mod tracker;
mod util;

pub(crate) use macros::debug_warn;

pub use array::{reactive_array, shallow_reactive_array, ReactiveArray};
pub use computed::{computed, writable_computed, Computed};
pub use effect::{
    create_effect, effect, enable_tracking, pause_tracking, reset_tracking, stop, untracked,
    Effect, EffectOptions, TrackEvent, TriggerEvent,
};
pub use error::ReactivityError;
pub use key::{Key, TrackOp, TriggerOp};
pub use map::{reactive_map, ReactiveMap, ReactiveWeakMap};
pub use object::{reactive, readonly, shallow_reactive, shallow_readonly, Reactive};
pub use reactive_ref::{reactive_ref, shallow_ref, Ref};
pub use registry::{is_proxy, is_reactive, is_readonly, is_shallow, Flavor, ReactiveHandle};
pub use set::{reactive_set, ReactiveSet, ReactiveWeakSet};
