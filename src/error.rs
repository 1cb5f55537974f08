//! Error types for the reactivity core.
//!
//! Most of this crate's expected failure paths are not errors: mutating a
//! readonly target, writing a setter-less computed, or wrapping an
//! ineligible target all warn in dev and fall back to a defined behavior
//! rather than returning `Result`. `ReactivityError` exists for the
//! remaining programmer-error cases that should fail loudly instead of
//! silently.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReactivityError {
    /// A `Computed`'s getter attempted to write back to itself or one of
    /// its own dependencies while `allow_recurse` was not set, in a way
    /// that could not be resolved as a no-op. Surfaced only in debug
    /// builds; in release the recursion guard in `tracker::run_triggered`
    /// silently skips the re-entrant run instead.
    #[error("effect attempted to re-enter its own run while already active")]
    ReentrantEffect,

    /// Reserved for a future fallible accessor: a reactive container's
    /// inner value was already mutably borrowed, which only happens if
    /// user code holds a `with_untracked`/`with_mut`-style guard across a
    /// nested call back into the same target. The current accessors panic
    /// via `RefCell` instead of surfacing this; this variant exists so
    /// that can change without a breaking error-type addition later.
    #[error("reactive target was already borrowed mutably")]
    AlreadyBorrowed,
}
