//! Dev-only diagnostics.

/// Emits a `tracing::warn!` in debug builds, a no-op in release. Used for
/// the "warn and fall back" paths rather than `Result`: mutating a
/// readonly target, writing a setter-less computed, wrapping an ineligible
/// target.
macro_rules! debug_warn {
    ($($x:tt)*) => {
        {
            #[cfg(debug_assertions)]
            {
                tracing::warn!($($x)*);
            }
            #[cfg(not(debug_assertions))]
            {
                let _ = format_args!($($x)*);
            }
        }
    }
}

pub(crate) use debug_warn;
