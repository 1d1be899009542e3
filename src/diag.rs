//! Feature-gated diagnostics.
//!
//! With the `trace` feature enabled these are the `tracing` crate's macros;
//! without it they compile to nothing.

#[cfg(feature = "trace")]
pub use tracing::{debug, trace};

#[cfg(not(feature = "trace"))]
mod noop {
    macro_rules! debug {
        ($($tt:tt)*) => {};
    }

    macro_rules! trace {
        ($($tt:tt)*) => {};
    }

    pub(crate) use {debug, trace};
}

#[cfg(not(feature = "trace"))]
pub(crate) use noop::{debug, trace};
