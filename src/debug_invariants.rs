//! Consistency checks for the engine's containers.
//!
//! Detection checks the catalog after every time step when
//! `debug_assertions` or the `strict-invariants` feature is on. Decoded
//! catalogs are always checked, since they come from outside the engine.

use crate::extrema_error::ExtremaError;

pub trait DebugInvariants {
    /// Panic on the first violation when invariant checking is compiled in.
    fn debug_assert_invariants(&self);

    /// The first violated invariant, as [`ExtremaError::Invariant`].
    fn validate_invariants(&self) -> Result<(), ExtremaError>;

    /// `self` if every invariant holds.
    fn into_validated(self) -> Result<Self, ExtremaError>
    where
        Self: Sized,
    {
        self.validate_invariants()?;
        Ok(self)
    }
}

/// Evaluate a `Result<(), ExtremaError>` check and panic with `$ctx` on
/// error. Expands to nothing unless invariant checking is compiled in.
#[macro_export]
macro_rules! debug_invariants {
    ($check:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants"))]
        if let Err(e) = $check {
            panic!(concat!("[tri-extrema] ", $($ctx)*, ": {}"), e);
        }
    };
}
