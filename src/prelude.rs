//! Commonly used items for convenient importing.
//!
//! ```
//! use inplace::prelude::*;
//!
//! struct Valve {
//!     open: bool,
//! }
//!
//! impl Valve {
//!     fn is_open(&self) -> bool {
//!         self.open
//!     }
//! }
//!
//! let valve = Valve { open: true };
//! let query = MethodRef::<Valve, dyn Fn() -> bool>::new(&valve, Valve::is_open);
//! let stored = InplaceFn::<dyn Fn() -> bool + '_>::new(move || query.call());
//! assert!(stored.call());
//! assert_eq!(query.try_call(), Ok(true));
//! ```
//!
//! The prelude includes the callable and view types, [`Extends`] with the
//! [`extends!`] macro, and the two error types.

pub use crate::{
    Extends, FnRef, InplaceFn, MethodMut, MethodRef, OutOfRangeError, PolySpan, PolySpanMut,
    UninitializedError, extends,
};
