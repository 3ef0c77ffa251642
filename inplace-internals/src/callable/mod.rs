//! Type-erased callables.
//!
//! - [`RawInplace`] owns a payload stored in a fixed-capacity buffer and
//!   dispatches through a [`CallableVtable`].
//! - [`RawTarget`] is the one-word, non-owning alternative. It refers to
//!   either a function or an object, and is dispatched through an invoker
//!   kept next to it by the caller.

mod raw;
mod target;
mod vtable;

pub use self::{raw::RawInplace, target::RawTarget, vtable::CallableVtable};
