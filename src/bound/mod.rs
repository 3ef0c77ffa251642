//! Non-owning callables.
//!
//! These refer to a callee owned elsewhere instead of storing it, and are
//! [`Copy`] regardless of what they refer to.

mod fn_ref;
mod method;

pub use self::{
    fn_ref::FnRef,
    method::{MethodMut, MethodRef},
};
