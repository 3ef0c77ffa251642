#![cfg_attr(not(doc), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    clippy::as_ptr_cast_mut,
    clippy::ptr_as_ptr,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    unused_doc_comments
)]
// Extra checks on nightly
#![cfg_attr(nightly_extra_checks, feature(rustdoc_missing_doc_code_examples))]
#![cfg_attr(nightly_extra_checks, forbid(rustdoc::missing_doc_code_examples))]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Heap-free callables and stride-aware views for embedded Rust.
//!
//! ## Overview
//!
//! This crate has two building blocks that never allocate:
//!
//! - **Callables.** [`InplaceFn`] owns a closure, a function pointer or a bound
//!   method in a fixed-size inline buffer. [`FnRef`], [`MethodRef`] and
//!   [`MethodMut`] are two-word, [`Copy`] references to a callee that lives
//!   elsewhere.
//! - **Views.** [`PolySpan`] and [`PolySpanMut`] view an array of a larger,
//!   "derived" type through its leading "base" type while stepping by the size
//!   of the derived type.
//!
//! Two small capabilities describe what the surrounding system provides: a
//! lock ([`sync::Lockable`]) and a byte store
//! ([`persistence::Persistence`]).
//!
//! ## Quick Example
//!
//! ```
//! use inplace::{FnRef, InplaceFn, PolySpan, extends};
//!
//! // A callable that owns its captures, in 16 bytes with 8-byte alignment.
//! let (scale, bias) = (3_i32, 4_i32);
//! let linear = InplaceFn::<dyn Fn(i32) -> i32, [u64; 2]>::new(move |x: i32| scale * x + bias);
//! assert_eq!(linear.call(2), 10);
//!
//! // A callable that refers to a function.
//! fn double(x: i32) -> i32 {
//!     x * 2
//! }
//! let by_ref = FnRef::<dyn Fn(i32) -> i32>::from_fn(double);
//! assert_eq!(by_ref.call(21), 42);
//!
//! // A view of derived elements through their base.
//! #[repr(C)]
//! struct Shape {
//!     sides: u32,
//! }
//!
//! #[repr(C)]
//! struct Polygon {
//!     shape: Shape,
//!     vertices: [(f32, f32); 4],
//! }
//!
//! extends!(Polygon => Shape, shape);
//!
//! let polygons = [
//!     Polygon { shape: Shape { sides: 3 }, vertices: [(0.0, 0.0); 4] },
//!     Polygon { shape: Shape { sides: 4 }, vertices: [(1.0, 1.0); 4] },
//! ];
//! let shapes = PolySpan::<Shape>::new(&polygons);
//! assert_eq!(shapes.iter().map(|shape| shape.sides).sum::<u32>(), 7);
//! ```
//!
//! ## Signatures
//!
//! Every callable type is parameterized by a signature written as a trait
//! object type: `dyn Fn(A0, .., An) -> R + 'a`, or
//! `dyn Fn(A0, .., An) -> R + Send + Sync + 'a` for callables that may cross
//! threads. Zero to six arguments are supported. Argument and return types must
//! be `'static`; the lifetime `'a` bounds what the callee may borrow.
//!
//! ## Capacity
//!
//! The second parameter of [`InplaceFn`] is a memory type whose size and
//! alignment are those of the inline buffer. A payload that does not fit is a
//! compile-time error, and so is moving a callable into a smaller buffer.
//!
//! ## Errors and logging
//!
//! Invoking an empty callable through `call` panics; the `try_call`, `call_if`
//! and `call_or` forms do not. Checked view accessors return
//! [`OutOfRangeError`]. Events are emitted through [`tracing`]: invoking an
//! empty callable at `error`, out-of-range view accesses at `debug` and moves
//! between capacities at `trace`. No subscriber is installed by this crate.
//!
//! ## Features
//!
//! - `std`: enables `std` support in [`tracing`]. The crate stays `no_std`
//!   otherwise.
//!
//! [`tracing`]: https://docs.rs/tracing

#[cfg(any(test, feature = "std"))]
extern crate std;

#[macro_use]
mod macros;

mod bound;
mod error;
mod extends;
mod inplace_fn;
mod poly_span;
mod util;

pub mod persistence;
pub mod prelude;
pub mod sync;

pub use inplace_internals::{Callable, Signature};

pub use self::{
    bound::{FnRef, MethodMut, MethodRef},
    error::{OutOfRangeError, UninitializedError},
    extends::Extends,
    inplace_fn::InplaceFn,
    poly_span::{Cursor, DYNAMIC_EXTENT, Iter, IterMut, PolySpan, PolySpanMut},
};
