#![no_std]
#![forbid(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::missing_docs_in_private_items,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    unused_doc_comments
)]
#![allow(rustdoc::private_intra_doc_links)]
//! Internal implementation crate for [`inplace`].
//!
//! # Overview
//!
//! This crate contains the low-level, type-erased data structures and unsafe
//! operations that power the [`inplace`] crate. It provides the foundation for
//! heap-free type erasure through vtable-based dispatch, and for strided
//! traversal of arrays through a narrower element type.
//!
//! **This crate is an implementation detail.** No semantic versioning guarantees
//! are provided. Users should depend on the [`inplace`] crate, not this one.
//!
//! # Architecture
//!
//! - **[`signature`]**: Type-level description of call signatures
//!   - [`Signature`]: Maps `dyn Fn(A..) -> R` to the concrete function pointer
//!     types used for dispatch
//!   - [`Callable`]: Ties a payload type to the invoker for one signature
//!
//! - **[`callable`]**: Type-erased in-place callable storage
//!   - [`RawInplace`]: Owned payload stored in a fixed-capacity buffer
//!   - [`CallableVtable`]: Function pointers for type-erased dispatch
//!   - [`RawTarget`]: One-word, non-owning function or object reference
//!
//! - **[`strided`]**: Pointer, count and stride triples
//!   - [`RawStrided`]: The single place where element addresses are computed
//!
//! # Safety Strategy
//!
//! Type erasure requires careful handling to maintain Rust's type safety
//! guarantees. When we erase a closure type `F` into a byte buffer, we must
//! ensure that the vtable function pointers still match the actual concrete
//! type stored in that buffer.
//!
//! This crate maintains safety through:
//!
//! - **Module-based encapsulation**: Safety-critical types keep fields
//!   module-private, making invariants locally verifiable within a single file
//! - **Compile-time capacity checks**: A payload can only be written into a
//!   buffer after an inline `const` assertion has proven that it fits
//! - **Documented vtable contracts**: Each vtable method specifies exactly when
//!   it can be safely called
//!
//! [`inplace`]: https://docs.rs/inplace/latest/inplace/
//! [`RawInplace`]: callable::RawInplace
//! [`CallableVtable`]: callable::CallableVtable
//! [`RawTarget`]: callable::RawTarget
//! [`RawStrided`]: strided::RawStrided

pub mod callable;
pub mod signature;
pub mod strided;
mod util;

pub use callable::{CallableVtable, RawInplace, RawTarget};
pub use signature::{Callable, Signature};
pub use strided::RawStrided;
pub use util::Erased;
