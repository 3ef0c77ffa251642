//! Layout-compatible "derived" types.
//!
//! Rust has no struct inheritance, but a type that stores a `Base` as its
//! first field can be read as a `Base` through a pointer to it. [`Extends`]
//! records that relation so that a [`PolySpan<Base>`] can be built over an
//! array of the larger type.
//!
//! [`PolySpan<Base>`]: crate::PolySpan

/// Marks `Self` as beginning with a `Base`.
///
/// Implement it with the [`extends!`](crate::extends) macro, which verifies
/// the layout at compile time.
///
/// Every type extends itself.
///
/// # Safety
///
/// Implementors must guarantee that every value of `Self` contains a valid,
/// initialized `Base` at offset 0, and that writing any valid `Base` there
/// leaves a valid `Self`.
pub unsafe trait Extends<Base> {}

// SAFETY: A value is a valid instance of its own type, at offset 0.
unsafe impl<T> Extends<T> for T {}
