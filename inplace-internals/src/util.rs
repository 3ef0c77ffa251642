//! Internal utility types.

/// Marker type used when type-erasing payloads.
///
/// This zero-sized type serves as the pointee of every type-erased pointer.
/// For example, a `NonNull<Erased>` passed to a vtable entry points at a
/// payload whose concrete type is unknown at the current scope, but known to
/// the vtable entry itself.
///
/// Using a distinct marker type (rather than `()` or `u8`) makes the intent
/// clearer in type signatures and error messages, and prevents accidentally
/// reading through the pointer without casting it first.
pub struct Erased;
