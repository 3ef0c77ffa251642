/// Implements [`Extends`] for a type whose field at offset 0 is the base.
///
/// The macro checks at compile time that the named field has the type of the
/// base and that it lives at offset 0. Nested fields can be named with dots,
/// which makes a type extend the base of its own base.
///
/// The derived type should be `#[repr(C)]`, so that the offset of the field
/// does not depend on compiler choices. Without it, the offset check may
/// fail after an unrelated change to the type.
///
/// [`Extends`]: crate::Extends
///
/// # Examples
///
/// ```
/// use inplace::{PolySpan, extends};
///
/// #[repr(C)]
/// struct Sensor {
///     id: u32,
/// }
///
/// #[repr(C)]
/// struct Thermometer {
///     sensor: Sensor,
///     celsius: f32,
///     samples: [u16; 6],
/// }
///
/// #[repr(C)]
/// struct Logger {
///     thermometer: Thermometer,
///     interval: u64,
/// }
///
/// extends!(Thermometer => Sensor, sensor);
/// extends!(Logger => Thermometer, thermometer);
/// extends!(Logger => Sensor, thermometer.sensor);
///
/// let loggers = [
///     Logger {
///         thermometer: Thermometer { sensor: Sensor { id: 7 }, celsius: 21.5, samples: [0; 6] },
///         interval: 60,
///     },
/// ];
/// let sensors = PolySpan::<Sensor>::new(&loggers);
/// assert_eq!(sensors[0].id, 7);
/// ```
///
/// A field at a non-zero offset is rejected:
///
/// ```compile_fail
/// use inplace::extends;
///
/// #[repr(C)]
/// struct Base(u32);
///
/// #[repr(C)]
/// struct Derived {
///     tag: u32,
///     base: Base,
/// }
///
/// extends!(Derived => Base, base);
/// ```
#[macro_export]
macro_rules! extends {
    ($derived:ty => $base:ty, $($field:ident).+ $(,)?) => {
        const _: () = {
            #[allow(dead_code)]
            fn field_is_base(value: &$derived) -> &$base {
                &value.$($field).+
            }

            assert!(
                ::core::mem::offset_of!($derived, $($field).+) == 0,
                "the base must be stored at offset 0"
            );
        };

        // SAFETY: The assertion above proves that the field is a `$base` at
        // offset 0 of every `$derived`.
        unsafe impl $crate::Extends<$base> for $derived {}
    };
}

/// Invokes `$callback!` once per supported arity, with the argument names and
/// type parameters of that arity.
macro_rules! for_each_arity {
    ($callback:ident) => {
        $callback!();
        $callback!(a0: A0);
        $callback!(a0: A0, a1: A1);
        $callback!(a0: A0, a1: A1, a2: A2);
        $callback!(a0: A0, a1: A1, a2: A2, a3: A3);
        $callback!(a0: A0, a1: A1, a2: A2, a3: A3, a4: A4);
        $callback!(a0: A0, a1: A1, a2: A2, a3: A3, a4: A4, a5: A5);
    };
}
