//! Integration tests for the inplace-internals crate.
//!
//! These tests exercise the building blocks together, through the public API
//! only:
//!
//! ## Callable Tests
//! - `test_inplace_all_arities`: Payloads of every supported arity
//! - `test_inplace_send_sync_signature`: Thread-safe signatures share the same
//!   storage machinery
//! - `test_inplace_function_pointer_shares_vtable`: One vtable per payload
//!   type, regardless of the holder
//! - `test_inplace_cross_capacity_drop_parity`: Exact drop counts across
//!   widening moves and clones
//! - `test_target_matches_inplace`: Borrowed and owned dispatch agree
//!
//! The auto traits and sizes of the raw types are asserted statically.
//!
//! ## Strided Tests
//! - `test_strided_prefix_traversal`: Reading a prefix type across a larger
//!   element type
//! - `test_strided_cursor_arithmetic`: Wrapping positions and distances

use core::sync::atomic::{AtomicUsize, Ordering};
use inplace_internals::{Callable, CallableVtable, RawInplace, RawStrided, RawTarget, Signature};

type Invoke<S> = <S as Signature>::Invoke;

static_assertions::assert_not_impl_any!(RawInplace<Invoke<dyn Fn() + Send + Sync>, [u64; 2]>: Send, Sync);
static_assertions::assert_not_impl_any!(RawTarget<fn()>: Send, Sync);
static_assertions::assert_impl_all!(RawTarget<fn()>: Copy);
static_assertions::assert_eq_size!(RawTarget<fn(u8) -> u8>, usize);
static_assertions::assert_eq_size!(RawStrided<u8>, [usize; 3]);

#[test]
fn test_inplace_all_arities() {
    let base = 1_u64;

    let zero = RawInplace::<Invoke<dyn Fn() -> u64>, [u64; 1]>::new::<dyn Fn() -> u64, _>(move || base);
    let (invoke, payload) = zero.invoker().unwrap();
    // SAFETY: The pointer comes from `invoker` and `zero` stays borrowed.
    assert_eq!(unsafe { invoke(payload) }, 1);

    let three = RawInplace::<Invoke<dyn Fn(u64, u64, u64) -> u64>, [u64; 1]>::new::<
        dyn Fn(u64, u64, u64) -> u64,
        _,
    >(move |a: u64, b: u64, c: u64| base + a + b + c);
    let (invoke, payload) = three.invoker().unwrap();
    // SAFETY: The pointer comes from `invoker` and `three` stays borrowed.
    assert_eq!(unsafe { invoke(payload, 1, 2, 3) }, 7);

    type Six = dyn Fn(u8, u8, u8, u8, u8, u8) -> u64;
    let six = RawInplace::<Invoke<Six>, [u64; 1]>::new::<Six, _>(move |a: u8, b: u8, c: u8, d: u8, e: u8, f: u8| {
        base + u64::from(a + b + c + d + e + f)
    });
    let (invoke, payload) = six.invoker().unwrap();
    // SAFETY: The pointer comes from `invoker` and `six` stays borrowed.
    assert_eq!(unsafe { invoke(payload, 1, 1, 1, 1, 1, 1) }, 7);
}

#[test]
fn test_inplace_send_sync_signature() {
    type Sig = dyn Fn(&'static str) -> usize + Send + Sync;

    let raw = RawInplace::<Invoke<Sig>, [usize; 2]>::new::<Sig, _>(|text: &'static str| text.len());
    let (invoke, payload) = raw.invoker().unwrap();
    // SAFETY: The pointer comes from `invoker` and `raw` stays borrowed.
    assert_eq!(unsafe { invoke(payload, "four") }, 4);
    assert_eq!(<Sig as Signature>::ARITY, 1);
}

#[test]
fn test_inplace_function_pointer_shares_vtable() {
    type Sig = dyn Fn(i64) -> i64;

    fn square(value: i64) -> i64 {
        value * value
    }

    let first = RawInplace::<Invoke<Sig>, [usize; 1]>::new::<Sig, _>(square as fn(i64) -> i64);
    let second = RawInplace::<Invoke<Sig>, [u64; 4]>::new::<Sig, _>(square as fn(i64) -> i64);

    assert_eq!(first.type_name(), second.type_name());
    assert!(core::ptr::eq(
        CallableVtable::new::<Sig, fn(i64) -> i64>(),
        CallableVtable::new::<Sig, fn(i64) -> i64>(),
    ));

    let (invoke, payload) = second.invoker().unwrap();
    // SAFETY: The pointer comes from `invoker` and `second` stays borrowed.
    assert_eq!(unsafe { invoke(payload, -3) }, 9);
}

#[test]
fn test_inplace_cross_capacity_drop_parity() {
    static DROPS: AtomicUsize = AtomicUsize::new(0);

    #[derive(Clone)]
    struct Tracked(u32);
    impl Drop for Tracked {
        fn drop(&mut self) {
            DROPS.fetch_add(1, Ordering::SeqCst);
        }
    }

    type Sig = dyn Fn(u32) -> u32;

    let tracked = Tracked(5);
    let mut small = RawInplace::<Invoke<Sig>, [u32; 1]>::new::<Sig, _>(move |value: u32| {
        // Borrow the whole value so the closure owns `Tracked`, not just its field
        let tracked = &tracked;
        value + tracked.0
    });

    // Moving into a larger holder relocates without dropping
    let large: RawInplace<Invoke<Sig>, [u64; 4]> = small.take_widened();
    assert!(small.is_empty());
    assert_eq!(DROPS.load(Ordering::SeqCst), 0);

    // Cloning into a larger holder creates a second payload
    let copy: RawInplace<Invoke<Sig>, [u64; 8]> = large.clone_widened();
    let (invoke, payload) = copy.invoker().unwrap();
    // SAFETY: The pointer comes from `invoker` and `copy` stays borrowed.
    assert_eq!(unsafe { invoke(payload, 1) }, 6);

    drop(small);
    assert_eq!(DROPS.load(Ordering::SeqCst), 0);
    drop(large);
    assert_eq!(DROPS.load(Ordering::SeqCst), 1);
    drop(copy);
    assert_eq!(DROPS.load(Ordering::SeqCst), 2);
}

#[test]
fn test_target_matches_inplace() {
    type Sig = dyn Fn(u32) -> u32;
    type FnPtr = <Sig as Signature>::FnPtr;

    fn borrowed_invoker<F: Fn(u32) -> u32 + 'static>(_closure: &F) -> Invoke<Sig> {
        <&F as Callable<Sig>>::INVOKE
    }

    let scale = 4_u32;
    let closure = move |value: u32| value * scale;

    let target = RawTarget::<FnPtr>::from_object(&closure);
    let owned = RawInplace::<Invoke<Sig>, [u32; 1]>::new::<Sig, _>(closure);

    let borrowed_invoke = borrowed_invoker(&closure);
    // SAFETY: `target` refers to `closure`, which is still alive.
    let borrowed = unsafe { borrowed_invoke(target.as_payload(), 3) };

    let (invoke, payload) = owned.invoker().unwrap();
    // SAFETY: The pointer comes from `invoker` and `owned` stays borrowed.
    let from_owned = unsafe { invoke(payload, 3) };

    assert_eq!(borrowed, 12);
    assert_eq!(from_owned, borrowed);
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct Shape {
    sides: u32,
    scale: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct Polygon {
    shape: Shape,
    name: [u8; 12],
    area: f64,
}

fn polygons() -> [Polygon; 3] {
    [3, 4, 6].map(|sides| Polygon {
        shape: Shape { sides, scale: 2 },
        name: [b'p'; 12],
        area: f64::from(sides),
    })
}

#[test]
fn test_strided_prefix_traversal() {
    let items = polygons();
    // SAFETY: `Polygon` is `repr(C)` and begins with a `Shape`.
    let raw: RawStrided<Shape> = unsafe { RawStrided::from_slice(&items).cast() };
    assert_eq!(raw.stride(), core::mem::size_of::<Polygon>());

    let mut sides = Vec::new();
    for index in 0..raw.len() {
        // SAFETY: `index < len`
        let ptr = unsafe { raw.element_ptr(index) };
        // SAFETY: The pointee is the `Shape` of a live `Polygon`.
        let shape = unsafe { ptr.as_ref() };
        sides.push(shape.sides * shape.scale);
    }
    assert_eq!(sides, [6, 8, 12]);
    assert_eq!(items[2].area, 6.0);
    assert_eq!(items[0].name[0], b'p');
}

#[test]
fn test_strided_cursor_arithmetic() {
    let items = polygons();
    let raw = RawStrided::from_slice(&items);

    let begin = raw.wrapping_element_ptr(0);
    let end = raw.wrapping_element_ptr(raw.len().cast_signed());
    assert_eq!(raw.distance(begin, end), 3);

    // SAFETY: `3 <= len`
    let end_ptr = unsafe { raw.element_ptr(3) };
    assert_eq!(end_ptr.as_ptr().cast_const(), end);

    let far = raw.wrapping_element_ptr(100);
    assert_eq!(raw.distance(begin, far), 100);
}
