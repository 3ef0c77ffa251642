use core::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
    ops::{Add, AddAssign, Sub, SubAssign},
};

use inplace_internals::RawStrided;

/// A random-access position in a [`PolySpan`](crate::PolySpan).
///
/// A cursor may be moved anywhere, including before the first element and
/// past the last one; only [`get`](Cursor::get) looks at the element, and it
/// checks the position first. Cursors compare and subtract by address, in
/// units of the stride of their view.
///
/// # Examples
///
/// ```
/// use inplace::PolySpan;
///
/// let values = [10_u32, 20, 30, 40];
/// let view = PolySpan::<u32>::new(&values);
///
/// let mut cursor = view.begin() + 3;
/// assert_eq!(cursor.get(), Some(&40));
/// cursor -= 2;
/// assert_eq!(cursor.get(), Some(&20));
/// assert_eq!(view.end() - cursor, 3);
/// assert_eq!(view.end().get(), None);
/// assert!(view.begin() < cursor);
/// ```
pub struct Cursor<'a, T> {
    raw: RawStrided<T>,
    index: isize,
    _marker: PhantomData<&'a T>,
}

// SAFETY: A `Cursor` only hands out `&T`.
unsafe impl<T: Sync> Send for Cursor<'_, T> {}

// SAFETY: See the `Send` implementation above.
unsafe impl<T: Sync> Sync for Cursor<'_, T> {}

impl<'a, T> Cursor<'a, T> {
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The elements of `raw` are valid and not mutated for `'a`, except
    ///    through interior mutability of `T`.
    #[inline]
    pub(super) unsafe fn new(raw: RawStrided<T>, index: isize) -> Self {
        Self {
            raw,
            index,
            _marker: PhantomData,
        }
    }

    /// Returns the position relative to the first element of the view.
    #[inline]
    pub fn index(&self) -> isize {
        self.index
    }

    /// Returns the address this cursor points to. It may lie outside of the
    /// view.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.raw.wrapping_element_ptr(self.index)
    }

    /// Returns the element under the cursor, or `None` if the cursor is
    /// outside of the view.
    #[inline]
    pub fn get(&self) -> Option<&'a T> {
        let index = usize::try_from(self.index).ok()?;
        if index >= self.raw.len() {
            return None;
        }
        // SAFETY:
        // 1. `index < len` was just checked
        let ptr = unsafe { self.raw.element_ptr(index) };
        // SAFETY: The element is in bounds and borrowed for `'a`.
        Some(unsafe { ptr.as_ref() })
    }
}

impl<T> Clone for Cursor<'_, T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Cursor<'_, T> {}

impl<T> Add<isize> for Cursor<'_, T> {
    type Output = Self;

    #[inline]
    fn add(mut self, offset: isize) -> Self {
        self += offset;
        self
    }
}

impl<T> Sub<isize> for Cursor<'_, T> {
    type Output = Self;

    #[inline]
    fn sub(mut self, offset: isize) -> Self {
        self -= offset;
        self
    }
}

impl<T> AddAssign<isize> for Cursor<'_, T> {
    #[inline]
    fn add_assign(&mut self, offset: isize) {
        self.index += offset;
    }
}

impl<T> SubAssign<isize> for Cursor<'_, T> {
    #[inline]
    fn sub_assign(&mut self, offset: isize) {
        self.index -= offset;
    }
}

/// The number of elements from `origin` to `self`.
impl<T> Sub for Cursor<'_, T> {
    type Output = isize;

    #[inline]
    fn sub(self, origin: Self) -> isize {
        self.raw.distance(origin.as_ptr(), self.as_ptr())
    }
}

impl<T> PartialEq for Cursor<'_, T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.as_ptr() == other.as_ptr()
    }
}

impl<T> Eq for Cursor<'_, T> {}

impl<T> PartialOrd for Cursor<'_, T> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Cursor<'_, T> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_ptr().addr().cmp(&other.as_ptr().addr())
    }
}

impl<T> Hash for Cursor<'_, T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_ptr().addr().hash(state);
    }
}

impl<T> fmt::Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("ptr", &self.as_ptr())
            .field("index", &self.index)
            .finish()
    }
}
