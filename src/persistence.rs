//! The persistence capability.
//!
//! A [`Persistence`] is a byte sink and source, typically backed by EEPROM,
//! flash or battery-backed RAM. Values are written and read back in the same
//! order with [`save_persistent`] and [`restore_persistent`], which move the
//! raw bytes of a [`Pod`] value.
//!
//! ```
//! use inplace::persistence::{MemoryPersistence, Persistence, restore_persistent, save_persistent};
//!
//! let mut store = MemoryPersistence::<16>::new();
//! store.start();
//! save_persistent(&0x1234_u16, &mut store);
//! save_persistent(&[1.5_f32, -2.0], &mut store);
//!
//! store.start();
//! assert_eq!(restore_persistent::<u16, _>(&mut store), 0x1234);
//! assert_eq!(restore_persistent::<[f32; 2], _>(&mut store), [1.5, -2.0]);
//! ```

use core::fmt;

use bytemuck::Pod;

/// A sequential byte store.
pub trait Persistence {
    /// Begins a session. Subsequent saves and restores start from the
    /// beginning of the store.
    fn start(&mut self);

    /// Appends `data` to the store.
    fn save(&mut self, data: &[u8]);

    /// Fills `data` with the next bytes of the store.
    fn restore(&mut self, data: &mut [u8]);
}

impl<P: Persistence + ?Sized> Persistence for &mut P {
    #[inline]
    fn start(&mut self) {
        P::start(self);
    }

    #[inline]
    fn save(&mut self, data: &[u8]) {
        P::save(self, data);
    }

    #[inline]
    fn restore(&mut self, data: &mut [u8]) {
        P::restore(self, data);
    }
}

/// Writes the `size_of::<T>()` bytes of `value` to `persistence`.
///
/// This does not call [`Persistence::start`].
#[inline]
pub fn save_persistent<T: Pod, P: Persistence + ?Sized>(value: &T, persistence: &mut P) {
    persistence.save(bytemuck::bytes_of(value));
}

/// Reads `size_of::<T>()` bytes from `persistence` as a `T`.
///
/// This does not call [`Persistence::start`].
#[inline]
pub fn restore_persistent<T: Pod, P: Persistence + ?Sized>(persistence: &mut P) -> T {
    let mut value = T::zeroed();
    persistence.restore(bytemuck::bytes_of_mut(&mut value));
    value
}

/// A [`Persistence`] over an in-memory buffer of `N` bytes.
///
/// Saves past the end of the buffer are truncated and restores past the end
/// read zeros. Both are logged at `warn` level and reported by
/// [`overflowed`](MemoryPersistence::overflowed) until the next
/// [`start`](Persistence::start).
#[derive(Clone)]
pub struct MemoryPersistence<const N: usize> {
    buffer: [u8; N],
    position: usize,
    overflowed: bool,
}

impl<const N: usize> MemoryPersistence<N> {
    /// Creates a zeroed store.
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self {
            buffer: [0; N],
            position: 0,
            overflowed: false,
        }
    }

    /// Returns the offset of the next save or restore.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns `true` if an access went past the end since the last
    /// [`start`](Persistence::start).
    #[inline]
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Returns the whole buffer.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; N] {
        &self.buffer
    }

    /// Splits an access of `len` bytes into the part that fits and records an
    /// overflow for the rest.
    fn claim(&mut self, len: usize, operation: &'static str) -> core::ops::Range<usize> {
        let start = self.position;
        let end = start.saturating_add(len).min(N);
        if end - start < len {
            tracing::warn!(
                operation,
                requested = len,
                available = N - start,
                capacity = N,
                "persistent store overflow"
            );
            self.overflowed = true;
        }
        self.position = end;
        start..end
    }
}

impl<const N: usize> Default for MemoryPersistence<N> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Persistence for MemoryPersistence<N> {
    fn start(&mut self) {
        self.position = 0;
        self.overflowed = false;
    }

    fn save(&mut self, data: &[u8]) {
        let range = self.claim(data.len(), "save");
        let stored = range.len();
        self.buffer[range].copy_from_slice(&data[..stored]);
    }

    fn restore(&mut self, data: &mut [u8]) {
        let range = self.claim(data.len(), "restore");
        let (read, missing) = data.split_at_mut(range.len());
        read.copy_from_slice(&self.buffer[range]);
        missing.fill(0);
    }
}

impl<const N: usize> fmt::Debug for MemoryPersistence<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryPersistence")
            .field("capacity", &N)
            .field("position", &self.position)
            .field("overflowed", &self.overflowed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use bytemuck::Zeroable;

    use super::*;

    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq, Zeroable, Pod)]
    struct Calibration {
        offset: i32,
        gain: f32,
        flags: u32,
    }

    #[test]
    fn test_round_trip_in_order() {
        let calibration = Calibration {
            offset: -12,
            gain: 1.25,
            flags: 0b101,
        };

        let mut store = MemoryPersistence::<32>::new();
        store.start();
        save_persistent(&calibration, &mut store);
        save_persistent(&7_u8, &mut store);
        assert_eq!(store.position(), 13);

        store.start();
        assert_eq!(restore_persistent::<Calibration, _>(&mut store), calibration);
        assert_eq!(restore_persistent::<u8, _>(&mut store), 7);
        assert!(!store.overflowed());
    }

    #[test]
    fn test_free_functions_do_not_start() {
        let mut store = MemoryPersistence::<8>::new();
        save_persistent(&1_u32, &mut store);
        save_persistent(&2_u32, &mut store);
        assert_eq!(store.position(), 8);
        assert_eq!(&store.as_bytes()[4..], &2_u32.to_ne_bytes());
    }

    #[test]
    fn test_overflow_truncates_and_zero_fills() {
        let mut store = MemoryPersistence::<6>::new();
        store.start();
        save_persistent(&0x0102_0304_u32, &mut store);
        save_persistent(&u32::MAX, &mut store);
        assert!(store.overflowed());
        assert_eq!(store.position(), 6);
        assert_eq!(&store.as_bytes()[4..], &[0xff, 0xff]);

        store.start();
        assert!(!store.overflowed());
        let _ = restore_persistent::<u32, _>(&mut store);
        let partial = restore_persistent::<[u8; 4], _>(&mut store);
        assert_eq!(partial, [0xff, 0xff, 0, 0]);
        assert!(store.overflowed());
    }

    #[test]
    fn test_persistence_through_dyn_and_reference() {
        let mut store = MemoryPersistence::<4>::default();
        {
            let dynamic: &mut dyn Persistence = &mut store;
            dynamic.start();
            save_persistent(&[9_u8, 8], dynamic);
        }
        let mut by_ref = &mut store;
        by_ref.start();
        assert_eq!(restore_persistent::<[u8; 2], _>(&mut by_ref), [9, 8]);
        assert_eq!(
            std::format!("{store:?}"),
            "MemoryPersistence { capacity: 4, position: 2, overflowed: false }"
        );
    }
}
