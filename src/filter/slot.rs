//! Atomically swappable slots.
//!
//! Each slot is a `crossbeam::epoch::Atomic<Bytes>`. The null pointer encodes
//! the two empty states: tag 0 is a slot that was never written, tag 1 a slot
//! that was explicitly forgotten. Displaced occupants are retired through the
//! epoch collector, so a pinned reader can always dereference what it loaded.

use bytes::Bytes;
use crossbeam::epoch::{self, Atomic, Guard, Owned, Shared};
use std::sync::atomic::Ordering;

const FORGOTTEN_TAG: usize = 1;

/// The contents of a slot at some instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// Never written.
    Unset,
    /// Cleared by `forget`.
    Forgotten,
    /// Holding an identifier.
    Occupied(Bytes),
}

impl Slot {
    /// The stored identifier, if any.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Slot::Occupied(id) => Some(&id[..]),
            Slot::Unset | Slot::Forgotten => None,
        }
    }

    /// Whether the slot holds exactly `id`.
    pub fn is_occupied_by(&self, id: &[u8]) -> bool {
        self.as_bytes() == Some(id)
    }

    /// Whether the slot holds no identifier.
    pub fn is_empty(&self) -> bool {
        !matches!(self, Slot::Occupied(_))
    }
}

/// A single lock-free slot.
pub(crate) struct AtomicSlot {
    inner: Atomic<Bytes>,
}

impl AtomicSlot {
    pub(crate) fn new() -> Self {
        Self {
            inner: Atomic::null(),
        }
    }

    /// Read the current contents.
    pub(crate) fn load(&self) -> Slot {
        let guard = &epoch::pin();
        let current = self.inner.load(Ordering::Acquire, guard);
        // SAFETY: `guard` is pinned, and every pointer removed from a slot is
        // retired with `defer_destroy`, so `current` stays valid here.
        match unsafe { current.as_ref() } {
            Some(id) => Slot::Occupied(id.clone()),
            None => empty_slot(current),
        }
    }

    /// Put `id` into the slot and return what it replaced.
    ///
    /// Compare-and-swap loop: a failed exchange means another thread wrote
    /// the slot, so some thread always makes progress.
    pub(crate) fn replace(&self, id: Bytes) -> Slot {
        let guard = &epoch::pin();
        let (prev, _) = self.exchange(id, guard);
        // SAFETY: `exchange` unlinked `prev`; no other thread can unlink it again.
        unsafe { retire(prev, guard) }
    }

    /// Put `id` into the slot and report whether the previous occupant
    /// byte-equals it. The displaced value is compared in place, not cloned.
    pub(crate) fn replace_matches(&self, id: Bytes) -> bool {
        let guard = &epoch::pin();
        let (prev, new) = self.exchange(id, guard);

        // SAFETY: `guard` is pinned, so both nodes stay valid even if another
        // thread has already displaced `new`.
        let matches = match unsafe { (prev.as_ref(), new.as_ref()) } {
            (Some(prev), Some(new)) => prev == new,
            _ => false,
        };
        if !prev.is_null() {
            // SAFETY: `exchange` unlinked `prev`.
            unsafe { guard.defer_destroy(prev) };
        }
        matches
    }

    /// Swap `id` in, returning the unlinked previous pointer and the new one.
    fn exchange<'g>(
        &self,
        id: Bytes,
        guard: &'g Guard,
    ) -> (Shared<'g, Bytes>, Shared<'g, Bytes>) {
        let mut new = Owned::new(id);
        let mut current = self.inner.load(Ordering::Acquire, guard);

        loop {
            match self.inner.compare_exchange_weak(
                current,
                new,
                Ordering::AcqRel,
                Ordering::Acquire,
                guard,
            ) {
                Ok(installed) => return (current, installed),
                Err(err) => {
                    current = err.current;
                    new = err.new;
                }
            }
        }
    }

    /// Mark the slot forgotten if it still holds what a single read observed.
    ///
    /// With `expected` set, the read value must also byte-equal it. Returns
    /// whether the slot was cleared. Never retries.
    pub(crate) fn forget(&self, expected: Option<&[u8]>) -> bool {
        let guard = &epoch::pin();
        let current = self.inner.load(Ordering::Acquire, guard);
        self.forget_observed(current, expected, guard)
    }

    /// The swap half of [`forget`](Self::forget), against an earlier read.
    fn forget_observed<'g>(
        &self,
        current: Shared<'g, Bytes>,
        expected: Option<&[u8]>,
        guard: &'g Guard,
    ) -> bool {
        if let Some(expected) = expected {
            // SAFETY: see `load`.
            match unsafe { current.as_ref() } {
                Some(id) if id[..] == *expected => {}
                _ => return false,
            }
        }

        let forgotten = Shared::null().with_tag(FORGOTTEN_TAG);
        match self.inner.compare_exchange(
            current,
            forgotten,
            Ordering::AcqRel,
            Ordering::Acquire,
            guard,
        ) {
            Ok(_) => {
                if !current.is_null() {
                    // SAFETY: the exchange unlinked `current`.
                    unsafe { guard.defer_destroy(current) };
                }
                true
            }
            Err(_) => false,
        }
    }
}

impl Drop for AtomicSlot {
    fn drop(&mut self) {
        // SAFETY: `&mut self` means no other thread can reach this slot.
        unsafe {
            let guard = epoch::unprotected();
            let current = self.inner.load(Ordering::Relaxed, guard);
            if !current.is_null() {
                drop(current.into_owned());
            }
        }
    }
}

fn empty_slot(shared: Shared<'_, Bytes>) -> Slot {
    match shared.tag() {
        FORGOTTEN_TAG => Slot::Forgotten,
        _ => Slot::Unset,
    }
}

/// Convert an unlinked pointer into a `Slot`, deferring its destruction.
///
/// # Safety
///
/// `shared` must have just been unlinked from a slot by the caller.
unsafe fn retire(shared: Shared<'_, Bytes>, guard: &Guard) -> Slot {
    match shared.as_ref() {
        Some(id) => {
            let id = id.clone();
            guard.defer_destroy(shared);
            Slot::Occupied(id)
        }
        None => empty_slot(shared),
    }
}

/// Fixed-length array of slots, allocated once with every slot unset.
pub(crate) struct SlotTable {
    slots: Box<[AtomicSlot]>,
}

impl SlotTable {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| AtomicSlot::new()).collect(),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn slot(&self, index: usize) -> &AtomicSlot {
        &self.slots[index]
    }
}
