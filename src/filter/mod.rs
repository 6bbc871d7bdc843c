//! The membership filter.
//!
//! [`OppoFilter`] answers "have I seen this identifier before?" with a single
//! slot per identifier. Inserting an identifier evicts whatever shared its
//! slot, so the filter can forget things (false negatives) but it only ever
//! answers `true` when the exact bytes were the previous occupant (no false
//! positives).

pub mod index;
pub mod slot;

pub use index::Indexer;
pub use slot::Slot;

use crate::config::{ForgetPolicy, IndexStrategy, Options};
use crate::error::{Error, Result};
use bytes::Bytes;
use index::LEGACY_HASH_MAX;
use slot::SlotTable;
use std::fmt;

/// A lock-free, fixed-capacity filter with no false positives.
///
/// All operations take `&self`; share the filter across threads with
/// `Arc<OppoFilter>`.
///
/// # Example
/// ```
/// use oppobloom::OppoFilter;
///
/// let filter = OppoFilter::new(1000).unwrap();
/// assert_eq!(filter.size(), 1024);
///
/// assert!(!filter.contains(b"request-1")); // first sighting
/// assert!(filter.contains(b"request-1")); // seen before
///
/// filter.forget(b"request-1");
/// assert!(!filter.contains(b"request-1"));
/// ```
pub struct OppoFilter {
    table: SlotTable,
    indexer: Indexer,
    options: Options,
}

impl OppoFilter {
    /// Create a filter with at least `size` slots using default options.
    ///
    /// The capacity is rounded up to the next power of two.
    pub fn new(size: i64) -> Result<Self> {
        Self::with_options(size, Options::default())
    }

    /// Create a filter with at least `size` slots.
    ///
    /// # Errors
    /// * `SizeTooSmall` if `size <= 0`
    /// * `SizeTooLarge` if `size > options.max_size`
    /// * `InvalidArgument` if the options are invalid
    pub fn with_options(size: i64, options: Options) -> Result<Self> {
        options.validate()?;

        if size <= 0 {
            return Err(Error::SizeTooSmall { requested: size });
        }

        let too_large = Error::SizeTooLarge {
            requested: size,
            max: options.max_size,
        };
        let requested = usize::try_from(size).map_err(|_| too_large.clone())?;
        if requested > options.max_size {
            return Err(too_large);
        }

        // max_size is a power of two, so rounding up cannot pass it.
        let capacity = requested.next_power_of_two();

        if options.index_strategy == IndexStrategy::Legacy
            && capacity > LEGACY_HASH_MAX as usize + 1
        {
            log::warn!(
                "Legacy indexing only reaches {} of {} slots",
                LEGACY_HASH_MAX as usize + 1,
                capacity
            );
        }

        log::debug!(
            "Creating filter: requested {}, capacity {}, {:?} indexing, {:?} forget",
            size,
            capacity,
            options.index_strategy,
            options.forget_policy
        );

        let indexer = Indexer::new(capacity, options.index_strategy)?;

        Ok(Self {
            table: SlotTable::new(capacity),
            indexer,
            options,
        })
    }

    /// Insert `id` and report whether it was the slot's previous occupant.
    ///
    /// Returns `false` for a first sighting, and also when `id` was evicted
    /// by a colliding identifier or forgotten since it was last inserted.
    pub fn contains(&self, id: &[u8]) -> bool {
        self.contains_bytes(Bytes::copy_from_slice(id))
    }

    /// Like [`contains`](Self::contains), without copying an owned identifier.
    pub fn contains_bytes(&self, id: Bytes) -> bool {
        let index = self.indexer.index(&id);
        self.table.slot(index).replace_matches(id)
    }

    /// Insert `id` and return the slot's previous contents.
    ///
    /// Ownership of the previous occupant passes to the caller.
    pub fn insert(&self, id: impl Into<Bytes>) -> Slot {
        let id = id.into();
        let index = self.indexer.index(&id);
        self.table.slot(index).replace(id)
    }

    /// Best-effort removal of `id`.
    ///
    /// Makes a single attempt to mark `id`'s slot forgotten. A concurrent
    /// write to the slot wins and the forget is silently dropped. Under
    /// [`ForgetPolicy::Snapshot`] the slot is cleared whatever it held;
    /// under [`ForgetPolicy::MatchIdentifier`] only if it held `id`.
    pub fn forget(&self, id: &[u8]) {
        self.try_forget(id);
    }

    pub(crate) fn try_forget(&self, id: &[u8]) -> bool {
        let expected = match self.options.forget_policy {
            ForgetPolicy::Snapshot => None,
            ForgetPolicy::MatchIdentifier => Some(id),
        };
        self.table.slot(self.indexer.index(id)).forget(expected)
    }

    /// Number of slots. Always the rounded power-of-two capacity.
    pub fn size(&self) -> usize {
        self.table.len()
    }

    /// The slot `id` maps to.
    pub fn slot_index(&self, id: &[u8]) -> usize {
        self.indexer.index(id)
    }

    /// The indexer used by this filter.
    pub fn indexer(&self) -> &Indexer {
        &self.indexer
    }

    /// The options the filter was built with.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Current contents of the slot at `index`, or `None` if out of range.
    pub fn peek_slot(&self, index: usize) -> Option<Slot> {
        (index < self.size()).then(|| self.table.slot(index).load())
    }
}

impl fmt::Debug for OppoFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OppoFilter")
            .field("size", &self.size())
            .field("indexer", &self.indexer)
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_rounds_up() {
        assert_eq!(OppoFilter::new(1).unwrap().size(), 1);
        assert_eq!(OppoFilter::new(5).unwrap().size(), 8);
        assert_eq!(OppoFilter::new(1024).unwrap().size(), 1024);
        assert_eq!(OppoFilter::new(1025).unwrap().size(), 2048);
    }

    #[test]
    fn test_invalid_sizes() {
        assert_eq!(
            OppoFilter::new(0).unwrap_err(),
            Error::SizeTooSmall { requested: 0 }
        );
        assert_eq!(
            OppoFilter::new(-5).unwrap_err(),
            Error::SizeTooSmall { requested: -5 }
        );
        assert_eq!(
            OppoFilter::new(1 << 31).unwrap_err(),
            Error::SizeTooLarge {
                requested: 1 << 31,
                max: 1 << 30
            }
        );
        assert!(matches!(
            OppoFilter::new(i64::MAX),
            Err(Error::SizeTooLarge { .. })
        ));
    }

    #[test]
    fn test_custom_max_size() {
        let opts = Options::new().max_size(64);
        assert_eq!(OppoFilter::with_options(64, opts.clone()).unwrap().size(), 64);
        assert_eq!(OppoFilter::with_options(33, opts.clone()).unwrap().size(), 64);
        assert!(matches!(
            OppoFilter::with_options(65, opts),
            Err(Error::SizeTooLarge { requested: 65, max: 64 })
        ));
    }

    #[test]
    fn test_invalid_options_rejected() {
        let opts = Options::new().max_size(100);
        assert!(matches!(
            OppoFilter::with_options(10, opts),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_contains_sequence() {
        let filter = OppoFilter::new(1024).unwrap();

        assert!(!filter.contains(b"key1"));
        assert!(filter.contains(b"key1"));
        assert!(filter.contains(b"key1"));
    }

    #[test]
    fn test_collision_evicts() {
        // "abc" and "hello" share slot 8 in a 16-slot legacy table.
        let filter = OppoFilter::new(16).unwrap();
        assert_eq!(filter.slot_index(b"abc"), filter.slot_index(b"hello"));

        assert!(!filter.contains(b"abc"));
        assert!(!filter.contains(b"hello"));
        assert!(!filter.contains(b"abc"));
        assert!(filter.contains(b"abc"));
    }

    #[test]
    fn test_insert_returns_previous_occupant() {
        let filter = OppoFilter::new(16).unwrap();

        assert_eq!(filter.insert(&b"abc"[..]), Slot::Unset);
        let prev = filter.insert(Bytes::from_static(b"hello"));
        assert!(prev.is_occupied_by(b"abc"));
    }

    #[test]
    fn test_forget_snapshot_policy() {
        let filter = OppoFilter::new(16).unwrap();

        assert!(!filter.contains(b"abc"));
        filter.forget(b"abc");
        assert_eq!(filter.peek_slot(8), Some(Slot::Forgotten));
        assert!(!filter.contains(b"abc"));

        // Forgetting "hello" clears the colliding "abc".
        assert!(filter.try_forget(b"hello"));
        assert!(!filter.contains(b"abc"));
    }

    #[test]
    fn test_forget_match_identifier_policy() {
        let opts = Options::new().forget_policy(ForgetPolicy::MatchIdentifier);
        let filter = OppoFilter::with_options(16, opts).unwrap();

        assert!(!filter.contains(b"abc"));
        assert!(!filter.try_forget(b"hello"));
        assert!(filter.contains(b"abc"));

        assert!(filter.try_forget(b"abc"));
        assert!(!filter.contains(b"abc"));
    }

    #[test]
    fn test_empty_identifier() {
        let filter = OppoFilter::new(8).unwrap();

        assert!(!filter.contains(b""));
        assert!(filter.contains(b""));
        filter.forget(b"");
        assert!(!filter.contains(b""));
    }

    #[test]
    fn test_contains_bytes_shares_slot_with_contains() {
        let filter = OppoFilter::new(64).unwrap();
        let id = Bytes::from_static(b"owned-id");

        assert!(!filter.contains_bytes(id.clone()));
        assert!(filter.contains(b"owned-id"));
        assert!(filter.contains_bytes(id));
        let slot = filter.peek_slot(filter.slot_index(b"owned-id")).unwrap();
        assert!(slot.is_occupied_by(b"owned-id"));
    }

    #[test]
    fn test_peek_slot_out_of_range() {
        let filter = OppoFilter::new(4).unwrap();
        assert_eq!(filter.peek_slot(3), Some(Slot::Unset));
        assert_eq!(filter.peek_slot(4), None);
    }

    #[test]
    fn test_filter_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<OppoFilter>();
    }
}
