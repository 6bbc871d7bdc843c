//! Configuration options for the filter.

use crate::error::{Error, Result};

/// Default upper bound on the number of slots in a filter.
pub const DEFAULT_MAX_FILTER_SIZE: usize = 1 << 30;

/// Largest `max_size` accepted by [`Options::validate`].
///
/// Slot indices are computed as `u32` values masked by `size - 1`.
pub const MAX_FILTER_SIZE_LIMIT: usize = 1 << 31;

/// Configuration options for building a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Maximum number of slots a filter may be built with.
    /// Must be a power of two.
    /// Default: 2^30
    pub max_size: usize,

    /// How the identifier digest is reduced to a slot index.
    /// Default: IndexStrategy::Legacy
    pub index_strategy: IndexStrategy,

    /// What `forget` checks before clearing a slot.
    /// Default: ForgetPolicy::Snapshot
    pub forget_policy: ForgetPolicy,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_FILTER_SIZE,
            index_strategy: IndexStrategy::default(),
            forget_policy: ForgetPolicy::default(),
        }
    }
}

/// Reduction from a 128-bit MD5 digest to a 32-bit slot hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexStrategy {
    /// Shift-add over the first three digest bytes.
    ///
    /// Bit-for-bit compatible with existing deployments, but only produces
    /// values up to 18615, so slots beyond that are never used.
    #[default]
    Legacy,

    /// XOR of the four little-endian 32-bit words of the digest.
    Folded,
}

/// Behavior of `forget` when the slot holds something other than the
/// requested identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForgetPolicy {
    /// Clear whatever the slot held when it was read, provided it is
    /// unchanged at the moment of the swap. May clear a colliding identifier.
    #[default]
    Snapshot,

    /// Only clear the slot if the value read byte-equals the requested
    /// identifier.
    MatchIdentifier,
}

impl Options {
    /// Creates a new Options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of slots.
    pub fn max_size(mut self, value: usize) -> Self {
        self.max_size = value;
        self
    }

    /// Sets the index reduction strategy.
    pub fn index_strategy(mut self, value: IndexStrategy) -> Self {
        self.index_strategy = value;
        self
    }

    /// Sets the forget policy.
    pub fn forget_policy(mut self, value: ForgetPolicy) -> Self {
        self.forget_policy = value;
        self
    }

    /// Validates the options.
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(Error::invalid_argument("max_size must be greater than 0"));
        }

        if !self.max_size.is_power_of_two() {
            return Err(Error::invalid_argument(format!(
                "max_size must be a power of two, got {}",
                self.max_size
            )));
        }

        if self.max_size > MAX_FILTER_SIZE_LIMIT {
            return Err(Error::invalid_argument(format!(
                "max_size must not exceed {}, got {}",
                MAX_FILTER_SIZE_LIMIT, self.max_size
            )));
        }

        Ok(())
    }
}
