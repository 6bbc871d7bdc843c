//! # oppobloom - A Lock-Free Filter With No False Positives
//!
//! oppobloom is the opposite of a Bloom filter: it may report an identifier
//! as *not seen* even though it was inserted, but it never reports an
//! identifier as seen when it was not. That trade makes it a good fit for
//! deduplication and request gating under heavy concurrency, where a rare
//! repeat is acceptable but dropping a fresh request is not.
//!
//! ## Architecture
//!
//! - **Indexer**: MD5 digest of the identifier, reduced to 32 bits and masked
//!   into the table
//! - **Slot table**: a fixed, power-of-two array of atomically swappable
//!   slots, one identifier per slot
//!
//! Every operation touches exactly one slot with a single atomic
//! read-modify-write. There are no locks.
//!
//! ## Example Usage
//!
//! ```rust
//! use oppobloom::{OppoFilter, Options, IndexStrategy};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), oppobloom::Error> {
//! let options = Options::new().index_strategy(IndexStrategy::Folded);
//! let filter = Arc::new(OppoFilter::with_options(1 << 16, options)?);
//!
//! if !filter.contains(b"msg-42") {
//!     // first delivery, process it
//! }
//! assert!(filter.contains(b"msg-42"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod filter;

pub use config::{ForgetPolicy, IndexStrategy, Options, DEFAULT_MAX_FILTER_SIZE};
pub use error::{Error, Result};
pub use filter::{Indexer, OppoFilter, Slot};
