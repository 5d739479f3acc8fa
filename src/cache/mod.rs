//! Cache layer.
//!
//! [`CacheStore`] is the contract the coordinator depends on; [`MemoryCache`] is the
//! in-process backend wired by the binary.

mod keys;
mod lock;
mod memory;
mod store;

pub use keys::{Collection, FILTER_NEWSES, FLAG_FRESH, FLAG_STALE, RELOAD_NEWSES};
pub use memory::MemoryCache;
pub use store::{CacheError, CacheStore};
