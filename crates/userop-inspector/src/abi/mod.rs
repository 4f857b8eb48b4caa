//! Contract ABI resolution.
//!
//! Addresses resolve through a fixed chain of sources: the [`StaticRegistry`]
//! bundled with the crate, a durable [`AbiCache`] with a 24 hour freshness
//! window, and finally a remote [`AbiLookup`] whose results are written back
//! into the cache.

mod cache;
mod lookup;
mod registry;
mod resolver;

pub use cache::{
    ABI_CACHE_TTL, AbiCache, CacheError, CacheLookup, CachedAbi, FileStore, KeyValueStore,
    MemoryStore, cache_key,
};
pub use lookup::{AbiLookup, DEFAULT_LOOKUP_URL, LookupError, SourcifyClient};
pub use registry::StaticRegistry;
pub use resolver::{AbiResolver, AbiSource, ResolvedAbi};
