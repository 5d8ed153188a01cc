//! Invalidation cache: a pluggable key/value backend plus the
//! last-modified timestamp protocol built on top of it.

pub mod backend;
pub mod last_modified;

pub use backend::{InMemoryCache, KeyValueCache};
pub use last_modified::LastModifiedCache;
