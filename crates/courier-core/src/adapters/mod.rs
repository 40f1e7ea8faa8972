//! # Infrastructure Adapters
//!
//! In-process implementations of the cache, outbound and token interfaces.

pub mod memory_cache;
pub mod memory_outbound;
pub mod memory_tokens;

pub use memory_cache::InMemoryCacheStore;
pub use memory_outbound::{InMemoryOutbound, TracingOutbound};
pub use memory_tokens::InMemoryTokenSource;
