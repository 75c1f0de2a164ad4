//! depprof runtime support.
//!
//! Three concerns live here, mirroring the runtime library of the original
//! system:
//! - A C-callable ABI for filters implemented out-of-line rather than
//!   inlined by a code generator ([`abi`])
//! - Profile persistence: the store trait, the file-based fallback, and the
//!   in-memory store ([`store`])
//! - The profile context carrying application identity, reference-id
//!   allocation, and the chosen store through the instrumentation pipeline
//!   ([`context`])

pub mod abi;
pub mod context;
pub mod store;

pub use context::{ProfileContext, RefIdAllocator};
pub use store::{FileStore, MemoryStore, ProfileRecord, ProfileStore, StoreError, StoreKey};
