//! Arena providers for the mergealloc free-list allocator.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! capability the allocator consumes (a fixed, contiguous byte region with
//! a stable start address and length) and the two standard ways of
//! supplying one:
//!
//! - [`FixedArena`]: an in-object `[u8; N]` buffer, sized at compile time.
//! - [`HeapArena`]: a heap-backed `Box<[u8]>`, sized at runtime from an
//!   [`ArenaConfig`].
//!
//! Providers own their bytes. The allocator only borrows them and never
//! grows, shrinks, or frees the region.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod fixed;
pub mod heap;
pub mod provider;

pub use config::ArenaConfig;
pub use error::ArenaConfigError;
pub use fixed::FixedArena;
pub use heap::HeapArena;
pub use provider::ArenaProvider;
