//! Best-fit free-list allocation inside a fixed, borrowed arena.
//!
//! [`MergeAllocator`] hands out byte ranges from a single contiguous region
//! supplied by an [`ArenaProvider`]. It never requests memory of its own:
//! the free list lives inside the free bytes, and its only state outside
//! the arena is the offset of the first free block.
//!
//! ```text
//! arena  ┌──────┬────────────┬──────┬──────────────────────┐
//!        │ used │ free ──────┼─────►│ free (next = none)   │
//!        └──────┴────────────┴──────┴──────────────────────┘
//!                ▲ head        used
//! ```
//!
//! - **Allocate:** one pass, smallest block that fits the request padded to
//!   a multiple of [`HEADER_SIZE`]; split if the rest can hold a header.
//! - **Deallocate:** insert in address order and merge with the left and
//!   right neighbours, so no two free blocks ever touch.
//!
//! Headers are read and written through the arena's byte slice at computed
//! offsets; the crate contains no `unsafe` code.
//!
//! # Example
//!
//! ```
//! use mergealloc::prelude::*;
//!
//! let mut arena = FixedArena::<256>::new();
//! let mut alloc = MergeAllocator::new(&mut arena);
//!
//! let a = alloc.allocate(24).unwrap();
//! let b = alloc.allocate(100).unwrap();
//! alloc.deallocate(a, 24);
//! alloc.deallocate(b, 100);
//!
//! assert_eq!(alloc.free_block_count(), 1);
//! assert_eq!(alloc.free_bytes(), 256);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod allocator;
pub mod error;
pub mod free_list;
pub mod header;
pub mod stats;

pub use allocator::MergeAllocator;
pub use error::{AllocError, InvariantViolation};
pub use free_list::{FreeBlock, FreeBlocks, FreeListSnapshot};
pub use header::{padded_size, HEADER_SIZE};
pub use mergealloc_core::{ArenaConfig, ArenaConfigError, ArenaProvider, FixedArena, HeapArena};
pub use stats::AllocatorStats;

/// Common imports for allocator users.
pub mod prelude {
    pub use crate::{
        AllocError, AllocatorStats, ArenaConfig, ArenaProvider, FixedArena, FreeBlock, HeapArena,
        MergeAllocator, HEADER_SIZE,
    };
}
