//! Occupancy statistics.

use std::fmt;

use mergealloc_core::ArenaProvider;

use crate::allocator::MergeAllocator;

/// Point-in-time occupancy of an arena.
///
/// Computed by walking the free list; allocated bytes are whatever the free
/// list does not cover, padding and untracked slack included.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Length of the managed region.
    pub arena_size: usize,
    /// Bytes covered by free blocks.
    pub free_bytes: usize,
    /// Number of free blocks.
    pub free_blocks: usize,
    /// Size of the largest free block.
    pub largest_free: usize,
}

impl AllocatorStats {
    /// Bytes not covered by any free block.
    pub fn used_bytes(&self) -> usize {
        self.arena_size - self.free_bytes
    }

    /// Share of free memory outside the largest free block, in `[0, 1)`.
    ///
    /// 0 means all free memory is one block (or nothing is free).
    pub fn fragmentation(&self) -> f64 {
        if self.free_bytes == 0 {
            return 0.0;
        }
        1.0 - self.largest_free as f64 / self.free_bytes as f64
    }
}

impl fmt::Display for AllocatorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} bytes used, {} free block(s), largest {} bytes, fragmentation {:.1}%",
            self.used_bytes(),
            self.arena_size,
            self.free_blocks,
            self.largest_free,
            self.fragmentation() * 100.0
        )
    }
}

impl<A: ArenaProvider + ?Sized> MergeAllocator<'_, A> {
    /// Collect occupancy statistics in one pass over the free list.
    pub fn stats(&self) -> AllocatorStats {
        self.free_blocks().fold(
            AllocatorStats {
                arena_size: self.arena_size(),
                ..AllocatorStats::default()
            },
            |mut stats, block| {
                stats.free_bytes += block.size;
                stats.free_blocks += 1;
                stats.largest_free = stats.largest_free.max(block.size);
                stats
            },
        )
    }
}
