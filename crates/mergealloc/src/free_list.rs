//! Read-only views of the free list.
//!
//! Walking the list never mutates it. [`FreeBlocks`] yields blocks in
//! address order; [`MergeAllocator::check_invariants`] verifies the
//! ordering and coalescing guarantees every operation is meant to keep.

use std::fmt;
use std::iter::FusedIterator;

use mergealloc_core::ArenaProvider;
use smallvec::SmallVec;

use crate::allocator::MergeAllocator;
use crate::error::InvariantViolation;
use crate::header::{Header, HEADER_SIZE};

/// One free block, as seen from outside the allocator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FreeBlock {
    /// Absolute start address.
    pub addr: usize,
    /// Length in bytes, header included.
    pub size: usize,
}

impl FreeBlock {
    /// Address one past the block's last byte.
    pub fn end(&self) -> usize {
        self.addr + self.size
    }

    /// Whether `addr` falls inside this block.
    pub fn contains(&self, addr: usize) -> bool {
        (self.addr..self.end()).contains(&addr)
    }
}

/// Owned copy of the free list at one point in time.
///
/// Small lists (the common case after coalescing) stay inline.
pub type FreeListSnapshot = SmallVec<[FreeBlock; 8]>;

/// Iterator over the free list in address order.
///
/// Created by [`MergeAllocator::free_blocks`]. The walk is capped at the
/// number of headers the arena could possibly hold, so a corrupted
/// (cyclic) list still terminates.
pub struct FreeBlocks<'b> {
    region: &'b [u8],
    base: usize,
    cursor: Option<usize>,
    budget: usize,
}

impl Iterator for FreeBlocks<'_> {
    type Item = FreeBlock;

    fn next(&mut self) -> Option<FreeBlock> {
        let offset = self.cursor?;
        if self.budget == 0 || offset + HEADER_SIZE > self.region.len() {
            self.cursor = None;
            return None;
        }
        self.budget -= 1;
        let header = Header::read(self.region, offset);
        self.cursor = header.next;
        Some(FreeBlock {
            addr: self.base + offset,
            size: header.size,
        })
    }
}

impl FusedIterator for FreeBlocks<'_> {}

impl<A: ArenaProvider + ?Sized> MergeAllocator<'_, A> {
    /// Iterate over the free blocks in ascending address order.
    pub fn free_blocks(&self) -> FreeBlocks<'_> {
        let region = self.region();
        FreeBlocks {
            region,
            base: self.arena_begin(),
            cursor: self.head(),
            budget: region.len() / HEADER_SIZE,
        }
    }

    /// Copy the current free list.
    pub fn snapshot(&self) -> FreeListSnapshot {
        self.free_blocks().collect()
    }

    /// Total bytes held by free blocks.
    pub fn free_bytes(&self) -> usize {
        self.free_blocks().map(|b| b.size).sum()
    }

    /// Number of free blocks.
    pub fn free_block_count(&self) -> usize {
        self.free_blocks().count()
    }

    /// Size of the largest free block, or 0 when the arena is exhausted.
    ///
    /// This is an upper bound on the padded size the next
    /// [`allocate`](MergeAllocator::allocate) can satisfy.
    pub fn largest_free_block(&self) -> usize {
        self.free_blocks().map(|b| b.size).max().unwrap_or(0)
    }

    /// Verify the free-list invariants.
    ///
    /// Every block lies inside the arena and can hold a header, addresses
    /// strictly increase, and consecutive blocks are at least one header
    /// apart (anything closer would have been merged). Stops at the first
    /// violation, which also bounds the walk on cyclic lists.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let base = self.arena_begin();
        let len = self.arena_size();
        let arena_end = base + len;

        let mut prev: Option<FreeBlock> = None;
        let mut cursor = self.head();
        while let Some(offset) = cursor {
            if offset.checked_add(HEADER_SIZE).is_none_or(|end| end > len) {
                return Err(InvariantViolation::OutOfBounds {
                    addr: base.wrapping_add(offset),
                    size: HEADER_SIZE,
                    arena_end,
                });
            }
            let header = self.header(offset);
            let block = FreeBlock {
                addr: base + offset,
                size: header.size,
            };

            if let Some(prev) = prev {
                if block.addr <= prev.addr {
                    return Err(InvariantViolation::Unordered {
                        prev: prev.addr,
                        next: block.addr,
                    });
                }
                if block.addr < prev.end() {
                    return Err(InvariantViolation::Overlap {
                        left: prev.addr,
                        right: block.addr,
                    });
                }
                if block.addr - prev.end() < HEADER_SIZE {
                    return Err(InvariantViolation::Uncoalesced {
                        left: prev.addr,
                        right: block.addr,
                    });
                }
            }
            if header.size < HEADER_SIZE {
                return Err(InvariantViolation::Undersized {
                    addr: block.addr,
                    size: block.size,
                });
            }
            if header.size > len - offset {
                return Err(InvariantViolation::OutOfBounds {
                    addr: block.addr,
                    size: block.size,
                    arena_end,
                });
            }

            prev = Some(block);
            cursor = header.next;
        }
        Ok(())
    }
}

impl<A: ArenaProvider + ?Sized> fmt::Display for MergeAllocator<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        writeln!(
            f,
            "free list: {} block(s), {} of {} bytes free",
            stats.free_blocks, stats.free_bytes, stats.arena_size
        )?;
        for block in self.free_blocks() {
            writeln!(
                f,
                "  [{:#x}, {:#x})  {} bytes",
                block.addr,
                block.end(),
                block.size
            )?;
        }
        Ok(())
    }
}
