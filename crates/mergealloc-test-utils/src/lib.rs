//! Test utilities for mergealloc development.
//!
//! The allocator itself keeps no record of live allocations. For tests,
//! [`ShadowAllocator`] wraps a [`MergeAllocator`] with a side table of live
//! ranges and checks after every operation that:
//!
//! - each new range lies inside the arena and overlaps neither a live range
//!   nor a free block,
//! - the free list passes [`MergeAllocator::check_invariants`],
//! - free bytes plus live (padded) bytes never exceed the arena, and
//! - with nothing live, the free list is one block spanning the arena.
//!
//! The side table sits outside the arena and outside the allocator, so it
//! changes nothing about the allocator's own footprint.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use indexmap::IndexMap;
use mergealloc::{padded_size, AllocError, ArenaProvider, FreeBlock, MergeAllocator};

/// A live allocation recorded by [`ShadowAllocator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiveRange {
    pub addr: usize,
    /// Size passed to `allocate`, to be passed back to `deallocate`.
    pub requested: usize,
    /// Bytes actually owned by the caller.
    pub padded: usize,
}

impl LiveRange {
    pub fn end(&self) -> usize {
        self.addr + self.padded
    }

    fn overlaps(&self, addr: usize, end: usize) -> bool {
        self.addr < end && addr < self.end()
    }
}

/// [`MergeAllocator`] plus a shadow table of live ranges.
///
/// Panics (test failure) as soon as the allocator hands out an invalid
/// range or leaves the free list inconsistent.
pub struct ShadowAllocator<'a, A: ArenaProvider + ?Sized> {
    inner: MergeAllocator<'a, A>,
    /// Live ranges keyed by address, in allocation order.
    live: IndexMap<usize, LiveRange>,
}

impl<'a, A: ArenaProvider + ?Sized> ShadowAllocator<'a, A> {
    pub fn new(arena: &'a mut A) -> Self {
        let shadow = Self {
            inner: MergeAllocator::new(arena),
            live: IndexMap::new(),
        };
        shadow.verify();
        shadow
    }

    /// Allocate through the inner allocator and record the range.
    pub fn allocate(&mut self, size: usize) -> Result<usize, AllocError> {
        let before = self.inner.snapshot();
        let result = self.inner.allocate(size);
        match result {
            Ok(addr) => {
                let padded = padded_size(size).expect("successful allocation has a padded size");
                let range = LiveRange {
                    addr,
                    requested: size,
                    padded,
                };
                self.assert_fresh(range);
                self.live.insert(addr, range);
            }
            Err(_) => {
                assert_eq!(
                    self.inner.snapshot(),
                    before,
                    "failed allocate({size}) mutated the free list"
                );
            }
        }
        self.verify();
        result
    }

    /// Free the live range starting at `addr`.
    ///
    /// Panics if `addr` is not live, which catches double frees in test
    /// drivers before they reach the allocator.
    pub fn deallocate(&mut self, addr: usize) -> LiveRange {
        let range = self
            .live
            .shift_remove(&addr)
            .unwrap_or_else(|| panic!("deallocate({addr:#x}): not a live allocation"));
        self.inner.deallocate(range.addr, range.requested);
        self.verify();
        range
    }

    /// Free the `index`-th live range (allocation order, perturbed by
    /// earlier removals). Handy for randomized drivers.
    pub fn deallocate_index(&mut self, index: usize) -> LiveRange {
        let (_, range) = self
            .live
            .swap_remove_index(index)
            .unwrap_or_else(|| panic!("no live allocation at index {index}"));
        self.inner.deallocate(range.addr, range.requested);
        self.verify();
        range
    }

    /// Free every live range, oldest first.
    pub fn deallocate_all(&mut self) {
        while let Some((_, range)) = self.live.shift_remove_index(0) {
            self.inner.deallocate(range.addr, range.requested);
            self.verify();
        }
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn live_ranges(&self) -> impl Iterator<Item = &LiveRange> {
        self.live.values()
    }

    /// Sum of padded sizes of live ranges.
    pub fn live_bytes(&self) -> usize {
        self.live.values().map(|r| r.padded).sum()
    }

    pub fn inner(&self) -> &MergeAllocator<'a, A> {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut MergeAllocator<'a, A> {
        &mut self.inner
    }

    /// Check the free list and the free/live accounting.
    pub fn verify(&self) {
        if let Err(violation) = self.inner.check_invariants() {
            panic!("free list invariant broken: {violation}\n{}", self.inner);
        }

        let free = self.inner.free_bytes();
        let live = self.live_bytes();
        let arena = self.inner.arena_size();
        assert!(
            free + live <= arena,
            "free ({free}) + live ({live}) bytes exceed arena ({arena})"
        );

        if self.live.is_empty() {
            let whole = FreeBlock {
                addr: self.inner.arena_begin(),
                size: arena,
            };
            assert_eq!(
                self.inner.snapshot().as_slice(),
                &[whole],
                "nothing live but arena not fully coalesced"
            );
        }
    }

    fn assert_fresh(&self, range: LiveRange) {
        let begin = self.inner.arena_begin();
        let arena_end = begin + self.inner.arena_size();
        assert!(
            range.addr >= begin && range.end() <= arena_end,
            "range {:#x}..{:#x} outside arena {begin:#x}..{arena_end:#x}",
            range.addr,
            range.end()
        );
        if let Some(other) = self
            .live
            .values()
            .find(|other| other.overlaps(range.addr, range.end()))
        {
            panic!(
                "range {:#x}..{:#x} overlaps live range {:#x}..{:#x}",
                range.addr,
                range.end(),
                other.addr,
                other.end()
            );
        }
        if let Some(block) = self
            .inner
            .free_blocks()
            .find(|block| range.addr < block.end() && block.addr < range.end())
        {
            panic!(
                "range {:#x}..{:#x} overlaps free block {:#x}..{:#x}",
                range.addr,
                range.end(),
                block.addr,
                block.end()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mergealloc::HeapArena;

    #[test]
    fn records_and_forgets_ranges() {
        let mut arena = HeapArena::new(256);
        let mut shadow = ShadowAllocator::new(&mut arena);
        let a = shadow.allocate(10).unwrap();
        let b = shadow.allocate(40).unwrap();
        assert_eq!(shadow.live_count(), 2);
        assert_eq!(shadow.live_bytes(), 16 + 48);

        let range = shadow.deallocate(a);
        assert_eq!(range.requested, 10);
        assert_eq!(range.padded, 16);
        shadow.deallocate(b);
        assert_eq!(shadow.live_count(), 0);
    }

    #[test]
    #[should_panic(expected = "not a live allocation")]
    fn double_free_is_caught_before_reaching_allocator() {
        let mut arena = HeapArena::new(64);
        let mut shadow = ShadowAllocator::new(&mut arena);
        let a = shadow.allocate(16).unwrap();
        shadow.deallocate(a);
        shadow.deallocate(a);
    }

    #[test]
    fn failed_allocation_is_not_recorded() {
        let mut arena = HeapArena::new(32);
        let mut shadow = ShadowAllocator::new(&mut arena);
        assert!(shadow.allocate(64).is_err());
        assert_eq!(shadow.live_count(), 0);
    }
}
