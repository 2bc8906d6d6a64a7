//! Best-fit free-list allocator with neighbour coalescing.
//!
//! [`MergeAllocator`] partitions a borrowed arena into allocated and free
//! ranges. Free ranges form a singly linked list, ordered by address, whose
//! headers are stored in the free bytes themselves (see [`crate::header`]).
//! Apart from the list head the allocator keeps no state of its own, and it
//! keeps no record of allocated ranges: callers hand back the size they
//! requested when they deallocate.
//!
//! # Allocation
//!
//! One pass over the list picks the smallest block that still fits the
//! padded request, lowest address first on ties. The block is either
//! consumed whole (when the leftover could not hold a header) or split,
//! with a new header written just past the allocated prefix.
//!
//! # Deallocation
//!
//! The freed range is linked in front of its right neighbour and merged
//! with it and with its left neighbour when they touch. Gaps smaller than a
//! header are slack left behind by whole-block consumption; they count as
//! touching and are absorbed. Every call therefore leaves the list fully
//! coalesced.

use log::{debug, trace};
use mergealloc_core::ArenaProvider;

use crate::error::AllocError;
use crate::header::{padded_size, Header, HEADER_SIZE};

/// Free-list allocator over a borrowed arena.
///
/// Addresses handed out are absolute: `arena.begin()` plus an offset into
/// the region. The allocator is single-threaded; wrap it in a lock if it
/// has to be shared.
pub struct MergeAllocator<'a, A: ArenaProvider + ?Sized> {
    arena: &'a mut A,
    /// Start address reported by the arena at construction.
    base: usize,
    /// Length of the managed region.
    len: usize,
    /// Offset of the first free block.
    head: Option<usize>,
}

/// Best-fit candidate found during the allocation scan.
#[derive(Clone, Copy)]
struct Candidate {
    offset: usize,
    prev: Option<usize>,
    header: Header,
}

impl<'a, A: ArenaProvider + ?Sized> MergeAllocator<'a, A> {
    /// Bind an allocator to `arena`, with the whole region free.
    ///
    /// # Panics
    ///
    /// Panics if the arena is smaller than [`HEADER_SIZE`]. This is a
    /// caller bug, not a recoverable condition.
    pub fn new(arena: &'a mut A) -> Self {
        match Self::try_new(arena) {
            Ok(allocator) => allocator,
            Err(err) => panic!("cannot build allocator: {err}"),
        }
    }

    /// Like [`MergeAllocator::new`], returning
    /// [`AllocError::ArenaTooSmall`] instead of panicking.
    pub fn try_new(arena: &'a mut A) -> Result<Self, AllocError> {
        let len = arena.size();
        if len < HEADER_SIZE {
            return Err(AllocError::ArenaTooSmall {
                size: len,
                required: HEADER_SIZE,
            });
        }
        assert!(
            len <= arena.as_bytes().len(),
            "arena reports {len} bytes but exposes only {}",
            arena.as_bytes().len()
        );
        let base = arena.begin();

        let mut allocator = Self {
            arena,
            base,
            len,
            head: None,
        };
        allocator.reset();
        debug!("allocator bound to arena {base:#x} ({len} bytes)");
        Ok(allocator)
    }

    /// Allocate `size` bytes.
    ///
    /// The request is rounded up to a multiple of [`HEADER_SIZE`]; the
    /// returned range `[addr, addr + padded_size(size))` belongs to the
    /// caller until it is passed back to [`deallocate`](Self::deallocate)
    /// with the same `size`.
    pub fn allocate(&mut self, size: usize) -> Result<usize, AllocError> {
        if size == 0 {
            return Err(AllocError::ZeroSize);
        }
        let Some(padded) = padded_size(size) else {
            debug!("allocate({size}): request overflows padding");
            return Err(AllocError::OutOfMemory {
                requested: size,
                largest_free: self.largest_free_block(),
            });
        };

        let mut best: Option<Candidate> = None;
        let mut largest = 0;
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(offset) = cursor {
            let header = self.header(offset);
            largest = largest.max(header.size);
            if header.size >= padded && best.is_none_or(|b| header.size < b.header.size) {
                best = Some(Candidate {
                    offset,
                    prev,
                    header,
                });
                // Nothing can beat an exact fit, and ties go to the lower address.
                if header.size == padded {
                    break;
                }
            }
            prev = Some(offset);
            cursor = header.next;
        }

        let Some(best) = best else {
            debug!("allocate({size}): out of memory (padded {padded}, largest free {largest})");
            return Err(AllocError::OutOfMemory {
                requested: padded,
                largest_free: largest,
            });
        };

        let remainder = best.header.size - padded;
        let successor = if remainder < HEADER_SIZE {
            trace!(
                "allocate({size}): consumed block {:#x} ({} bytes)",
                self.base + best.offset,
                best.header.size
            );
            best.header.next
        } else {
            let split = best.offset + padded;
            self.write_header(
                split,
                Header {
                    size: remainder,
                    next: best.header.next,
                },
            );
            trace!(
                "allocate({size}): split block {:#x}, {remainder} bytes left at {:#x}",
                self.base + best.offset,
                self.base + split
            );
            Some(split)
        };
        self.relink(best.prev, successor);

        Ok(self.base + best.offset)
    }

    /// Return a range obtained from [`allocate`](Self::allocate).
    ///
    /// `addr` and `size` must be exactly the address returned and the size
    /// requested. Mismatched sizes, foreign addresses, and double frees are
    /// not detected and corrupt the free list (see
    /// [`check_invariants`](Self::check_invariants)). A `size` of zero is
    /// ignored, since no allocation can have produced it.
    pub fn deallocate(&mut self, addr: usize, size: usize) {
        if size == 0 {
            return;
        }
        debug_assert!(
            addr >= self.base && addr - self.base < self.len,
            "address {addr:#x} outside arena {:#x}..{:#x}",
            self.base,
            self.base + self.len
        );
        let Some(padded) = padded_size(size) else {
            return;
        };
        let offset = addr - self.base;
        let end = offset + padded;
        debug_assert!(end <= self.len, "freed range runs past arena end");

        // First free block at or beyond the end of the freed range.
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(node) = cursor {
            if node >= end {
                break;
            }
            prev = Some(node);
            cursor = self.header(node).next;
        }

        match cursor {
            Some(right) => {
                self.insert_before(offset, padded, right);
                self.relink(prev, Some(offset));
                if let Some(left) = prev {
                    self.absorb_follower(left);
                }
            }
            None => self.append_tail(prev, offset, padded),
        }
    }

    /// Forget every allocation and make the whole arena one free block.
    pub fn reset(&mut self) {
        self.write_header(
            0,
            Header {
                size: self.len,
                next: None,
            },
        );
        self.head = Some(0);
        debug!("allocator reset: {} bytes free", self.len);
    }

    /// Start address of the managed region.
    pub fn arena_begin(&self) -> usize {
        self.base
    }

    /// Length of the managed region in bytes.
    pub fn arena_size(&self) -> usize {
        self.len
    }

    /// Read access to `len` bytes at `addr`.
    ///
    /// Returns `None` if the range is not inside the arena. Nothing checks
    /// that the range is actually allocated.
    pub fn bytes(&self, addr: usize, len: usize) -> Option<&[u8]> {
        let start = addr.checked_sub(self.base)?;
        let end = start.checked_add(len)?;
        self.region().get(start..end)
    }

    /// Write access to `len` bytes at `addr`.
    ///
    /// Returns `None` if the range is not inside the arena. Writing over a
    /// free block's header corrupts the free list.
    pub fn bytes_mut(&mut self, addr: usize, len: usize) -> Option<&mut [u8]> {
        let start = addr.checked_sub(self.base)?;
        let end = start.checked_add(len)?;
        self.region_mut().get_mut(start..end)
    }

    pub(crate) fn head(&self) -> Option<usize> {
        self.head
    }

    pub(crate) fn region(&self) -> &[u8] {
        &self.arena.as_bytes()[..self.len]
    }

    fn region_mut(&mut self) -> &mut [u8] {
        let len = self.len;
        &mut self.arena.as_bytes_mut()[..len]
    }

    pub(crate) fn header(&self, offset: usize) -> Header {
        Header::read(self.region(), offset)
    }

    fn write_header(&mut self, offset: usize, header: Header) {
        header.write(self.region_mut(), offset);
    }

    /// Point `prev` (or the head when there is none) at `target`.
    fn relink(&mut self, prev: Option<usize>, target: Option<usize>) {
        match prev {
            Some(prev) => {
                let mut header = self.header(prev);
                header.next = target;
                self.write_header(prev, header);
            }
            None => self.head = target,
        }
    }

    /// Write a free block at `offset` that precedes `right`, swallowing
    /// `right` if the two touch.
    fn insert_before(&mut self, offset: usize, size: usize, right: usize) {
        let end = offset + size;
        debug_assert!(end <= right, "freed range overlaps free block");
        let gap = right - end;
        let right_header = self.header(right);
        let header = if gap < HEADER_SIZE {
            trace!(
                "deallocate: {:#x} merged with right neighbour {:#x}",
                self.base + offset,
                self.base + right
            );
            Header {
                size: size + gap + right_header.size,
                next: right_header.next,
            }
        } else {
            Header {
                size,
                next: Some(right),
            }
        };
        self.write_header(offset, header);
    }

    /// Fold the block after `left` into `left` if the two touch.
    fn absorb_follower(&mut self, left: usize) {
        let mut header = self.header(left);
        let Some(follower) = header.next else {
            return;
        };
        let end = header.end(left);
        debug_assert!(end <= follower, "free blocks overlap");
        let gap = follower - end;
        if gap < HEADER_SIZE {
            let follower_header = self.header(follower);
            header.size += gap + follower_header.size;
            header.next = follower_header.next;
            self.write_header(left, header);
            trace!(
                "deallocate: {:#x} merged into left neighbour {:#x}",
                self.base + follower,
                self.base + left
            );
        }
    }

    /// Link a freed range that lies past every free block.
    ///
    /// Slack between the range and the arena end, too short for a header,
    /// is absorbed as well.
    fn append_tail(&mut self, tail: Option<usize>, offset: usize, size: usize) {
        let slack = self.len - (offset + size);
        let size = if slack < HEADER_SIZE { size + slack } else { size };

        let Some(tail) = tail else {
            self.write_header(offset, Header { size, next: None });
            self.head = Some(offset);
            trace!("deallocate: {:#x} is the only free block", self.base + offset);
            return;
        };

        let mut header = self.header(tail);
        let tail_end = header.end(tail);
        debug_assert!(tail_end <= offset, "freed range overlaps free block");
        let gap = offset - tail_end;
        if gap < HEADER_SIZE {
            header.size += gap + size;
            trace!(
                "deallocate: {:#x} merged into tail {:#x}",
                self.base + offset,
                self.base + tail
            );
        } else {
            self.write_header(offset, Header { size, next: None });
            header.next = Some(offset);
            trace!("deallocate: {:#x} appended as new tail", self.base + offset);
        }
        self.write_header(tail, header);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mergealloc_core::{FixedArena, HeapArena};

    fn blocks<A: ArenaProvider + ?Sized>(alloc: &MergeAllocator<'_, A>) -> Vec<(usize, usize)> {
        let base = alloc.arena_begin();
        alloc
            .free_blocks()
            .map(|b| (b.addr - base, b.size))
            .collect()
    }

    #[test]
    fn new_makes_one_block_spanning_arena() {
        let mut arena = HeapArena::new(256);
        let alloc = MergeAllocator::new(&mut arena);
        assert_eq!(blocks(&alloc), vec![(0, 256)]);
    }

    #[test]
    fn try_new_rejects_arena_below_header() {
        let mut arena = FixedArena::<8>::new();
        let err = MergeAllocator::try_new(&mut arena).err();
        assert_eq!(
            err,
            Some(AllocError::ArenaTooSmall {
                size: 8,
                required: HEADER_SIZE
            })
        );
    }

    #[test]
    #[should_panic(expected = "arena too small")]
    fn new_panics_on_arena_below_header() {
        let mut arena = FixedArena::<15>::new();
        let _ = MergeAllocator::new(&mut arena);
    }

    #[test]
    fn arena_of_exactly_one_header_is_accepted() {
        let mut arena = FixedArena::<16>::new();
        let mut alloc = MergeAllocator::new(&mut arena);
        let begin = alloc.arena_begin();
        assert_eq!(alloc.allocate(16), Ok(begin));
        assert!(alloc.allocate(1).is_err());
    }

    #[test]
    fn sixteen_byte_arena_scenario() {
        let mut arena = FixedArena::<16>::new();
        let begin = arena.begin();
        let mut alloc = MergeAllocator::new(&mut arena);

        let ptr = alloc.allocate(1).unwrap();
        assert_eq!(ptr, begin);

        alloc.deallocate(ptr, 1);
        let ptr1 = alloc.allocate(10).unwrap();
        assert_eq!(ptr1, begin);

        assert!(matches!(
            alloc.allocate(1),
            Err(AllocError::OutOfMemory { .. })
        ));
    }

    #[test]
    fn zero_size_request_is_rejected() {
        let mut arena = HeapArena::new(64);
        let mut alloc = MergeAllocator::new(&mut arena);
        assert_eq!(alloc.allocate(0), Err(AllocError::ZeroSize));
        assert_eq!(blocks(&alloc), vec![(0, 64)]);
    }

    #[test]
    fn huge_request_reports_out_of_memory() {
        let mut arena = HeapArena::new(64);
        let mut alloc = MergeAllocator::new(&mut arena);
        assert_eq!(
            alloc.allocate(usize::MAX),
            Err(AllocError::OutOfMemory {
                requested: usize::MAX,
                largest_free: 64
            })
        );
    }

    #[test]
    fn allocation_splits_block_at_padded_size() {
        let mut arena = HeapArena::new(128);
        let mut alloc = MergeAllocator::new(&mut arena);
        let begin = alloc.arena_begin();

        assert_eq!(alloc.allocate(20), Ok(begin));
        assert_eq!(blocks(&alloc), vec![(32, 96)]);
        assert_eq!(alloc.allocate(1), Ok(begin + 32));
        assert_eq!(blocks(&alloc), vec![(48, 80)]);
    }

    #[test]
    fn remainder_below_header_consumes_whole_block() {
        let mut arena = HeapArena::new(40);
        let mut alloc = MergeAllocator::new(&mut arena);
        let begin = alloc.arena_begin();

        assert_eq!(alloc.allocate(16), Ok(begin));
        assert_eq!(blocks(&alloc), vec![(16, 24)]);
        // 24 - 16 = 8 left over: too small to track, so all 24 go.
        assert_eq!(alloc.allocate(16), Ok(begin + 16));
        assert!(alloc.free_blocks().next().is_none());
    }

    #[test]
    fn best_fit_prefers_smallest_sufficient_block() {
        let mut arena = HeapArena::new(512);
        let mut alloc = MergeAllocator::new(&mut arena);

        // Carve holes of 64, 32 and 48 bytes separated by live blocks.
        let a = alloc.allocate(64).unwrap();
        let _ = alloc.allocate(16).unwrap();
        let b = alloc.allocate(32).unwrap();
        let _ = alloc.allocate(16).unwrap();
        let c = alloc.allocate(48).unwrap();
        let _ = alloc.allocate(16).unwrap();
        alloc.deallocate(a, 64);
        alloc.deallocate(b, 32);
        alloc.deallocate(c, 48);

        assert_eq!(alloc.allocate(30), Ok(b));
        assert_eq!(alloc.allocate(40), Ok(c));
        assert_eq!(alloc.allocate(50), Ok(a));
    }

    #[test]
    fn equal_sizes_tie_break_to_lowest_address() {
        let mut arena = HeapArena::new(256);
        let mut alloc = MergeAllocator::new(&mut arena);

        let a = alloc.allocate(32).unwrap();
        let _ = alloc.allocate(16).unwrap();
        let b = alloc.allocate(32).unwrap();
        let _ = alloc.allocate(16).unwrap();
        alloc.deallocate(b, 32);
        alloc.deallocate(a, 32);

        assert_eq!(alloc.allocate(20), Ok(a));
        assert_eq!(alloc.allocate(20), Ok(b));
    }

    #[test]
    fn failed_allocation_leaves_list_untouched() {
        let mut arena = HeapArena::new(128);
        let mut alloc = MergeAllocator::new(&mut arena);
        let _ = alloc.allocate(100).unwrap();
        let before = blocks(&alloc);

        assert_eq!(
            alloc.allocate(32),
            Err(AllocError::OutOfMemory {
                requested: 32,
                largest_free: 16
            })
        );
        assert_eq!(blocks(&alloc), before);
    }

    #[test]
    fn freeing_into_empty_list_becomes_head() {
        let mut arena = HeapArena::new(64);
        let mut alloc = MergeAllocator::new(&mut arena);
        let a = alloc.allocate(32).unwrap();
        let b = alloc.allocate(32).unwrap();
        assert!(alloc.free_blocks().next().is_none());

        alloc.deallocate(a, 32);
        assert_eq!(blocks(&alloc), vec![(0, 32)]);
        alloc.deallocate(b, 32);
        assert_eq!(blocks(&alloc), vec![(0, 64)]);
    }

    #[test]
    fn tail_slack_is_reclaimed() {
        let mut arena = HeapArena::new(40);
        let mut alloc = MergeAllocator::new(&mut arena);
        let a = alloc.allocate(16).unwrap();
        let b = alloc.allocate(16).unwrap();

        alloc.deallocate(b, 16);
        assert_eq!(blocks(&alloc), vec![(16, 24)]);
        alloc.deallocate(a, 16);
        assert_eq!(blocks(&alloc), vec![(0, 40)]);
    }

    #[test]
    fn zero_size_deallocate_is_ignored() {
        let mut arena = HeapArena::new(64);
        let mut alloc = MergeAllocator::new(&mut arena);
        let a = alloc.allocate(16).unwrap();
        alloc.deallocate(a, 0);
        assert_eq!(blocks(&alloc), vec![(16, 48)]);
    }

    #[test]
    fn reset_restores_initial_block() {
        let mut arena = HeapArena::new(96);
        let mut alloc = MergeAllocator::new(&mut arena);
        let _ = alloc.allocate(16).unwrap();
        let _ = alloc.allocate(48).unwrap();
        alloc.reset();
        assert_eq!(blocks(&alloc), vec![(0, 96)]);
    }

    #[test]
    fn client_bytes_are_writable_and_bounded() {
        let mut arena = HeapArena::new(64);
        let mut alloc = MergeAllocator::new(&mut arena);
        let a = alloc.allocate(8).unwrap();

        alloc.bytes_mut(a, 8).unwrap().copy_from_slice(b"mergeabc");
        assert_eq!(alloc.bytes(a, 8), Some(&b"mergeabc"[..]));
        assert!(alloc.bytes(a, 65).is_none());
        assert!(alloc.bytes(a.wrapping_sub(1), 1).is_none());
    }

    #[test]
    fn allocator_can_borrow_trait_object() {
        let mut arena = HeapArena::new(64);
        let dynamic: &mut dyn ArenaProvider = &mut arena;
        let mut alloc = MergeAllocator::new(dynamic);
        assert!(alloc.allocate(48).is_ok());
    }
}
