//! Allocator error types.

use std::error::Error;
use std::fmt;

/// Errors returned by [`MergeAllocator`](crate::MergeAllocator).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// A zero-byte allocation was requested. No zero-length ranges are
    /// ever granted.
    ZeroSize,
    /// No free block is large enough for the padded request. The arena
    /// never grows; the caller may free memory and retry.
    OutOfMemory {
        /// Requested size after padding (or the raw size if padding
        /// overflowed).
        requested: usize,
        /// Size of the largest free block at the time of the request.
        largest_free: usize,
    },
    /// The arena cannot hold even a single free-list header.
    ArenaTooSmall {
        /// Size of the supplied arena in bytes.
        size: usize,
        /// Minimum size required.
        required: usize,
    },
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroSize => write!(f, "zero-size allocation requested"),
            Self::OutOfMemory {
                requested,
                largest_free,
            } => {
                write!(
                    f,
                    "out of memory: requested {requested} bytes, largest free block {largest_free} bytes"
                )
            }
            Self::ArenaTooSmall { size, required } => {
                write!(
                    f,
                    "arena too small: {size} bytes, at least {required} bytes required"
                )
            }
        }
    }
}

impl Error for AllocError {}

/// A broken free-list invariant, reported by
/// [`MergeAllocator::check_invariants`](crate::MergeAllocator::check_invariants).
///
/// Addresses are absolute (arena start included). Any of these means the
/// allocator was misused (double free, wrong size on deallocate) or the
/// arena bytes were overwritten by a client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A block extends outside the arena.
    OutOfBounds {
        /// Block start address.
        addr: usize,
        /// Recorded block size.
        size: usize,
        /// One past the last arena address.
        arena_end: usize,
    },
    /// A block is too small to hold its own header.
    Undersized {
        /// Block start address.
        addr: usize,
        /// Recorded block size.
        size: usize,
    },
    /// Block addresses do not strictly increase (includes cycles).
    Unordered {
        /// Address of the earlier list entry.
        prev: usize,
        /// Address of the entry that follows it.
        next: usize,
    },
    /// Two blocks share bytes.
    Overlap {
        /// Address of the earlier block.
        left: usize,
        /// Address of the later block.
        right: usize,
    },
    /// Two blocks are separated by less than a header and should have
    /// been merged.
    Uncoalesced {
        /// Address of the earlier block.
        left: usize,
        /// Address of the later block.
        right: usize,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds {
                addr,
                size,
                arena_end,
            } => write!(
                f,
                "free block {addr:#x} (+{size}) extends past arena end {arena_end:#x}"
            ),
            Self::Undersized { addr, size } => {
                write!(f, "free block {addr:#x} has size {size}, below one header")
            }
            Self::Unordered { prev, next } => {
                write!(f, "free list not ascending: {prev:#x} -> {next:#x}")
            }
            Self::Overlap { left, right } => {
                write!(f, "free blocks {left:#x} and {right:#x} overlap")
            }
            Self::Uncoalesced { left, right } => {
                write!(f, "free blocks {left:#x} and {right:#x} are adjacent but not merged")
            }
        }
    }
}

impl Error for InvariantViolation {}
