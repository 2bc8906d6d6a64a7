//! Seeded workloads for benchmarking and examples.
//!
//! - [`WorkloadProfile`]: shape of a random allocate/free sequence
//! - [`generate`]: deterministic op sequence from a profile and a seed
//! - [`replay`]: run a sequence against a [`MergeAllocator`]
//! - [`fragment`]: carve an arena into alternating live and free blocks

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use mergealloc::{ArenaProvider, MergeAllocator};
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// One step of a workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// Allocate this many bytes.
    Alloc(usize),
    /// Free a live allocation, picked by index modulo the live count.
    Free(usize),
}

/// Shape of a generated workload.
#[derive(Clone, Copy, Debug)]
pub struct WorkloadProfile {
    /// Number of ops to generate.
    pub len: usize,
    /// Largest request size; sizes are drawn from `1..=max_size`.
    pub max_size: usize,
    /// Chance out of 100 that an op is an allocation.
    pub alloc_percent: u64,
}

impl WorkloadProfile {
    /// Mixed sizes up to 256 bytes, allocations slightly favoured.
    pub fn churn() -> Self {
        Self {
            len: 10_000,
            max_size: 256,
            alloc_percent: 55,
        }
    }

    /// Many small objects, mostly allocations.
    pub fn small_objects() -> Self {
        Self {
            len: 10_000,
            max_size: 48,
            alloc_percent: 70,
        }
    }
}

/// Generate a deterministic op sequence.
///
/// The same `(profile, seed)` pair always yields the same ops.
pub fn generate(profile: &WorkloadProfile, seed: u64) -> Vec<Op> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..profile.len)
        .map(|_| {
            if rng.next_u64() % 100 < profile.alloc_percent {
                let size = (rng.next_u64() % profile.max_size as u64) as usize + 1;
                Op::Alloc(size)
            } else {
                Op::Free(rng.next_u64() as usize)
            }
        })
        .collect()
}

/// Counters collected by [`replay`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplayOutcome {
    /// Successful allocations.
    pub allocated: usize,
    /// Allocations that ran out of memory.
    pub failed: usize,
    /// Deallocations performed, including the final drain.
    pub freed: usize,
}

/// Run `ops` against `alloc`, then free everything still live.
pub fn replay<A: ArenaProvider + ?Sized>(
    alloc: &mut MergeAllocator<'_, A>,
    ops: &[Op],
) -> ReplayOutcome {
    let mut outcome = ReplayOutcome::default();
    let mut live: Vec<(usize, usize)> = Vec::new();
    for op in ops {
        match *op {
            Op::Alloc(size) => match alloc.allocate(size) {
                Ok(addr) => {
                    live.push((addr, size));
                    outcome.allocated += 1;
                }
                Err(_) => outcome.failed += 1,
            },
            Op::Free(pick) => {
                if !live.is_empty() {
                    let (addr, size) = live.swap_remove(pick % live.len());
                    alloc.deallocate(addr, size);
                    outcome.freed += 1;
                }
            }
        }
    }
    for (addr, size) in live.drain(..) {
        alloc.deallocate(addr, size);
        outcome.freed += 1;
    }
    outcome
}

/// Fill the arena with `hole`-sized blocks and free every other one.
///
/// Leaves a free list of roughly `arena_size / (2 * hole)` equal blocks, the
/// worst case for the best-fit scan when no request fits exactly. Returns
/// the addresses that stay live.
pub fn fragment<A: ArenaProvider + ?Sized>(
    alloc: &mut MergeAllocator<'_, A>,
    hole: usize,
) -> Vec<usize> {
    let mut all = Vec::new();
    while let Ok(addr) = alloc.allocate(hole) {
        all.push(addr);
    }
    let mut kept = Vec::with_capacity(all.len() / 2);
    for (i, addr) in all.into_iter().enumerate() {
        if i % 2 == 0 {
            alloc.deallocate(addr, hole);
        } else {
            kept.push(addr);
        }
    }
    kept
}
