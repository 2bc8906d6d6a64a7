//! Step-by-step allocator walkthrough.
//!
//! Demonstrates: split on allocate → best fit into a hole → merge left,
//! right, and both ways on deallocate, printing the free list after each
//! step. Ends with a seeded churn replay and summary stats.

use mergealloc::prelude::*;
use mergealloc_bench::{generate, replay, WorkloadProfile};

fn show<A: ArenaProvider + ?Sized>(step: &str, alloc: &MergeAllocator<'_, A>) {
    println!("--- {step}");
    println!("{alloc}");
}

fn main() {
    println!("=== mergealloc walkthrough ===\n");

    let mut arena = HeapArena::new(1024);
    let mut alloc = MergeAllocator::new(&mut arena);
    show("fresh arena", &alloc);

    let p1 = alloc.allocate(20).unwrap();
    let p2 = alloc.allocate(1).unwrap();
    let p3 = alloc.allocate(1).unwrap();
    let p4 = alloc.allocate(1).unwrap();
    show("allocate 20, 1, 1, 1", &alloc);

    alloc.deallocate(p1, 20);
    show("free the 20-byte block", &alloc);

    alloc.deallocate(p3, 1);
    show("free the third block", &alloc);

    let p5 = alloc.allocate(10).unwrap();
    println!("allocate(10) reused {p5:#x} (third block was {p3:#x})");
    show("best fit into the 16-byte hole", &alloc);

    alloc.deallocate(p4, 1);
    show("free the fourth block (merges right)", &alloc);

    alloc.deallocate(p5, 1);
    show("free the reused block (merges right)", &alloc);

    alloc.deallocate(p2, 1);
    show("free the second block (merges both ways)", &alloc);

    alloc.check_invariants().unwrap();
    println!("{}\n", alloc.stats());

    println!("=== seeded churn on 64 KiB ===\n");
    let mut big = HeapArena::new(64 * 1024);
    let mut alloc = MergeAllocator::new(&mut big);
    let ops = generate(&WorkloadProfile::churn(), 42);
    let outcome = replay(&mut alloc, &ops);
    println!(
        "{} allocated, {} failed, {} freed",
        outcome.allocated, outcome.failed, outcome.freed
    );
    println!("{}", alloc.stats());
}
