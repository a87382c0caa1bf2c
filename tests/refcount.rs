extern crate shalloc;

mod util;

use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn paired_increments_and_decrements() {
    const THREADS: usize = 8;

    let space = util::Space::new("HostSpace");
    let a = space.alloc(64);
    let b = space.alloc(64);
    let before = space.records();

    util::multiply(THREADS, |_| {
        for _ in 0..5000 {
            unsafe {
                shalloc::increment(a);
                assert_eq!(shalloc::decrement(a), Some(a));
            }
        }
    });

    unsafe { assert_eq!(a.get().use_count(), 1) };
    assert_eq!(space.records(), before);
    assert_eq!(space.freed(), 0);
    assert!(space.root.is_sane());

    unsafe {
        shalloc::decrement(a);
        shalloc::decrement(b);
    }
}

#[test]
fn nested_increments() {
    const THREADS: usize = 4;

    let space = util::Space::new("HostSpace");
    let a = space.alloc(1);

    util::multiply(THREADS, |n| {
        for _ in 0..1000 {
            for _ in 0..n + 1 {
                unsafe { shalloc::increment(a) };
            }
            for _ in 0..n + 1 {
                unsafe { shalloc::decrement(a) };
            }
        }
    });

    unsafe { assert_eq!(a.get().use_count(), 1) };
    assert_eq!(space.freed(), 0);

    unsafe { shalloc::decrement(a) };
    assert_eq!(space.freed(), 1);
}

#[test]
fn last_release_deallocates_once() {
    const THREADS: usize = 8;

    let space = util::Space::new("HostSpace");

    for round in 0..200 {
        let rec = space.alloc(round);
        for _ in 1..THREADS {
            unsafe { shalloc::increment(rec) };
        }

        // Every thread owns one reference and races to drop it.
        let released = AtomicUsize::new(0);
        util::multiply(THREADS, |_| {
            if unsafe { shalloc::decrement(rec) }.is_none() {
                released.fetch_add(1, Ordering::SeqCst);
            }
        });

        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(space.freed(), round + 1);
        assert!(space.root.is_empty());
    }
}

#[test]
fn release_under_construction() {
    const THREADS: usize = 6;

    let space = util::Space::new("HostSpace");
    let shared = space.alloc(16);
    for _ in 0..THREADS {
        unsafe { shalloc::increment(shared) };
    }

    // The shared record is released by whichever thread comes last, while the others are busy
    // linking records of their own.
    util::multiply(THREADS, |_| {
        let mut mine = Vec::new();
        for size in 0..100 {
            mine.push(space.alloc(size));
        }

        unsafe { shalloc::decrement(shared) };

        for rec in mine {
            assert!(unsafe { shalloc::decrement(rec) }.is_none());
        }
    });

    unsafe { assert_eq!(shalloc::decrement(shared), None) };
    assert_eq!(space.freed(), THREADS * 100 + 1);
    assert!(space.root.is_empty());
    assert!(space.root.is_sane());
}
