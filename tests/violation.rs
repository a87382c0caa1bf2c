extern crate shalloc;

mod util;

use std::panic::{self, AssertUnwindSafe};

use shalloc::fail::{self, Violation};

fn panicking_handler(violation: Violation) -> ! {
    panic!("{}", violation)
}

#[test]
#[should_panic(expected = "failed decrement of record")]
fn decrement_at_zero() {
    fail::set_violation_handler(panicking_handler);

    let space = util::Space::new("HostSpace");
    // The record stays linked with a broken count, so the root cannot be torn down.
    let space = Box::leak(Box::new(space));

    let rec = space.construct(8);
    unsafe { shalloc::decrement(rec) };
}

#[test]
#[should_panic(expected = "failed increment of record")]
fn increment_negative() {
    fail::set_violation_handler(panicking_handler);

    let space = Box::leak(Box::new(util::Space::new("HostSpace")));
    let rec = space.construct(8);

    let res = panic::catch_unwind(AssertUnwindSafe(|| unsafe { shalloc::decrement(rec) }));
    assert!(res.is_err());
    unsafe { assert_eq!(rec.get().use_count(), -1) };
    assert_eq!(space.freed(), 0);

    unsafe { shalloc::increment(rec) };
}

#[test]
#[should_panic(expected = "failed teardown of root `HostSpace`: 1 records still tracked")]
fn teardown_with_records() {
    fail::set_violation_handler(panicking_handler);

    let space = util::Space::new("HostSpace");
    let _rec = space.alloc(8);

    drop(space);
}
