//! Teardown completeness — every cached route released, exactly once.

use std::sync::atomic::Ordering;

use talus_transport::BindingContext;

use crate::infra::{addr, harness};

#[test]
fn empty_table_tears_down_clean() {
    let h = harness(4);
    drop(h.table);
    assert_eq!(h.live_routes.load(Ordering::SeqCst), 0);
}

#[test]
fn single_entry_releases_its_route() {
    let h = harness(4);
    h.table
        .find_or_create(addr(0, 1), &BindingContext::default())
        .unwrap();
    assert_eq!(h.live_routes.load(Ordering::SeqCst), 1);

    drop(h.table);
    assert_eq!(h.live_routes.load(Ordering::SeqCst), 0);
}

#[test]
fn collided_chains_release_every_route() {
    // One bucket: all entries share a single chain.
    let h = harness(0);
    let ctx = BindingContext::default();
    for last in 0..64u8 {
        h.table.find_or_create(addr(0, last), &ctx).unwrap();
    }
    assert_eq!(h.table.len(), 64);
    assert_eq!(h.live_routes.load(Ordering::SeqCst), 64);

    drop(h.table);
    assert_eq!(h.live_routes.load(Ordering::SeqCst), 0);
}

#[test]
fn repeat_lookups_do_not_double_acquire() {
    let h = harness(4);
    let ctx = BindingContext::default();
    for _ in 0..10 {
        h.table.find_or_create(addr(0, 1), &ctx).unwrap();
    }
    assert_eq!(h.live_routes.load(Ordering::SeqCst), 1);

    drop(h.table);
    assert_eq!(h.live_routes.load(Ordering::SeqCst), 0);
}
