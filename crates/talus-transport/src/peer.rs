//! Per-destination peer state.

use std::net::IpAddr;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::route::RouteHandle;

/// Number of priority levels the transport schedules across.
pub const NUM_PRIORITIES: usize = 8;

/// Cutoff value meaning "no byte limit at this priority".
pub const UNBOUNDED_CUTOFF: u32 = u32::MAX;

/// State for one remote host.
///
/// Created by [`crate::PeerTable`] on first lookup and alive until the
/// table is torn down; protocol code may cache the reference for as long
/// as it holds the table. The address and route never change after
/// creation. The cutoffs are updated in place by protocol logic when the
/// peer advertises new values — the table provides existence, not
/// serialization, so concurrent writers of one peer's cutoffs must
/// coordinate among themselves.
#[derive(Debug)]
pub struct Peer {
    addr: IpAddr,
    route: RouteHandle,
    /// Per-priority unscheduled-byte cutoffs. Relaxed atomics: a stale
    /// read costs scheduling accuracy, never safety.
    cutoffs: [AtomicU32; NUM_PRIORITIES],
    /// Version the peer advertised alongside its cutoffs. Stored for the
    /// protocol's benefit; never interpreted here.
    cutoff_version: AtomicU32,
}

impl Peer {
    /// Built only by the peer table, fully initialized before publication.
    ///
    /// Default cutoff policy: everything unscheduled at the second-highest
    /// priority, nothing at the highest, until the peer advertises real
    /// values.
    pub(crate) fn new(addr: IpAddr, route: RouteHandle) -> Self {
        let cutoffs: [AtomicU32; NUM_PRIORITIES] = std::array::from_fn(|_| AtomicU32::new(0));
        cutoffs[NUM_PRIORITIES - 2].store(UNBOUNDED_CUTOFF, Ordering::Relaxed);
        Self {
            addr,
            route,
            cutoffs,
            cutoff_version: AtomicU32::new(0),
        }
    }

    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    /// The cached route to this destination.
    pub fn route(&self) -> &RouteHandle {
        &self.route
    }

    /// Unscheduled-byte cutoff for one priority level.
    ///
    /// # Panics
    /// If `level >= NUM_PRIORITIES`.
    pub fn cutoff(&self, level: usize) -> u32 {
        self.cutoffs[level].load(Ordering::Relaxed)
    }

    /// Overwrite the cutoff for one priority level.
    ///
    /// # Panics
    /// If `level >= NUM_PRIORITIES`.
    pub fn set_cutoff(&self, level: usize, bytes: u32) {
        self.cutoffs[level].store(bytes, Ordering::Relaxed);
    }

    pub fn cutoff_version(&self) -> u32 {
        self.cutoff_version.load(Ordering::Relaxed)
    }

    pub fn set_cutoff_version(&self, version: u32) {
        self.cutoff_version.store(version, Ordering::Relaxed);
    }
}
