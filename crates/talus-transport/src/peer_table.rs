//! The peer table — find-or-create registry of per-destination state.
//!
//! Lookups are lock-free: each bucket's chain head is an atomic pointer
//! published with Release ordering, and entries are never unlinked or
//! freed while the table is shared, so a reader either sees a fully
//! initialized peer or misses it entirely. Creation takes a single
//! table-wide lock and re-checks the chain before inserting, so racing
//! lookups for one address converge on one entry.
//!
//! The table never evicts, resizes, or removes individual entries; the
//! only removal path is dropping the whole table. Chains grow unbounded
//! if the deployment talks to far more distinct hosts than
//! `bucket_bits` was sized for — an accepted limitation, not a bug.

use std::hash::{Hash, Hasher};
use std::net::IpAddr;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHasher;

use crate::config::PeerTableConfig;
use crate::error::PeerTableError;
use crate::metrics::TransportMetrics;
use crate::peer::Peer;
use crate::route::{BindingContext, RouteResolver};

/// One chain node. `next` is written before the node is published and
/// never changes afterwards (head insertion only, no unlinking).
struct PeerNode {
    peer: Peer,
    next: *const PeerNode,
}

struct Bucket {
    head: AtomicPtr<PeerNode>,
}

/// Keeps a typo'd config from pre-allocating an absurd bucket array.
const MAX_BUCKET_BITS: u32 = 20;

/// Per-destination registry for the transport.
///
/// Constructed once at startup, shared by reference with every call
/// site, dropped once at shutdown. Dropping the table frees every entry
/// and releases every cached route; the borrow checker guarantees no
/// [`Peer`] reference outlives it.
pub struct PeerTable {
    buckets: Box<[Bucket]>,
    /// `bucket_count - 1`; bucket count is a power of two.
    mask: usize,
    /// Guards insertion into every bucket. Never taken by lookups.
    write_lock: Mutex<()>,
    resolver: Box<dyn RouteResolver>,
    metrics: TransportMetrics,
}

// Safety: chain pointers are written only under `write_lock` and freed
// only in `drop`, which takes `&mut self`; `Peer` itself is Sync.
unsafe impl Send for PeerTable {}
unsafe impl Sync for PeerTable {}

impl PeerTable {
    pub fn new(config: &PeerTableConfig, resolver: Box<dyn RouteResolver>) -> Self {
        let bits = config.bucket_bits.min(MAX_BUCKET_BITS);
        let count = 1usize << bits;
        let buckets = (0..count)
            .map(|_| Bucket {
                head: AtomicPtr::new(ptr::null_mut()),
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            buckets,
            mask: count - 1,
            write_lock: Mutex::new(()),
            resolver,
            metrics: TransportMetrics::new(),
        }
    }

    /// Returns the peer for `addr`, creating it on first use.
    ///
    /// The reference stays valid as long as the table does; callers may
    /// cache it indefinitely. On error the table is exactly as it was:
    /// no entry added, any half-acquired route already released.
    pub fn find_or_create(
        &self,
        addr: IpAddr,
        ctx: &BindingContext,
    ) -> Result<&Peer, PeerTableError> {
        let bucket = &self.buckets[self.bucket_index(addr)];

        // Fast path, no lock. A concurrent insert publishes the head with
        // Release, so the Acquire scan sees a fully initialized chain or
        // misses the new entry and falls through to the slow path.
        if let Some(peer) = self.scan(bucket, addr) {
            return Ok(peer);
        }

        let _guard = self.write_lock.lock();

        // Mandatory re-check: another thread may have created this peer
        // between our scan and taking the lock.
        if let Some(peer) = self.scan(bucket, addr) {
            return Ok(peer);
        }

        let route = self.resolver.resolve(addr, ctx).map_err(|e| {
            self.metrics.route_errors.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(%addr, error = %e, "route resolution failed");
            e
        })?;

        let node = alloc_node(PeerNode {
            peer: Peer::new(addr, route),
            next: bucket.head.load(Ordering::Relaxed),
        })
        .ok_or_else(|| {
            // Dropping the unallocated node released the route handle.
            self.metrics.alloc_errors.fetch_add(1, Ordering::Relaxed);
            PeerTableError::OutOfMemory
        })?;

        let node = Box::into_raw(node);
        bucket.head.store(node, Ordering::Release);
        self.metrics.new_entries.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(%addr, "new peer entry");

        // Safety: just published; freed only in `drop`, which requires
        // exclusive access to the table.
        Ok(unsafe { &(*node).peer })
    }

    /// Walk one bucket's chain looking for `addr`.
    fn scan(&self, bucket: &Bucket, addr: IpAddr) -> Option<&Peer> {
        let mut node = bucket.head.load(Ordering::Acquire) as *const PeerNode;
        while !node.is_null() {
            // Safety: nodes reachable from a bucket stay allocated for
            // the table's whole shared lifetime.
            let n = unsafe { &*node };
            if n.peer.addr() == addr {
                return Some(&n.peer);
            }
            self.metrics.hash_links.fetch_add(1, Ordering::Relaxed);
            node = n.next;
        }
        None
    }

    fn bucket_index(&self, addr: IpAddr) -> usize {
        let mut hasher = FxHasher::default();
        addr.hash(&mut hasher);
        hasher.finish() as usize & self.mask
    }

    /// Number of live entries. Walks every chain; diagnostic use only.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate every live peer, bucket by bucket. Order within a bucket
    /// is newest-first.
    pub fn iter(&self) -> Peers<'_> {
        Peers {
            table: self,
            bucket: 0,
            node: ptr::null(),
        }
    }

    /// Lookup and creation counters for status reporting.
    pub fn metrics(&self) -> &TransportMetrics {
        &self.metrics
    }
}

impl Drop for PeerTable {
    fn drop(&mut self) {
        // Exclusive access: no lookup can be in flight. Freeing a node
        // drops its Peer, which releases the cached route handle.
        for bucket in self.buckets.iter_mut() {
            let mut node = *bucket.head.get_mut() as *const PeerNode;
            while !node.is_null() {
                // Safety: every node came from Box::into_raw in
                // find_or_create and is freed exactly once, here.
                let boxed = unsafe { Box::from_raw(node as *mut PeerNode) };
                node = boxed.next;
            }
        }
    }
}

/// Iterator over the peers in a [`PeerTable`].
pub struct Peers<'a> {
    table: &'a PeerTable,
    bucket: usize,
    node: *const PeerNode,
}

impl<'a> Iterator for Peers<'a> {
    type Item = &'a Peer;

    fn next(&mut self) -> Option<&'a Peer> {
        loop {
            if self.node.is_null() {
                let bucket = self.table.buckets.get(self.bucket)?;
                self.node = bucket.head.load(Ordering::Acquire);
                self.bucket += 1;
                continue;
            }
            // Safety: same as `scan` — published nodes outlive the borrow.
            let n = unsafe { &*self.node };
            self.node = n.next;
            return Some(&n.peer);
        }
    }
}

/// Allocation seam for peer entries. Tests force the next allocation to
/// fail; the production build always succeeds.
fn alloc_node(node: PeerNode) -> Option<Box<PeerNode>> {
    #[cfg(test)]
    if test_alloc::should_fail() {
        return None;
    }
    Some(Box::new(node))
}
