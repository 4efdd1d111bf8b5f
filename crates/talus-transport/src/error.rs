//! Typed errors for peer-table operations.

use std::io;
use std::net::IpAddr;

use thiserror::Error;

/// Route resolution failed for a destination.
///
/// Carries the resolver's underlying reason (host unreachable, network
/// down, bad local binding) so callers can log something actionable.
#[derive(Debug, Error)]
#[error("no route to {addr}: {source}")]
pub struct RouteError {
    /// Destination that could not be resolved.
    pub addr: IpAddr,
    /// Underlying failure from the resolver.
    #[source]
    pub source: io::Error,
}

/// Errors returned by [`crate::PeerTable::find_or_create`].
///
/// Neither variant leaves a trace in the table: the entry count and every
/// cached route are exactly what they were before the call. The table
/// never retries internally — whether and when to retry is the caller's
/// decision.
#[derive(Debug, Error)]
pub enum PeerTableError {
    /// Memory for a new peer entry could not be obtained.
    #[error("out of memory allocating peer entry")]
    OutOfMemory,

    /// The route resolver could not produce a route for the address.
    #[error(transparent)]
    RouteUnreachable(#[from] RouteError),
}
