//! Route resolution — how the peer table learns a path to a destination.
//!
//! The table caches one resolved route per peer for the table's whole
//! lifetime, so resolution runs exactly once per destination. It runs
//! under the table's write lock: resolvers may hit the host network
//! stack, but must not block indefinitely or call back into the table.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::sync::Arc;

use crate::error::RouteError;

/// Caller-supplied parameters for route resolution.
///
/// Mirrors what a bound socket contributes to the host's own route
/// lookup: an optional source address, an optional outgoing interface,
/// and the type-of-service byte for policy routing.
#[derive(Debug, Clone, Default)]
pub struct BindingContext {
    /// Local address the path must originate from. None = let the host pick.
    pub local_addr: Option<IpAddr>,
    /// Outgoing interface index. None = unrestricted.
    pub interface: Option<u32>,
    /// Type-of-service byte carried into path selection.
    pub tos: u8,
}

/// A resolved network path to one destination.
pub trait Route: Send + Sync + fmt::Debug {
    /// Local address packets to this destination should be sent from.
    fn source(&self) -> IpAddr;

    /// Outgoing interface index, when the path is pinned to one.
    fn interface(&self) -> Option<u32>;

    /// Path MTU hint for segmentation decisions.
    fn mtu(&self) -> u32;
}

/// Reference-counted handle to a resolved route. Ownership of one
/// reference transfers to the peer entry that caches it; the entry
/// releases it when the table is torn down.
pub type RouteHandle = Arc<dyn Route>;

/// Produces routes on behalf of the peer table.
pub trait RouteResolver: Send + Sync {
    /// Resolve a path to `dst` under the constraints in `ctx`.
    ///
    /// Called with the table's write lock held. Must either return a
    /// route or a definite error — the table never retries.
    fn resolve(&self, dst: IpAddr, ctx: &BindingContext) -> Result<RouteHandle, RouteError>;
}

// ── Probe resolver ────────────────────────────────────────────────────────────

/// Port used for the route-pinning connect. Nothing is ever sent to it.
const PROBE_PORT: u16 = 9;

const DEFAULT_MTU: u32 = 1500;

/// Resolver backed by the host's own source-address selection.
///
/// Connecting a UDP socket transmits nothing but forces the host to run
/// a route lookup; the socket's local address afterwards is the source
/// the host chose for that destination. Honors
/// [`BindingContext::local_addr`] by binding the probe socket to it.
#[derive(Debug, Clone, Default)]
pub struct ProbeResolver;

impl RouteResolver for ProbeResolver {
    fn resolve(&self, dst: IpAddr, ctx: &BindingContext) -> Result<RouteHandle, RouteError> {
        let err = |source| RouteError { addr: dst, source };

        let bind_addr: SocketAddr = match ctx.local_addr {
            Some(local) => SocketAddr::new(local, 0),
            None => match dst {
                IpAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
                IpAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
            },
        };

        let probe = UdpSocket::bind(bind_addr).map_err(err)?;
        probe.connect((dst, PROBE_PORT)).map_err(err)?;
        let local = probe.local_addr().map_err(err)?;

        Ok(Arc::new(ProbeRoute {
            source: local.ip(),
            interface: ctx.interface,
            mtu: DEFAULT_MTU,
        }))
    }
}

#[derive(Debug)]
struct ProbeRoute {
    source: IpAddr,
    interface: Option<u32>,
    mtu: u32,
}

impl Route for ProbeRoute {
    fn source(&self) -> IpAddr {
        self.source
    }

    fn interface(&self) -> Option<u32> {
        self.interface
    }

    fn mtu(&self) -> u32 {
        self.mtu
    }
}
