//! talus-transport — per-destination state for the Talus transport.
//!
//! The centerpiece is [`PeerTable`]: a find-or-create registry that hands
//! the rest of the protocol a long-lived [`Peer`] record for each remote
//! host, holding the cached network route and the per-priority scheduling
//! cutoffs advertised by that host. Lookups are lock-free; creation takes
//! one table-wide lock. Entries live until the table is dropped.

pub mod config;
pub mod error;
pub mod metrics;
pub mod peer;
pub mod peer_table;
pub mod route;

pub use config::PeerTableConfig;
pub use error::{PeerTableError, RouteError};
pub use metrics::{MetricsSnapshot, TransportMetrics};
pub use peer::{Peer, NUM_PRIORITIES, UNBOUNDED_CUTOFF};
pub use peer_table::PeerTable;
pub use route::{BindingContext, ProbeResolver, Route, RouteHandle, RouteResolver};
