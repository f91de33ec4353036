//! `dvmdesk-client` — the async boundary of the engine.
//!
//! Everything network-shaped lives here: the [`transport::Transport`]
//! trait the relay layer implements, bounded queries (every outbound
//! query resolves, fails or is abandoned within a timeout composed with a
//! cancellation signal), and the high-level services that fetch snapshots
//! and hand them to `dvmdesk-engine` for reconciliation.
//!
//! No state is persisted. Each polling cycle recomputes derived state
//! from the freshly fetched record set, so staleness is bounded by the
//! poll interval and timeout alone.

pub mod memory;
pub mod service;
pub mod transport;
pub mod watcher;

pub use memory::MemoryTransport;
pub use service::{JobService, ProviderService, ServiceTimeouts};
pub use transport::{Cancel, CancelHandle, Filter, Transport, TransportError, bounded_query};
pub use watcher::watch_job;
