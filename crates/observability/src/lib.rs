//! `dvmdesk-observability` — logging/tracing setup for binaries and
//! integration harnesses.

pub mod tracing;

pub use tracing::{init, init_for_tests};
