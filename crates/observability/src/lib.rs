//! `tradepulse-observability`
//!
//! **Responsibility:** process-level logging/tracing setup.
//!
//! Library crates only emit `tracing` events; installing a subscriber is
//! the job of whatever owns the process (a binary, a scheduler, a test
//! harness) via [`init`].

pub mod tracing;

pub use tracing::init;
