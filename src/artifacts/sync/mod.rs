//! Synchronization between repositories: the transport seam and the fetch
//! and push orchestrations built on it.
//!
//! Both orchestrations treat per-ref verdicts as data in their outcome
//! types; only configuration gaps (`ConfigError`) and unreachable remotes
//! (`TransportError`) surface as errors.

pub mod fetch;
pub mod push;
pub mod transport;
