//! NiFi REST adapter for etlsmith.
//!
//! [`NifiClient`] implements [`etlsmith_core::FlowEngineClient`] over the
//! `/nifi-api` endpoints, carrying the revision of every mutated component
//! back to the caller.

#![forbid(unsafe_code)]

mod client;
pub mod types;

pub use client::{Credentials, NifiClient, NifiClientConfig};
