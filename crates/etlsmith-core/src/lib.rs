//!
//! Etlsmith Core - flow realization engine
//!
//! This crate turns an abstract, index-based [`FlowDefinition`] into live
//! objects inside a remote flow engine. It owns the catalog of known types,
//! the contract the remote engine must satisfy, and the [`FlowBuilder`] that
//! drives that contract one revision-guarded call at a time.

#![forbid(unsafe_code)]

/// Flow definitions and realization results
pub mod domain;

/// Known processor and controller-service types
pub mod catalog;

/// Contract with the remote flow engine
pub mod client;

/// Canvas placement
pub mod layout;

/// The realization engine
pub mod builder;

/// Error types
pub mod error;

// Re-export key types
pub use builder::{FlowBuilder, ProcessorConfiguration};
pub use catalog::{Bundle, Catalog, CatalogEntry, CompletionRule, ComponentKind};
pub use client::{
    ClientError, ClientResult, FlowEngineClient, Position, PropertyUpdate, RunState,
    ValidationStatus, Versioned,
};
pub use domain::{
    ConnectionSpec, FlowBuildResult, FlowDefinition, ProcessorSpec, PropertyMap, RunStateReport,
    ServiceReference, ServiceSpec,
};
pub use error::CoreError;
pub use layout::{Layout, LayoutConfig};
