//! Contract between the realization engine and the remote flow engine.
//!
//! Every mutation is revision-guarded: callers pass the revision returned by
//! the previous successful call on the same object and receive the next one.

use crate::catalog::Bundle;
use crate::domain::PropertyMap;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors reported by a [`FlowEngineClient`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The request never produced a response
    #[error("Transport error: {0}")]
    Transport(String),

    /// The engine answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Http {
        /// Status code
        status: u16,
        /// Response body, as returned
        body: String,
    },

    /// The revision sent with a mutation was stale
    #[error("Revision conflict: {0}")]
    Conflict(String),

    /// The response could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Authentication failed or no credentials are available
    #[error("Authentication error: {0}")]
    Auth(String),
}

/// Result type for remote engine calls
pub type ClientResult<T> = Result<T, ClientError>;

/// A remote object identifier paired with its current revision
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Versioned {
    /// Remote identifier
    pub id: String,
    /// Revision to send with the next mutation
    pub revision: i64,
}

impl Versioned {
    /// Create a handle
    pub fn new(id: impl Into<String>, revision: i64) -> Self {
        Self { id: id.into(), revision }
    }

    /// Consume the handle, producing one that carries the revision returned by a mutation
    pub fn advance(self, revision: i64) -> Self {
        Self { revision, ..self }
    }
}

/// Canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Validation state reported after a configuration change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStatus {
    Valid,
    Invalid,
    Validating,
    Other(String),
}

impl ValidationStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationStatus::Valid)
    }
}

impl From<&str> for ValidationStatus {
    fn from(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "VALID" => ValidationStatus::Valid,
            "INVALID" => ValidationStatus::Invalid,
            "VALIDATING" => ValidationStatus::Validating,
            _ => ValidationStatus::Other(value.to_string()),
        }
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationStatus::Valid => write!(f, "VALID"),
            ValidationStatus::Invalid => write!(f, "INVALID"),
            ValidationStatus::Validating => write!(f, "VALIDATING"),
            ValidationStatus::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Response to a property update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyUpdate {
    /// Revision after the update
    pub revision: i64,
    pub validation_status: ValidationStatus,
    pub validation_errors: Vec<String>,
}

/// Desired scheduling state of a processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Running,
    Stopped,
}

impl RunState {
    /// Name used on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Running => "RUNNING",
            RunState::Stopped => "STOPPED",
        }
    }
}

/// Revision-guarded primitives over the remote flow engine
#[async_trait]
pub trait FlowEngineClient: Send + Sync {
    /// Identifier of the group flows are built in (the root group)
    async fn default_target_group_id(&self) -> ClientResult<String>;

    /// Positions of the processors currently in `group_id`
    async fn group_topology(&self, group_id: &str) -> ClientResult<Vec<Position>>;

    /// Create a processor
    async fn create_processor(
        &self,
        group_id: &str,
        name: &str,
        type_name: &str,
        position: Position,
        bundle: Option<Bundle>,
    ) -> ClientResult<Versioned>;

    /// Replace property values of a processor
    async fn update_processor_properties(
        &self,
        processor: &Versioned,
        properties: &PropertyMap,
    ) -> ClientResult<PropertyUpdate>;

    /// Replace the auto-terminated relationship set of a processor; returns the new revision
    async fn update_processor_auto_terminate(
        &self,
        processor: &Versioned,
        relationships: &[String],
    ) -> ClientResult<i64>;

    /// Connect two processors of `group_id`; returns the connection identifier
    async fn create_connection(
        &self,
        group_id: &str,
        source_id: &str,
        destination_id: &str,
        relationships: &[String],
    ) -> ClientResult<String>;

    /// Create a controller service
    async fn create_controller_service(
        &self,
        group_id: &str,
        name: &str,
        type_name: &str,
        properties: &PropertyMap,
        bundle: Option<Bundle>,
    ) -> ClientResult<Versioned>;

    /// Enable a controller service; returns the new revision
    async fn enable_controller_service(&self, service: &Versioned) -> ClientResult<i64>;

    /// Disable a controller service, reading its current revision first
    async fn disable_controller_service(&self, service_id: &str) -> ClientResult<()>;

    /// Start or stop a processor, reading its current revision first
    async fn set_processor_run_state(&self, processor_id: &str, state: RunState) -> ClientResult<()>;
}
