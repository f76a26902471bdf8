use serde::{Deserialize, Serialize};

/// Outcome of one realization run.
///
/// Accumulates across the whole run; `success` is decided once the run has
/// completed and is never used to stop it early.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowBuildResult {
    /// Process group the flow was built in
    pub process_group_id: Option<String>,

    /// Identifiers of created processors, in definition order
    pub processor_ids: Vec<String>,

    /// Identifiers of created connections, in definition order
    pub connection_ids: Vec<String>,

    /// Identifiers of created controller services, in definition order
    pub controller_service_ids: Vec<String>,

    /// Human-readable failures
    pub errors: Vec<String>,

    /// Advisory messages, such as non-VALID validation reports
    pub warnings: Vec<String>,

    /// True iff `errors` was empty when the run completed
    pub success: bool,
}

impl FlowBuildResult {
    pub(crate) fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub(crate) fn record_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub(crate) fn finish(&mut self) {
        self.success = self.errors.is_empty();
    }

    /// Total number of remote objects created
    pub fn created_count(&self) -> usize {
        self.processor_ids.len() + self.connection_ids.len() + self.controller_service_ids.len()
    }
}

/// Outcome of starting or stopping a realized flow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStateReport {
    /// Objects whose run state changed
    pub updated: Vec<String>,

    /// Human-readable failures
    pub errors: Vec<String>,
}

impl RunStateReport {
    /// True when every object changed state
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}
