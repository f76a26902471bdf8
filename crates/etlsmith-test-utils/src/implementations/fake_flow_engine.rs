//! In-memory implementation of the FlowEngineClient trait.
//!
//! Models the parts of the remote engine the realization engine depends on:
//! identifiers, optimistic-concurrency revisions (stale revisions are
//! rejected with `ClientError::Conflict`), validation reports, and scripted
//! failures keyed by object name.

use async_trait::async_trait;
use etlsmith_core::{
    Bundle, ClientError, ClientResult, FlowEngineClient, Position, PropertyMap, PropertyUpdate,
    RunState, ValidationStatus, Versioned,
};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// A processor as the fake engine stores it
#[derive(Debug, Clone, PartialEq)]
pub struct FakeProcessor {
    pub id: String,
    pub name: String,
    pub type_name: String,
    pub bundle: Option<Bundle>,
    pub position: Position,
    pub revision: i64,
    pub properties: PropertyMap,
    pub auto_terminated: Vec<String>,
    pub run_state: RunState,
}

/// A controller service as the fake engine stores it
#[derive(Debug, Clone, PartialEq)]
pub struct FakeService {
    pub id: String,
    pub name: String,
    pub type_name: String,
    pub bundle: Option<Bundle>,
    pub revision: i64,
    pub properties: PropertyMap,
    pub enabled: bool,
}

/// A connection as the fake engine stores it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeConnection {
    pub id: String,
    pub source_id: String,
    pub destination_id: String,
    pub relationships: Vec<String>,
}

/// A scripted failure. Object-specific failures are keyed by display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Failure {
    TargetGroup,
    Topology,
    CreateProcessor(String),
    UpdateProperties(String),
    AutoTerminate(String),
    CreateService(String),
    EnableService(String),
    /// Keyed by the source processor's name
    CreateConnection(String),
    RunState(String),
}

/// A call received by the fake engine, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    TargetGroup,
    Topology { group_id: String },
    CreateProcessor { name: String, position: Position },
    UpdateProperties { id: String, revision: i64 },
    AutoTerminate { id: String, revision: i64 },
    CreateConnection { source_id: String, destination_id: String },
    CreateService { name: String },
    EnableService { id: String, revision: i64 },
    DisableService { id: String },
    SetRunState { id: String, state: RunState },
}

#[derive(Default)]
struct EngineState {
    next_id: u64,
    existing: Vec<Position>,
    processors: Vec<FakeProcessor>,
    services: Vec<FakeService>,
    connections: Vec<FakeConnection>,
    failures: HashSet<Failure>,
    invalid: HashMap<String, Vec<String>>,
    calls: Vec<EngineCall>,
}

impl EngineState {
    fn allocate(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn fails(&self, failure: &Failure) -> bool {
        self.failures.contains(failure)
    }

    fn processor_mut(&mut self, id: &str) -> ClientResult<&mut FakeProcessor> {
        self.processors
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found("processor", id))
    }

    fn service_mut(&mut self, id: &str) -> ClientResult<&mut FakeService> {
        self.services
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| not_found("controller service", id))
    }

    fn processor_name(&self, id: &str) -> Option<String> {
        self.processors
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.name.clone())
    }
}

fn injected(what: &str) -> ClientError {
    ClientError::Http {
        status: 500,
        body: format!("injected failure: {}", what),
    }
}

fn not_found(kind: &str, id: &str) -> ClientError {
    ClientError::Http {
        status: 404,
        body: format!("Unable to find {} with id '{}'", kind, id),
    }
}

fn check_revision(kind: &str, handle: &Versioned, current: i64) -> ClientResult<()> {
    if handle.revision != current {
        return Err(ClientError::Conflict(format!(
            "{} {}: revision {} is not the most up-to-date revision ({})",
            kind, handle.id, handle.revision, current
        )));
    }
    Ok(())
}

/// Thread-safe in-memory flow engine for testing.
#[derive(Clone)]
pub struct FakeFlowEngine {
    group_id: String,
    state: Arc<RwLock<EngineState>>,
}

impl fmt::Debug for FakeFlowEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("FakeFlowEngine")
            .field("group_id", &self.group_id)
            .field("processor_count", &state.processors.len())
            .field("service_count", &state.services.len())
            .field("connection_count", &state.connections.len())
            .finish()
    }
}

impl Default for FakeFlowEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeFlowEngine {
    /// Creates an empty engine whose root group is `root-group`.
    pub fn new() -> Self {
        Self {
            group_id: "root-group".to_string(),
            state: Arc::new(RwLock::new(EngineState::default())),
        }
    }

    /// Seeds the group with processors at the given positions.
    pub fn with_existing_positions(self, positions: Vec<Position>) -> Self {
        self.state.write().existing = positions;
        self
    }

    /// Makes the given operation fail.
    pub fn fail_on(self, failure: Failure) -> Self {
        self.state.write().failures.insert(failure);
        self
    }

    /// Makes property updates of the named processor report INVALID.
    pub fn report_invalid(self, name: &str, errors: Vec<String>) -> Self {
        self.state.write().invalid.insert(name.to_string(), errors);
        self
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Created processors, in creation order
    pub fn processors(&self) -> Vec<FakeProcessor> {
        self.state.read().processors.clone()
    }

    /// The processor with the given display name
    pub fn processor(&self, name: &str) -> Option<FakeProcessor> {
        self.state
            .read()
            .processors
            .iter()
            .find(|p| p.name == name)
            .cloned()
    }

    /// Created controller services, in creation order
    pub fn services(&self) -> Vec<FakeService> {
        self.state.read().services.clone()
    }

    /// The controller service with the given display name
    pub fn service(&self, name: &str) -> Option<FakeService> {
        self.state
            .read()
            .services
            .iter()
            .find(|s| s.name == name)
            .cloned()
    }

    /// Created connections, in creation order
    pub fn connections(&self) -> Vec<FakeConnection> {
        self.state.read().connections.clone()
    }

    /// Every call received so far
    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.read().calls.clone()
    }

    /// Number of received calls matching `predicate`
    pub fn count_calls(&self, predicate: impl Fn(&EngineCall) -> bool) -> usize {
        self.state.read().calls.iter().filter(|c| predicate(c)).count()
    }
}

#[async_trait]
impl FlowEngineClient for FakeFlowEngine {
    async fn default_target_group_id(&self) -> ClientResult<String> {
        let mut state = self.state.write();
        state.calls.push(EngineCall::TargetGroup);
        if state.fails(&Failure::TargetGroup) {
            return Err(ClientError::Transport("connection refused".to_string()));
        }
        Ok(self.group_id.clone())
    }

    async fn group_topology(&self, group_id: &str) -> ClientResult<Vec<Position>> {
        let mut state = self.state.write();
        state.calls.push(EngineCall::Topology {
            group_id: group_id.to_string(),
        });
        if state.fails(&Failure::Topology) {
            return Err(injected("topology"));
        }
        let mut positions = state.existing.clone();
        positions.extend(state.processors.iter().map(|p| p.position));
        Ok(positions)
    }

    async fn create_processor(
        &self,
        group_id: &str,
        name: &str,
        type_name: &str,
        position: Position,
        bundle: Option<Bundle>,
    ) -> ClientResult<Versioned> {
        let mut state = self.state.write();
        state.calls.push(EngineCall::CreateProcessor {
            name: name.to_string(),
            position,
        });
        if group_id != self.group_id {
            return Err(not_found("process group", group_id));
        }
        if state.fails(&Failure::CreateProcessor(name.to_string())) {
            return Err(injected("create processor"));
        }

        let id = state.allocate("processor");
        state.processors.push(FakeProcessor {
            id: id.clone(),
            name: name.to_string(),
            type_name: type_name.to_string(),
            bundle,
            position,
            revision: 1,
            properties: PropertyMap::new(),
            auto_terminated: Vec::new(),
            run_state: RunState::Stopped,
        });
        Ok(Versioned::new(id, 1))
    }

    async fn update_processor_properties(
        &self,
        processor: &Versioned,
        properties: &PropertyMap,
    ) -> ClientResult<PropertyUpdate> {
        let mut state = self.state.write();
        state.calls.push(EngineCall::UpdateProperties {
            id: processor.id.clone(),
            revision: processor.revision,
        });
        let name = state.processor_name(&processor.id).unwrap_or_default();
        if state.fails(&Failure::UpdateProperties(name.clone())) {
            return Err(injected("update properties"));
        }
        let invalid = state.invalid.get(&name).cloned();

        let stored = state.processor_mut(&processor.id)?;
        check_revision("processor", processor, stored.revision)?;
        stored.properties.extend(properties.clone());
        stored.revision += 1;

        let (validation_status, validation_errors) = match invalid {
            Some(errors) => (ValidationStatus::Invalid, errors),
            None => (ValidationStatus::Valid, Vec::new()),
        };
        Ok(PropertyUpdate {
            revision: stored.revision,
            validation_status,
            validation_errors,
        })
    }

    async fn update_processor_auto_terminate(
        &self,
        processor: &Versioned,
        relationships: &[String],
    ) -> ClientResult<i64> {
        let mut state = self.state.write();
        state.calls.push(EngineCall::AutoTerminate {
            id: processor.id.clone(),
            revision: processor.revision,
        });
        let name = state.processor_name(&processor.id).unwrap_or_default();
        if state.fails(&Failure::AutoTerminate(name)) {
            return Err(injected("auto-terminate"));
        }

        let stored = state.processor_mut(&processor.id)?;
        check_revision("processor", processor, stored.revision)?;
        stored.auto_terminated = relationships.to_vec();
        stored.revision += 1;
        Ok(stored.revision)
    }

    async fn create_connection(
        &self,
        group_id: &str,
        source_id: &str,
        destination_id: &str,
        relationships: &[String],
    ) -> ClientResult<String> {
        let mut state = self.state.write();
        state.calls.push(EngineCall::CreateConnection {
            source_id: source_id.to_string(),
            destination_id: destination_id.to_string(),
        });
        if group_id != self.group_id {
            return Err(not_found("process group", group_id));
        }
        let source_name = state
            .processor_name(source_id)
            .ok_or_else(|| not_found("processor", source_id))?;
        if state.processor_name(destination_id).is_none() {
            return Err(not_found("processor", destination_id));
        }
        if state.fails(&Failure::CreateConnection(source_name)) {
            return Err(injected("create connection"));
        }

        let id = state.allocate("connection");
        state.connections.push(FakeConnection {
            id: id.clone(),
            source_id: source_id.to_string(),
            destination_id: destination_id.to_string(),
            relationships: relationships.to_vec(),
        });
        Ok(id)
    }

    async fn create_controller_service(
        &self,
        group_id: &str,
        name: &str,
        type_name: &str,
        properties: &PropertyMap,
        bundle: Option<Bundle>,
    ) -> ClientResult<Versioned> {
        let mut state = self.state.write();
        state.calls.push(EngineCall::CreateService {
            name: name.to_string(),
        });
        if group_id != self.group_id {
            return Err(not_found("process group", group_id));
        }
        if state.fails(&Failure::CreateService(name.to_string())) {
            return Err(injected("create controller service"));
        }

        let id = state.allocate("service");
        state.services.push(FakeService {
            id: id.clone(),
            name: name.to_string(),
            type_name: type_name.to_string(),
            bundle,
            revision: 1,
            properties: properties.clone(),
            enabled: false,
        });
        Ok(Versioned::new(id, 1))
    }

    async fn enable_controller_service(&self, service: &Versioned) -> ClientResult<i64> {
        let mut state = self.state.write();
        state.calls.push(EngineCall::EnableService {
            id: service.id.clone(),
            revision: service.revision,
        });
        let stored = state.service_mut(&service.id)?;
        let name = stored.name.clone();
        check_revision("controller service", service, stored.revision)?;
        if state.fails(&Failure::EnableService(name)) {
            return Err(injected("enable controller service"));
        }

        let stored = state.service_mut(&service.id)?;
        stored.enabled = true;
        stored.revision += 1;
        Ok(stored.revision)
    }

    async fn disable_controller_service(&self, service_id: &str) -> ClientResult<()> {
        let mut state = self.state.write();
        state.calls.push(EngineCall::DisableService {
            id: service_id.to_string(),
        });
        let stored = state.service_mut(service_id)?;
        stored.enabled = false;
        stored.revision += 1;
        Ok(())
    }

    async fn set_processor_run_state(&self, processor_id: &str, run_state: RunState) -> ClientResult<()> {
        let mut state = self.state.write();
        state.calls.push(EngineCall::SetRunState {
            id: processor_id.to_string(),
            state: run_state,
        });
        let name = state.processor_name(processor_id).unwrap_or_default();
        if state.fails(&Failure::RunState(name)) {
            return Err(injected("run state"));
        }

        let stored = state.processor_mut(processor_id)?;
        stored.run_state = run_state;
        stored.revision += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stale_revision_is_rejected() {
        let engine = FakeFlowEngine::new();
        let handle = engine
            .create_processor("root-group", "Log", "LogAttribute", Position::default(), None)
            .await
            .unwrap();

        let update = engine
            .update_processor_properties(&handle, &PropertyMap::new())
            .await
            .unwrap();
        assert_eq!(update.revision, 2);

        let stale = engine
            .update_processor_auto_terminate(&handle, &["success".to_string()])
            .await;
        assert!(matches!(stale, Err(ClientError::Conflict(_))));

        let fresh = engine
            .update_processor_auto_terminate(&handle.clone().advance(update.revision), &["success".to_string()])
            .await;
        assert_eq!(fresh, Ok(3));
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let engine = FakeFlowEngine::new().fail_on(Failure::CreateProcessor("Broken".to_string()));
        assert!(engine
            .create_processor("root-group", "Broken", "X", Position::default(), None)
            .await
            .is_err());
        assert!(engine
            .create_processor("root-group", "Fine", "X", Position::default(), None)
            .await
            .is_ok());
        assert_eq!(engine.processors().len(), 1);
    }
}
