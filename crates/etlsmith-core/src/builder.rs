//! The flow realization engine.
//!
//! [`FlowBuilder::build_flow`] materializes a [`FlowDefinition`] in strict
//! phases: target group, controller services, layout, processors,
//! connections. Each phase works one object at a time and folds every
//! failure into the [`FlowBuildResult`]; only a failure to resolve the
//! target group ends a run early.

use crate::catalog::{merge_properties, Catalog, ResolvedType};
use crate::client::{ClientError, FlowEngineClient, RunState, Versioned};
use crate::domain::{
    ConnectionSpec, FlowBuildResult, FlowDefinition, ProcessorSpec, PropertyMap, RunStateReport,
    ServiceSpec,
};
use crate::layout::{Layout, LayoutConfig};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Realized identifiers keyed by definition index
pub type IndexMap = HashMap<usize, String>;

/// Messages and value produced while realizing one object
#[derive(Debug)]
struct Outcome<T> {
    value: Option<T>,
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl<T> Default for Outcome<T> {
    fn default() -> Self {
        Self {
            value: None,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl<T> Outcome<T> {
    fn error(&mut self, message: String) {
        error!("{}", message);
        self.errors.push(message);
    }

    fn warning(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }

    /// Fold messages into `result`, handing back the realized value
    fn fold_into(self, result: &mut FlowBuildResult) -> Option<T> {
        result.errors.extend(self.errors);
        result.warnings.extend(self.warnings);
        self.value
    }
}

/// Final configuration of one processor, computed before anything is pushed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessorConfiguration {
    /// Defaults, explicit values, completion rules and service references, in that order
    pub properties: PropertyMap,
    /// Explicit relationships followed by inferred sink relationships
    pub auto_terminate: Vec<String>,
    /// References whose controller service was never realized
    pub unresolved_references: Vec<(String, usize)>,
}

impl ProcessorConfiguration {
    /// Compute the configuration of the processor at `index`.
    ///
    /// `service_ids` maps controller-service indices to realized identifiers.
    pub fn resolve(
        definition: &FlowDefinition,
        index: usize,
        spec: &ProcessorSpec,
        resolved: &ResolvedType<'_>,
        service_ids: &IndexMap,
    ) -> Self {
        let mut properties = merge_properties(&resolved.default_properties(), &spec.properties);
        for rule in resolved.rules() {
            rule.complete_properties(&mut properties);
        }

        let mut auto_terminate = spec.auto_terminate.clone().unwrap_or_default();
        let is_source = definition.is_source(index);
        for rule in resolved.rules() {
            rule.complete_auto_terminate(is_source, &mut auto_terminate);
        }

        let mut unresolved_references = Vec::new();
        for (property, service_index) in definition.references_to(index) {
            match service_ids.get(&service_index) {
                Some(service_id) => {
                    properties.insert(property.to_string(), service_id.clone());
                }
                None => unresolved_references.push((property.to_string(), service_index)),
            }
        }

        Self {
            properties,
            auto_terminate,
            unresolved_references,
        }
    }
}

/// Drives a [`FlowEngineClient`] to realize flow definitions
pub struct FlowBuilder {
    client: Arc<dyn FlowEngineClient>,
    catalog: Arc<Catalog>,
    layout: LayoutConfig,
}

impl FlowBuilder {
    /// Create a builder with the default layout
    pub fn new(client: Arc<dyn FlowEngineClient>, catalog: Arc<Catalog>) -> Self {
        Self {
            client,
            catalog,
            layout: LayoutConfig::default(),
        }
    }

    /// Override the layout constants
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Realize `definition` in the engine's root group.
    ///
    /// Never fails: every problem is recorded in the returned result.
    #[instrument(
        skip_all,
        fields(
            processors = definition.processors.len(),
            connections = definition.connections.len(),
            services = definition.services().len(),
        )
    )]
    pub async fn build_flow(&self, definition: &FlowDefinition) -> FlowBuildResult {
        let mut result = FlowBuildResult::default();

        if let Err(e) = self.realize(definition, &mut result).await {
            error!(error = %e, "Flow build aborted");
            result.record_error(format!("Failed to resolve target process group: {}", e));
        }

        result.finish();
        info!(
            success = result.success,
            processors = result.processor_ids.len(),
            connections = result.connection_ids.len(),
            services = result.controller_service_ids.len(),
            errors = result.errors.len(),
            "Flow build finished"
        );
        result
    }

    async fn realize(
        &self,
        definition: &FlowDefinition,
        result: &mut FlowBuildResult,
    ) -> Result<(), ClientError> {
        let group_id = self.client.default_target_group_id().await?;
        info!(group_id = %group_id, "Building flow in process group");
        result.process_group_id = Some(group_id.clone());

        let service_ids = self.create_services(&group_id, definition, result).await;
        let layout = self.compute_layout(&group_id, result).await;
        let processor_ids = self
            .create_processors(&group_id, definition, &layout, &service_ids, result)
            .await;
        self.create_connections(&group_id, definition, &processor_ids, result)
            .await;

        Ok(())
    }

    async fn create_services(
        &self,
        group_id: &str,
        definition: &FlowDefinition,
        result: &mut FlowBuildResult,
    ) -> IndexMap {
        let services = definition.services();
        if !services.is_empty() {
            info!(count = services.len(), "Creating controller services");
        }

        let mut realized = IndexMap::new();
        for (index, spec) in services.iter().enumerate() {
            if let Some(id) = self.realize_service(group_id, spec).await.fold_into(result) {
                result.controller_service_ids.push(id.clone());
                realized.insert(index, id);
            }
        }
        realized
    }

    async fn realize_service(&self, group_id: &str, spec: &ServiceSpec) -> Outcome<String> {
        let mut outcome = Outcome::default();
        let resolved = self.catalog.resolve(&spec.type_key);
        if !resolved.is_known() {
            debug!(type_key = %spec.type_key, "Controller service type not in catalog, using it verbatim");
        }
        let properties = merge_properties(&resolved.default_properties(), &spec.properties);

        let handle = match self
            .client
            .create_controller_service(
                group_id,
                &spec.name,
                &resolved.type_name,
                &properties,
                resolved.bundle.clone(),
            )
            .await
        {
            Ok(handle) => handle,
            Err(e) => {
                outcome.error(format!("Failed to create controller service '{}': {}", spec.name, e));
                return outcome;
            }
        };
        debug!(name = %spec.name, id = %handle.id, "Created controller service");
        outcome.value = Some(handle.id.clone());

        match self.client.enable_controller_service(&handle).await {
            Ok(revision) => {
                let handle = handle.advance(revision);
                debug!(id = %handle.id, revision = handle.revision, "Enabled controller service");
            }
            Err(e) => {
                outcome.error(format!("Failed to enable controller service '{}': {}", spec.name, e));
            }
        }
        outcome
    }

    async fn compute_layout(&self, group_id: &str, result: &mut FlowBuildResult) -> Layout {
        match self.client.group_topology(group_id).await {
            Ok(existing) => {
                let layout = Layout::from_topology(&existing, &self.layout);
                debug!(existing = existing.len(), column_x = layout.column_x(), "Computed layout");
                layout
            }
            Err(e) => {
                let message = format!(
                    "Could not read the current group topology, placing the flow at the default offset: {}",
                    e
                );
                warn!("{}", message);
                result.record_warning(message);
                Layout::from_topology(&[], &self.layout)
            }
        }
    }

    async fn create_processors(
        &self,
        group_id: &str,
        definition: &FlowDefinition,
        layout: &Layout,
        service_ids: &IndexMap,
        result: &mut FlowBuildResult,
    ) -> IndexMap {
        info!(count = definition.processors.len(), "Creating processors");

        let mut realized = IndexMap::new();
        for (index, spec) in definition.processors.iter().enumerate() {
            let outcome = self
                .realize_processor(group_id, definition, index, spec, layout, service_ids)
                .await;
            if let Some(id) = outcome.fold_into(result) {
                result.processor_ids.push(id.clone());
                realized.insert(index, id);
            }
        }
        realized
    }

    async fn realize_processor(
        &self,
        group_id: &str,
        definition: &FlowDefinition,
        index: usize,
        spec: &ProcessorSpec,
        layout: &Layout,
        service_ids: &IndexMap,
    ) -> Outcome<String> {
        let mut outcome = Outcome::default();
        let resolved = self.catalog.resolve(&spec.type_key);
        if !resolved.is_known() {
            debug!(type_key = %spec.type_key, "Processor type not in catalog, using it verbatim");
        }

        let handle = match self
            .client
            .create_processor(
                group_id,
                &spec.name,
                &resolved.type_name,
                layout.position_for(index),
                resolved.bundle.clone(),
            )
            .await
        {
            Ok(handle) => handle,
            Err(e) => {
                outcome.error(format!("Failed to create processor '{}': {}", spec.name, e));
                return outcome;
            }
        };
        debug!(name = %spec.name, id = %handle.id, "Created processor");
        outcome.value = Some(handle.id.clone());

        let configuration =
            ProcessorConfiguration::resolve(definition, index, spec, &resolved, service_ids);
        for (property, service_index) in &configuration.unresolved_references {
            outcome.warning(format!(
                "Processor '{}' property '{}' references controller service #{} which was not created",
                spec.name, property, service_index
            ));
        }

        let handle = self
            .push_properties(handle, spec, &configuration.properties, &mut outcome)
            .await;
        self.push_auto_terminate(handle, spec, &configuration.auto_terminate, &mut outcome)
            .await;

        outcome
    }

    async fn push_properties(
        &self,
        handle: Versioned,
        spec: &ProcessorSpec,
        properties: &PropertyMap,
        outcome: &mut Outcome<String>,
    ) -> Versioned {
        if properties.is_empty() {
            return handle;
        }

        match self
            .client
            .update_processor_properties(&handle, properties)
            .await
        {
            Ok(update) => {
                if !update.validation_status.is_valid() {
                    let mut message = format!(
                        "Processor '{}' reported {} after configuration",
                        spec.name, update.validation_status
                    );
                    if !update.validation_errors.is_empty() {
                        message.push_str(": ");
                        message.push_str(&update.validation_errors.join("; "));
                    }
                    outcome.warning(message);
                }
                handle.advance(update.revision)
            }
            Err(e) => {
                outcome.error(format!(
                    "Failed to update properties for processor '{}': {}",
                    spec.name, e
                ));
                handle
            }
        }
    }

    async fn push_auto_terminate(
        &self,
        handle: Versioned,
        spec: &ProcessorSpec,
        relationships: &[String],
        outcome: &mut Outcome<String>,
    ) -> Versioned {
        if relationships.is_empty() {
            return handle;
        }

        match self
            .client
            .update_processor_auto_terminate(&handle, relationships)
            .await
        {
            Ok(revision) => {
                debug!(name = %spec.name, ?relationships, "Auto-terminated relationships");
                handle.advance(revision)
            }
            Err(e) => {
                outcome.error(format!(
                    "Failed to set auto-terminated relationships for processor '{}': {}",
                    spec.name, e
                ));
                handle
            }
        }
    }

    async fn create_connections(
        &self,
        group_id: &str,
        definition: &FlowDefinition,
        processor_ids: &IndexMap,
        result: &mut FlowBuildResult,
    ) {
        if definition.connections.is_empty() {
            return;
        }
        info!(count = definition.connections.len(), "Creating connections");

        for connection in &definition.connections {
            let label = connection_label(definition, connection);
            let source = processor_ids.get(&connection.from_index);
            let destination = processor_ids.get(&connection.to_index);

            let (Some(source), Some(destination)) = (source, destination) else {
                let missing: Vec<String> = [
                    (source.is_none(), connection.from_index),
                    (destination.is_none(), connection.to_index),
                ]
                .into_iter()
                .filter(|(is_missing, _)| *is_missing)
                .map(|(_, index)| format!("#{}", index))
                .collect();
                let message = format!(
                    "Skipping connection {}: processor {} was not created",
                    label,
                    missing.join(" and ")
                );
                error!("{}", message);
                result.record_error(message);
                continue;
            };

            match self
                .client
                .create_connection(group_id, source, destination, &connection.relationships)
                .await
            {
                Ok(id) => {
                    debug!(connection = %label, id = %id, "Created connection");
                    result.connection_ids.push(id);
                }
                Err(e) => {
                    let message = format!("Failed to create connection {}: {}", label, e);
                    error!("{}", message);
                    result.record_error(message);
                }
            }
        }
    }

    /// Start every processor created by a build, in result order
    #[instrument(skip_all, fields(processors = result.processor_ids.len()))]
    pub async fn start_flow(&self, result: &FlowBuildResult) -> RunStateReport {
        let mut report = RunStateReport::default();
        for id in &result.processor_ids {
            match self.client.set_processor_run_state(id, RunState::Running).await {
                Ok(()) => report.updated.push(id.clone()),
                Err(e) => {
                    warn!(processor = %id, error = %e, "Failed to start processor");
                    report.errors.push(format!("Failed to start processor {}: {}", id, e));
                }
            }
        }
        info!(started = report.updated.len(), failed = report.errors.len(), "Start requested");
        report
    }

    /// Stop every processor of a build, then disable its controller services
    #[instrument(skip_all, fields(processors = result.processor_ids.len()))]
    pub async fn stop_flow(&self, result: &FlowBuildResult) -> RunStateReport {
        let mut report = RunStateReport::default();
        for id in &result.processor_ids {
            match self.client.set_processor_run_state(id, RunState::Stopped).await {
                Ok(()) => report.updated.push(id.clone()),
                Err(e) => report.errors.push(format!("Failed to stop processor {}: {}", id, e)),
            }
        }
        for id in &result.controller_service_ids {
            match self.client.disable_controller_service(id).await {
                Ok(()) => report.updated.push(id.clone()),
                Err(e) => report
                    .errors
                    .push(format!("Failed to disable controller service {}: {}", id, e)),
            }
        }
        info!(stopped = report.updated.len(), failed = report.errors.len(), "Stop requested");
        report
    }
}

fn connection_label(definition: &FlowDefinition, connection: &ConnectionSpec) -> String {
    let name = |index: usize| {
        definition
            .processor_name(index)
            .map(|n| format!("'{}'", n))
            .unwrap_or_else(|| format!("#{}", index))
    };
    format!("{} -> {}", name(connection.from_index), name(connection.to_index))
}
