use crate::CoreError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Property map sent to the remote engine. Ordered so merges and pushes are deterministic.
pub type PropertyMap = BTreeMap<String, String>;

/// An abstract, index-based plan for a dataflow.
///
/// Processors and controller services are referenced by their position in
/// the respective lists; no remote identifiers exist until the plan is
/// realized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowDefinition {
    /// Processors, in creation order
    #[serde(default)]
    pub processors: Vec<ProcessorSpec>,

    /// Connections between processors, in creation order
    #[serde(default)]
    pub connections: Vec<ConnectionSpec>,

    /// Controller services, created before any processor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller_services: Option<Vec<ServiceSpec>>,
}

/// A processor to create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorSpec {
    /// Display name of the processor
    pub name: String,

    /// Catalog key (or a fully qualified remote type)
    #[serde(rename = "type")]
    pub type_key: String,

    /// Explicit property values; these always win over catalog defaults
    #[serde(default, deserialize_with = "deserialize_property_map")]
    pub properties: PropertyMap,

    /// Relationships to auto-terminate
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "auto_terminated_relationships")]
    pub auto_terminate: Option<Vec<String>>,
}

/// A connection between two processors of the same definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSpec {
    /// Index of the source processor
    #[serde(alias = "from")]
    pub from_index: usize,

    /// Index of the destination processor
    #[serde(alias = "to")]
    pub to_index: usize,

    /// Relationships routed over this connection
    pub relationships: Vec<String>,
}

/// A controller service to create and enable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    /// Display name of the service
    pub name: String,

    /// Catalog key (or a fully qualified remote type)
    #[serde(rename = "type")]
    pub type_key: String,

    /// Explicit property values
    #[serde(default, deserialize_with = "deserialize_property_map")]
    pub properties: PropertyMap,

    /// Processor properties that must hold this service's identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_by: Option<Vec<ServiceReference>>,
}

/// Binds a processor property to a controller service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceReference {
    /// Index of the referencing processor
    pub processor_index: usize,

    /// Property of that processor which receives the service identifier
    pub property_name: String,
}

impl FlowDefinition {
    /// Parse a definition from JSON. Surrounding markdown code fences are ignored.
    pub fn from_json(input: &str) -> Result<Self, CoreError> {
        let body = strip_code_fences(input);
        if body.is_empty() {
            return Err(CoreError::InvalidDefinition("empty document".to_string()));
        }
        serde_json::from_str(body).map_err(|e| CoreError::InvalidDefinition(e.to_string()))
    }

    /// Parse a definition from YAML
    pub fn from_yaml(input: &str) -> Result<Self, CoreError> {
        serde_yaml::from_str(strip_code_fences(input))
            .map_err(|e| CoreError::InvalidDefinition(e.to_string()))
    }

    /// Controller services, empty when the definition has none
    pub fn services(&self) -> &[ServiceSpec] {
        self.controller_services.as_deref().unwrap_or(&[])
    }

    /// Indices of processors that feed at least one connection
    pub fn source_indices(&self) -> HashSet<usize> {
        self.connections.iter().map(|c| c.from_index).collect()
    }

    /// Whether the processor at `index` has an outgoing connection
    pub fn is_source(&self, index: usize) -> bool {
        self.connections.iter().any(|c| c.from_index == index)
    }

    /// `(property_name, service_index)` bindings targeting the processor at `index`
    pub fn references_to(&self, index: usize) -> Vec<(&str, usize)> {
        self.services()
            .iter()
            .enumerate()
            .flat_map(|(service_index, service)| {
                service
                    .referenced_by
                    .iter()
                    .flatten()
                    .filter(move |r| r.processor_index == index)
                    .map(move |r| (r.property_name.as_str(), service_index))
            })
            .collect()
    }

    /// Display name of the processor at `index`, if it exists
    pub fn processor_name(&self, index: usize) -> Option<&str> {
        self.processors.get(index).map(|p| p.name.as_str())
    }
}

impl fmt::Display for FlowDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let services = self.services();
        if !services.is_empty() {
            writeln!(f, "Controller services:")?;
            for (i, service) in services.iter().enumerate() {
                writeln!(f, "  [{}] {} ({})", i, service.name, service.type_key)?;
            }
        }

        writeln!(f, "Processors:")?;
        for (i, processor) in self.processors.iter().enumerate() {
            writeln!(f, "  [{}] {} ({})", i, processor.name, processor.type_key)?;
            for (key, value) in &processor.properties {
                writeln!(f, "        {} = {}", key, value)?;
            }
        }

        writeln!(f, "Connections:")?;
        for connection in &self.connections {
            let from = self.processor_name(connection.from_index).unwrap_or("?");
            let to = self.processor_name(connection.to_index).unwrap_or("?");
            writeln!(f, "  {} -> {} [{}]", from, to, connection.relationships.join(", "))?;
        }
        Ok(())
    }
}

/// Removes a surrounding ```json ... ``` fence, as LLMs tend to add one.
fn strip_code_fences(input: &str) -> &str {
    let trimmed = input.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Accepts string, number and boolean property values; planners often emit `"Batch Size": 1`.
fn deserialize_property_map<'de, D>(deserializer: D) -> Result<PropertyMap, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, serde_json::Value>>::deserialize(deserializer)?;
    let mut properties = PropertyMap::new();
    for (key, value) in raw.unwrap_or_default() {
        let value = match value {
            serde_json::Value::Null => continue,
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        properties.insert(key, value);
    }
    Ok(properties)
}
