//! Wire representations of the NiFi REST entities the adapter touches.
//!
//! Only the fields the adapter reads or writes are modeled; everything else
//! NiFi returns is ignored on decode.

use etlsmith_core::{Bundle, Position, PropertyMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Optimistic-concurrency token carried by every mutable entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevisionDto {
    #[serde(default)]
    pub version: i64,
}

impl RevisionDto {
    pub fn new(version: i64) -> Self {
        Self { version }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionDto {
    pub x: f64,
    pub y: f64,
}

impl From<Position> for PositionDto {
    fn from(position: Position) -> Self {
        Self {
            x: position.x,
            y: position.y,
        }
    }
}

impl From<PositionDto> for Position {
    fn from(dto: PositionDto) -> Self {
        Position::new(dto.x, dto.y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleDto {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

impl From<Bundle> for BundleDto {
    fn from(bundle: Bundle) -> Self {
        Self {
            group: bundle.group,
            artifact: bundle.artifact,
            version: bundle.version,
        }
    }
}

/// Request envelope: a revision plus the component being created or changed
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<C> {
    pub revision: RevisionDto,
    pub component: C,
}

/// `PUT .../run-status` body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatusEntity<'a> {
    pub revision: RevisionDto,
    pub state: &'a str,
}

// NiFi reports unset properties as null
pub type WireProperties = BTreeMap<String, Option<String>>;

pub fn to_wire_properties(properties: &PropertyMap) -> WireProperties {
    properties
        .iter()
        .map(|(k, v)| (k.clone(), Some(v.clone())))
        .collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorConfigDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<WireProperties>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_terminated_relationships: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle: Option<BundleDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ProcessorConfigDto>,
    #[serde(skip_serializing)]
    pub validation_status: Option<String>,
    #[serde(skip_serializing)]
    pub validation_errors: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorEntity {
    pub id: String,
    #[serde(default)]
    pub revision: RevisionDto,
    #[serde(default)]
    pub position: Option<PositionDto>,
    #[serde(default)]
    pub component: Option<ProcessorDto>,
}

impl ProcessorEntity {
    pub fn position(&self) -> Option<Position> {
        self.position
            .or_else(|| self.component.as_ref().and_then(|c| c.position))
            .map(Position::from)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectableDto {
    pub id: String,
    pub group_id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl ConnectableDto {
    pub fn processor(id: &str, group_id: &str) -> Self {
        Self {
            id: id.to_string(),
            group_id: group_id.to_string(),
            kind: "PROCESSOR",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDto {
    pub source: ConnectableDto,
    pub destination: ConnectableDto,
    pub selected_relationships: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionEntity {
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerServiceDto {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle: Option<BundleDto>,
    pub properties: WireProperties,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ControllerServiceEntity {
    pub id: String,
    #[serde(default)]
    pub revision: RevisionDto,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlowDto {
    #[serde(default)]
    pub processors: Vec<ProcessorEntity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessGroupFlowDto {
    pub id: String,
    #[serde(default)]
    pub flow: FlowDto,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessGroupFlowEntity {
    pub process_group_flow: ProcessGroupFlowDto,
}
