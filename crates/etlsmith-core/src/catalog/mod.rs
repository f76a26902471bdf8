//! Processor and controller-service catalog.
//!
//! Maps the short names a planner uses ("PublishMQTT", "DBCPConnectionPool")
//! to remote type identifiers, bundle coordinates, default properties and a
//! completion policy. Unknown names are not an error: they resolve to
//! themselves with no bundle and no policy.

pub mod policy;
mod standard;

pub use policy::{merge_properties, CompletionRule};

use crate::domain::PropertyMap;
use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Coordinates of the NAR bundle that provides a type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bundle {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

/// Whether an entry describes a processor or a controller service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentKind {
    Processor,
    ControllerService,
}

/// A single catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Short logical name
    pub key: String,
    pub kind: ComponentKind,
    /// Fully qualified remote type
    pub type_name: String,
    pub bundle: Bundle,
    /// One-line description, used when prompting a planner
    pub description: String,
    /// Relationships the type exposes (processors only)
    pub relationships: Vec<String>,
    pub default_properties: PropertyMap,
    pub rules: Vec<CompletionRule>,
}

impl CatalogEntry {
    /// Simple class name of the remote type
    pub fn simple_name(&self) -> &str {
        simple_name(&self.type_name)
    }
}

/// The outcome of resolving a type key
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedType<'a> {
    /// Remote type to create
    pub type_name: String,
    /// Bundle to request, if the type is known
    pub bundle: Option<Bundle>,
    /// Matching entry, if any
    pub entry: Option<&'a CatalogEntry>,
}

impl<'a> ResolvedType<'a> {
    /// Default properties of the entry, or an empty map
    pub fn default_properties(&self) -> PropertyMap {
        self.entry
            .map(|e| e.default_properties.clone())
            .unwrap_or_default()
    }

    /// Completion rules of the entry, or none
    pub fn rules(&self) -> &'a [CompletionRule] {
        self.entry.map(|e| e.rules.as_slice()).unwrap_or(&[])
    }

    /// Whether the key matched a catalog entry
    pub fn is_known(&self) -> bool {
        self.entry.is_some()
    }
}

/// Read-only lookup table of known types
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    // short keys and fully qualified types
    index: HashMap<String, usize>,
    // bare class names, consulted only for undotted lookups
    simple_names: HashMap<String, usize>,
}

impl Catalog {
    /// An empty catalog; every key resolves verbatim
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in catalog, with bundles pinned to `nifi_version`
    pub fn standard(nifi_version: &str) -> Self {
        let mut catalog = Self::empty();
        for entry in standard::entries(nifi_version) {
            let inserted = catalog.insert(entry);
            debug_assert!(inserted.is_ok(), "built-in catalog keys must be unique");
        }
        catalog
    }

    /// Add an entry. Keys are case-insensitive and must be unique.
    pub fn insert(&mut self, entry: CatalogEntry) -> Result<(), CoreError> {
        let key = entry.key.to_ascii_lowercase();
        if self.index.contains_key(&key) {
            return Err(CoreError::CatalogError(format!(
                "duplicate catalog key: {}",
                entry.key
            )));
        }
        let position = self.entries.len();
        self.index.insert(key, position);
        self.index
            .entry(entry.type_name.to_ascii_lowercase())
            .or_insert(position);
        self.simple_names
            .entry(entry.simple_name().to_ascii_lowercase())
            .or_insert(position);
        self.entries.push(entry);
        Ok(())
    }

    /// Find an entry by short key, exact fully qualified type, or bare class name.
    ///
    /// A dotted key that matches no entry is foreign and never falls back to
    /// its last segment.
    pub fn get(&self, key: &str) -> Option<&CatalogEntry> {
        let needle = key.trim().to_ascii_lowercase();
        self.index
            .get(&needle)
            .or_else(|| {
                if needle.contains('.') {
                    None
                } else {
                    self.simple_names.get(&needle)
                }
            })
            .map(|&i| &self.entries[i])
    }

    /// Resolve a key, passing unknown keys through verbatim
    pub fn resolve(&self, key: &str) -> ResolvedType<'_> {
        match self.get(key) {
            Some(entry) => ResolvedType {
                type_name: entry.type_name.clone(),
                bundle: Some(entry.bundle.clone()),
                entry: Some(entry),
            },
            None => ResolvedType {
                type_name: key.to_string(),
                bundle: None,
                entry: None,
            },
        }
    }

    /// All entries of one kind, in insertion order
    pub fn entries_of(&self, kind: ComponentKind) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(move |e| e.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn simple_name(type_name: &str) -> &str {
    type_name.rsplit('.').next().unwrap_or(type_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_key() {
        let catalog = Catalog::standard("1.25.0");
        let resolved = catalog.resolve("PublishMQTT");

        assert_eq!(resolved.type_name, "org.apache.nifi.processors.mqtt.PublishMQTT");
        let bundle = resolved.bundle.as_ref().expect("bundle");
        assert_eq!(bundle.artifact, "nifi-mqtt-nar");
        assert_eq!(bundle.version, "1.25.0");
        assert!(!resolved.rules().is_empty());
    }

    #[test]
    fn test_resolve_by_type_name_and_case() {
        let catalog = Catalog::standard("1.25.0");
        assert!(catalog.resolve("org.apache.nifi.processors.standard.GenerateFlowFile").is_known());
        assert!(catalog.resolve("generateflowfile").is_known());
        assert!(catalog.resolve("ORG.APACHE.NIFI.PROCESSORS.STANDARD.PUTFILE").is_known());
    }

    #[test]
    fn test_foreign_package_with_known_class_name_is_verbatim() {
        let catalog = Catalog::standard("1.25.0");
        let resolved = catalog.resolve("com.acme.nifi.PutFile");

        assert!(!resolved.is_known());
        assert_eq!(resolved.type_name, "com.acme.nifi.PutFile");
        assert!(resolved.bundle.is_none());
        assert!(resolved.rules().is_empty());
    }

    #[test]
    fn test_unknown_key_passes_through_verbatim() {
        let catalog = Catalog::standard("1.25.0");
        let resolved = catalog.resolve("com.example.CustomProcessor");

        assert_eq!(resolved.type_name, "com.example.CustomProcessor");
        assert!(resolved.bundle.is_none());
        assert!(resolved.default_properties().is_empty());
        assert!(resolved.rules().is_empty());
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut catalog = Catalog::standard("1.25.0");
        let entry = catalog.get("LogAttribute").cloned().unwrap();
        assert!(matches!(catalog.insert(entry), Err(CoreError::CatalogError(_))));
    }

    #[test]
    fn test_standard_catalog_has_both_kinds() {
        let catalog = Catalog::standard("1.25.0");
        assert!(catalog.entries_of(ComponentKind::Processor).count() > 10);
        assert!(catalog.entries_of(ComponentKind::ControllerService).count() >= 5);
        assert!(catalog
            .entries_of(ComponentKind::ControllerService)
            .all(|e| e.relationships.is_empty()));
    }
}
