//! System prompt generation.
//!
//! The prompt is derived from the catalog so the model only ever sees type
//! keys the realization engine knows how to resolve.

use etlsmith_core::{Catalog, CatalogEntry, ComponentKind};
use std::fmt::Write;

const FORMAT: &str = r#"Respond with a single JSON object of this shape and nothing else:

{
  "processors": [
    {"name": "Read Input", "type": "GetFile", "properties": {"Input Directory": "/data/in"}}
  ],
  "connections": [
    {"from_index": 0, "to_index": 1, "relationships": ["success"]}
  ],
  "controller_services": [
    {"name": "Reader", "type": "JsonTreeReader", "properties": {},
     "referenced_by": [{"processor_index": 1, "property_name": "Record Reader"}]}
  ]
}"#;

const RULES: &[&str] = &[
    "Processor and connection indices are zero-based positions in the processors array.",
    "Every connection names at least one relationship the source processor exposes.",
    "Only set properties that differ from the defaults listed above.",
    "A processor property that must point at a controller service is declared in that service's referenced_by list, never as a literal id.",
    "Leave controller_services out entirely when no service is needed.",
    "Give every processor a short, unique, human-readable name.",
];

fn describe(out: &mut String, entry: &CatalogEntry) {
    let _ = write!(out, "- {}: {}", entry.key, entry.description);
    if !entry.relationships.is_empty() {
        let _ = write!(out, " [relationships: {}]", entry.relationships.join(", "));
    }
    if !entry.default_properties.is_empty() {
        let defaults: Vec<String> = entry
            .default_properties
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        let _ = write!(out, " [defaults: {}]", defaults.join("; "));
    }
    out.push('\n');
}

/// Build the system prompt for `catalog`
pub fn system_prompt(catalog: &Catalog) -> String {
    let mut out = String::from(
        "You design Apache NiFi data flows. Translate the user's description into a flow definition.\n\n",
    );

    out.push_str("Available processor types:\n");
    for entry in catalog.entries_of(ComponentKind::Processor) {
        describe(&mut out, entry);
    }

    let mut services = catalog.entries_of(ComponentKind::ControllerService).peekable();
    if services.peek().is_some() {
        out.push_str("\nAvailable controller service types:\n");
        for entry in services {
            describe(&mut out, entry);
        }
    }

    out.push('\n');
    out.push_str(FORMAT);
    out.push_str("\n\nRules:\n");
    for rule in RULES {
        let _ = writeln!(out, "- {}", rule);
    }
    out
}
