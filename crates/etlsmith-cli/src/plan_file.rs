use std::path::Path;

use etlsmith_core::{CoreError, FlowDefinition};

/// Read a saved plan; `.yaml`/`.yml` files are parsed as YAML, anything else as JSON
pub fn load_plan(path: &Path) -> Result<FlowDefinition, CoreError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        CoreError::ConfigurationError(format!("Cannot read plan file {}: {}", path.display(), e))
    })?;
    parse_plan(path, &contents)
}

fn parse_plan(path: &Path, contents: &str) -> Result<FlowDefinition, CoreError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            FlowDefinition::from_yaml(contents)
        }
        _ => FlowDefinition::from_json(contents),
    }
}
