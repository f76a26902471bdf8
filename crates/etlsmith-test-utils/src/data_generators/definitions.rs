use etlsmith_core::{
    ConnectionSpec, FlowDefinition, ProcessorSpec, PropertyMap, ServiceReference, ServiceSpec,
};

/// A processor spec with no properties
pub fn processor(name: &str, type_key: &str) -> ProcessorSpec {
    ProcessorSpec {
        name: name.to_string(),
        type_key: type_key.to_string(),
        properties: PropertyMap::new(),
        auto_terminate: None,
    }
}

/// A processor spec with explicit properties
pub fn processor_with(name: &str, type_key: &str, properties: &[(&str, &str)]) -> ProcessorSpec {
    ProcessorSpec {
        properties: properties
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        ..processor(name, type_key)
    }
}

/// A connection routing `relationships` from `from_index` to `to_index`
pub fn connection(from_index: usize, to_index: usize, relationships: &[&str]) -> ConnectionSpec {
    ConnectionSpec {
        from_index,
        to_index,
        relationships: relationships.iter().map(|r| r.to_string()).collect(),
    }
}

/// A controller service referenced by `(processor_index, property_name)` pairs
pub fn service(name: &str, type_key: &str, referenced_by: &[(usize, &str)]) -> ServiceSpec {
    ServiceSpec {
        name: name.to_string(),
        type_key: type_key.to_string(),
        properties: PropertyMap::new(),
        referenced_by: if referenced_by.is_empty() {
            None
        } else {
            Some(
                referenced_by
                    .iter()
                    .map(|(processor_index, property_name)| ServiceReference {
                        processor_index: *processor_index,
                        property_name: property_name.to_string(),
                    })
                    .collect(),
            )
        },
    }
}

/// `count` UpdateAttribute processors chained on "success"
pub fn linear_definition(count: usize) -> FlowDefinition {
    FlowDefinition {
        processors: (0..count)
            .map(|i| processor(&format!("Step {}", i), "UpdateAttribute"))
            .collect(),
        connections: (1..count).map(|i| connection(i - 1, i, &["success"])).collect(),
        controller_services: None,
    }
}

/// Generate -> Publish over MQTT, with the publisher left as a sink
pub fn mqtt_publish_definition() -> FlowDefinition {
    FlowDefinition {
        processors: vec![
            processor("Generate Readings", "GenerateFlowFile"),
            processor_with(
                "Publish Readings",
                "PublishMQTT",
                &[("Topic", "sensors/readings")],
            ),
        ],
        connections: vec![connection(0, 1, &["success"])],
        controller_services: None,
    }
}

/// Database query through a pooled connection, logged at the end
pub fn pooled_query_definition() -> FlowDefinition {
    FlowDefinition {
        processors: vec![
            processor_with("Fetch Orders", "QueryDatabaseTable", &[("Table Name", "orders")]),
            processor("Log Orders", "LogAttribute"),
        ],
        connections: vec![connection(0, 1, &["success"])],
        controller_services: Some(vec![service(
            "Orders Pool",
            "DBCPConnectionPool",
            &[(0, "Database Connection Pooling Service")],
        )]),
    }
}
