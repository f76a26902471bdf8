use etlsmith_core::{
    Catalog, ClientError, FlowBuilder, FlowDefinition, LayoutConfig, Position, RunState,
};
use etlsmith_test_utils::{
    connection, init_test_tracing, linear_definition, mqtt_publish_definition, pooled_query_definition,
    processor, processor_with, service, EngineCall, FakeFlowEngine, Failure, MockFlowEngineClient,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn builder_for(engine: &FakeFlowEngine) -> FlowBuilder {
    init_test_tracing();
    FlowBuilder::new(
        Arc::new(engine.clone()),
        Arc::new(Catalog::standard("1.25.0")),
    )
}

#[tokio::test]
async fn test_successful_run_creates_every_object() {
    let engine = FakeFlowEngine::new();
    let builder = builder_for(&engine);
    let definition = linear_definition(4);

    let result = builder.build_flow(&definition).await;

    assert!(result.success, "unexpected errors: {:?}", result.errors);
    assert!(result.errors.is_empty());
    assert_eq!(result.processor_ids.len(), 4);
    assert_eq!(result.connection_ids.len(), 3);
    assert_eq!(result.process_group_id.as_deref(), Some(engine.group_id()));
    assert_eq!(engine.connections().len(), 3);
}

#[tokio::test]
async fn test_empty_definition_succeeds() {
    let engine = FakeFlowEngine::new();
    let result = builder_for(&engine).build_flow(&FlowDefinition::default()).await;

    assert!(result.success);
    assert_eq!(result.created_count(), 0);
}

#[tokio::test]
async fn test_phases_run_in_order() {
    let engine = FakeFlowEngine::new();
    let result = builder_for(&engine).build_flow(&pooled_query_definition()).await;
    assert!(result.success, "unexpected errors: {:?}", result.errors);

    let calls = engine.calls();
    let position = |predicate: &dyn Fn(&EngineCall) -> bool| {
        calls.iter().position(|c| predicate(c)).expect("call not found")
    };
    let target = position(&|c| matches!(c, EngineCall::TargetGroup));
    let enable = position(&|c| matches!(c, EngineCall::EnableService { .. }));
    let topology = position(&|c| matches!(c, EngineCall::Topology { .. }));
    let first_processor = position(&|c| matches!(c, EngineCall::CreateProcessor { .. }));
    let first_connection = position(&|c| matches!(c, EngineCall::CreateConnection { .. }));
    let last_processor_update = calls
        .iter()
        .rposition(|c| matches!(c, EngineCall::UpdateProperties { .. } | EngineCall::AutoTerminate { .. }))
        .unwrap();

    assert!(target < enable);
    assert!(enable < topology);
    assert!(topology < first_processor);
    assert!(last_processor_update < first_connection);
}

#[tokio::test]
async fn test_layout_starts_right_of_existing_processors() {
    let engine = FakeFlowEngine::new().with_existing_positions(vec![
        Position::new(0.0, 0.0),
        Position::new(300.0, 0.0),
        Position::new(600.0, 200.0),
    ]);
    let layout = LayoutConfig::default();

    builder_for(&engine).build_flow(&linear_definition(2)).await;

    let processors = engine.processors();
    assert_eq!(processors[0].position.x, 600.0 + layout.spacing_x);
    assert_eq!(processors[1].position.x, 600.0 + layout.spacing_x);
    assert_eq!(processors[1].position.y - processors[0].position.y, layout.row_height);
}

#[tokio::test]
async fn test_layout_uses_default_offset_in_empty_group() {
    let engine = FakeFlowEngine::new();
    builder_for(&engine).build_flow(&linear_definition(1)).await;

    assert_eq!(
        engine.processors()[0].position.x,
        LayoutConfig::default().default_start_x
    );
}

#[tokio::test]
async fn test_topology_failure_is_advisory() {
    let engine = FakeFlowEngine::new().fail_on(Failure::Topology);
    let result = builder_for(&engine).build_flow(&linear_definition(2)).await;

    assert!(result.success);
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(
        engine.processors()[0].position.x,
        LayoutConfig::default().default_start_x
    );
}

#[tokio::test]
async fn test_unconnected_mqtt_publisher_auto_terminates() {
    let engine = FakeFlowEngine::new();
    let definition = FlowDefinition {
        processors: vec![processor_with("Publish", "PublishMQTT", &[("Topic", "out")])],
        connections: Vec::new(),
        controller_services: None,
    };

    let result = builder_for(&engine).build_flow(&definition).await;
    assert!(result.success, "unexpected errors: {:?}", result.errors);

    let publish = engine.processor("Publish").unwrap();
    assert!(publish.auto_terminated.contains(&"success".to_string()));
    assert!(publish.auto_terminated.contains(&"failure".to_string()));
    assert_eq!(publish.properties["Quality of Service(QoS)"], "0");
    assert_eq!(publish.properties["Topic"], "out");
}

#[tokio::test]
async fn test_sink_is_inferred_regardless_of_list_position() {
    let engine = FakeFlowEngine::new();
    // The sink comes first in the list; only the connection list decides
    let definition = FlowDefinition {
        processors: vec![
            processor("Store", "PutFile"),
            processor("Read", "GetFile"),
        ],
        connections: vec![connection(1, 0, &["success"])],
        controller_services: None,
    };

    builder_for(&engine).build_flow(&definition).await;

    let store = engine.processor("Store").unwrap();
    assert_eq!(store.auto_terminated, vec!["success".to_string(), "failure".to_string()]);
    assert!(engine.processor("Read").unwrap().auto_terminated.is_empty());
}

#[tokio::test]
async fn test_connected_publisher_keeps_relationships() {
    let engine = FakeFlowEngine::new();
    let mut definition = mqtt_publish_definition();
    definition.processors.push(processor("Audit", "LogAttribute"));
    definition.connections.push(connection(1, 2, &["failure"]));

    let result = builder_for(&engine).build_flow(&definition).await;
    assert!(result.success, "unexpected errors: {:?}", result.errors);
    assert!(engine.processor("Publish Readings").unwrap().auto_terminated.is_empty());
    assert_eq!(
        engine.processor("Audit").unwrap().auto_terminated,
        vec!["success".to_string()]
    );
}

#[tokio::test]
async fn test_failed_destination_yields_creation_and_dangling_errors() {
    let engine = FakeFlowEngine::new().fail_on(Failure::CreateProcessor("B".to_string()));
    let definition = FlowDefinition {
        processors: vec![processor("A", "GetFile"), processor("B", "PutFile")],
        connections: vec![connection(0, 1, &["success"])],
        controller_services: None,
    };

    let result = builder_for(&engine).build_flow(&definition).await;

    assert!(!result.success);
    assert_eq!(result.processor_ids, vec![engine.processor("A").unwrap().id]);
    assert!(engine.processor("B").is_none());
    assert_eq!(result.errors.len(), 2, "errors: {:?}", result.errors);
    assert!(result.errors[0].contains("'B'"));
    assert!(result.errors[1].contains("'A' -> 'B'"));
    assert!(result.connection_ids.is_empty());
    assert_eq!(
        engine.count_calls(|c| matches!(c, EngineCall::CreateConnection { .. })),
        0
    );
}

#[tokio::test]
async fn test_dangling_connection_never_reaches_engine() {
    init_test_tracing();
    let mut mock = MockFlowEngineClient::new();
    mock.expect_default_target_group_id()
        .times(1)
        .returning(|| Ok("root".to_string()));
    mock.expect_group_topology().returning(|_| Ok(Vec::new()));
    mock.expect_create_processor()
        .withf(|_, name, _, _, _| name.to_string() == "Source")
        .returning(|_, _, _, _, _| Ok(etlsmith_core::Versioned::new("src-1", 1)));
    mock.expect_create_processor()
        .withf(|_, name, _, _, _| name.to_string() == "Missing")
        .returning(|_, _, _, _, _| {
            Err(ClientError::Http {
                status: 400,
                body: "Unknown type".to_string(),
            })
        });
    mock.expect_update_processor_properties().returning(|processor, _| {
        Ok(etlsmith_core::PropertyUpdate {
            revision: processor.revision + 1,
            validation_status: etlsmith_core::ValidationStatus::Valid,
            validation_errors: Vec::new(),
        })
    });
    mock.expect_update_processor_auto_terminate()
        .returning(|processor, _| Ok(processor.revision + 1));
    mock.expect_create_connection().times(0);

    let builder = FlowBuilder::new(Arc::new(mock), Arc::new(Catalog::standard("1.25.0")));
    let definition = FlowDefinition {
        processors: vec![processor("Source", "GetFile"), processor("Missing", "Nope")],
        connections: vec![
            connection(0, 1, &["success"]),
            connection(0, 5, &["success"]),
        ],
        controller_services: None,
    };

    let result = builder.build_flow(&definition).await;

    // One creation error plus exactly one error per dangling connection
    assert_eq!(result.errors.len(), 3, "errors: {:?}", result.errors);
    assert!(result.errors[2].contains("#5"));
}

#[tokio::test]
async fn test_connection_with_both_ends_missing_is_one_error() {
    init_test_tracing();
    let mut mock = MockFlowEngineClient::new();
    mock.expect_default_target_group_id()
        .returning(|| Ok("root".to_string()));
    mock.expect_group_topology().returning(|_| Ok(Vec::new()));
    mock.expect_create_processor()
        .times(1)
        .returning(|_, _, _, _, _| Ok(etlsmith_core::Versioned::new("src-1", 1)));
    mock.expect_update_processor_properties().returning(|processor, _| {
        Ok(etlsmith_core::PropertyUpdate {
            revision: processor.revision + 1,
            validation_status: etlsmith_core::ValidationStatus::Valid,
            validation_errors: Vec::new(),
        })
    });
    mock.expect_update_processor_auto_terminate()
        .returning(|processor, _| Ok(processor.revision + 1));
    mock.expect_create_connection().times(0);

    let builder = FlowBuilder::new(Arc::new(mock), Arc::new(Catalog::standard("1.25.0")));
    let definition = FlowDefinition {
        processors: vec![processor("Source", "GetFile")],
        connections: vec![connection(7, 9, &["success"])],
        controller_services: None,
    };

    let result = builder.build_flow(&definition).await;

    assert!(!result.success);
    assert_eq!(result.errors.len(), 1, "errors: {:?}", result.errors);
    assert!(result.errors[0].contains("#7"));
    assert!(result.errors[0].contains("#9"));
    assert_eq!(result.processor_ids, vec!["src-1".to_string()]);
    assert!(result.connection_ids.is_empty());
}

#[tokio::test]
async fn test_service_reference_beats_catalog_default() {
    init_test_tracing();
    let engine = FakeFlowEngine::new();
    let mut catalog = Catalog::standard("1.25.0");
    let mut entry = catalog.get("ConvertRecord").cloned().unwrap();
    entry.key = "DefaultedConvert".to_string();
    entry.type_name = "com.example.DefaultedConvert".to_string();
    entry
        .default_properties
        .insert("Record Reader".to_string(), "catalog-default-reader".to_string());
    catalog.insert(entry).unwrap();
    let builder = FlowBuilder::new(Arc::new(engine.clone()), Arc::new(catalog));

    let definition = FlowDefinition {
        processors: vec![processor("Convert", "DefaultedConvert")],
        connections: Vec::new(),
        controller_services: Some(vec![service("Reader", "JsonTreeReader", &[(0, "Record Reader")])]),
    };

    let result = builder.build_flow(&definition).await;
    assert!(result.success, "unexpected errors: {:?}", result.errors);

    let reader = engine.service("Reader").unwrap();
    assert!(reader.enabled);
    assert_eq!(result.controller_service_ids, vec![reader.id.clone()]);
    assert_eq!(
        engine.processor("Convert").unwrap().properties["Record Reader"],
        reader.id
    );
}

#[tokio::test]
async fn test_pooled_query_uses_realized_service_id() {
    let engine = FakeFlowEngine::new();
    let result = builder_for(&engine).build_flow(&pooled_query_definition()).await;
    assert!(result.success, "unexpected errors: {:?}", result.errors);

    let pool = engine.service("Orders Pool").unwrap();
    assert_eq!(pool.type_name, "org.apache.nifi.dbcp.DBCPConnectionPool");
    assert_eq!(pool.properties["Max Total Connections"], "8");
    let fetch = engine.processor("Fetch Orders").unwrap();
    assert_eq!(fetch.properties["Database Connection Pooling Service"], pool.id);
    assert_eq!(fetch.properties["Table Name"], "orders");
}

#[tokio::test]
async fn test_service_failure_does_not_abort() {
    let engine = FakeFlowEngine::new().fail_on(Failure::CreateService("Orders Pool".to_string()));
    let result = builder_for(&engine).build_flow(&pooled_query_definition()).await;

    assert!(!result.success);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("Orders Pool"));
    assert!(result.controller_service_ids.is_empty());
    assert_eq!(result.processor_ids.len(), 2);
    assert_eq!(result.connection_ids.len(), 1);
    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("Database Connection Pooling Service")));
}

#[tokio::test]
async fn test_enable_failure_keeps_service_usable() {
    let engine = FakeFlowEngine::new().fail_on(Failure::EnableService("Orders Pool".to_string()));
    let result = builder_for(&engine).build_flow(&pooled_query_definition()).await;

    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("enable"));
    let pool = engine.service("Orders Pool").unwrap();
    assert!(!pool.enabled);
    assert_eq!(result.controller_service_ids, vec![pool.id.clone()]);
    assert_eq!(
        engine.processor("Fetch Orders").unwrap().properties["Database Connection Pooling Service"],
        pool.id
    );
}

#[tokio::test]
async fn test_revisions_are_threaded_through_updates() {
    let engine = FakeFlowEngine::new();
    let definition = FlowDefinition {
        processors: vec![processor_with("Log", "LogAttribute", &[("Log Level", "warn")])],
        connections: Vec::new(),
        controller_services: None,
    };

    let result = builder_for(&engine).build_flow(&definition).await;
    assert!(result.success, "unexpected errors: {:?}", result.errors);

    let log = engine.processor("Log").unwrap();
    let updates: Vec<EngineCall> = engine
        .calls()
        .into_iter()
        .filter(|c| matches!(c, EngineCall::UpdateProperties { .. } | EngineCall::AutoTerminate { .. }))
        .collect();
    assert_eq!(
        updates,
        vec![
            EngineCall::UpdateProperties { id: log.id.clone(), revision: 1 },
            EngineCall::AutoTerminate { id: log.id.clone(), revision: 2 },
        ]
    );
    assert_eq!(log.revision, 3);
    assert_eq!(log.properties["Log Level"], "warn");
}

#[tokio::test]
async fn test_configuration_failure_keeps_processor() {
    let engine = FakeFlowEngine::new().fail_on(Failure::UpdateProperties("Log".to_string()));
    let definition = FlowDefinition {
        processors: vec![processor("Log", "LogAttribute")],
        connections: Vec::new(),
        controller_services: None,
    };

    let result = builder_for(&engine).build_flow(&definition).await;

    assert!(!result.success);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("Failed to update properties for processor 'Log'"));
    assert_eq!(result.processor_ids.len(), 1);
    // The auto-terminate update still goes out, with the unchanged revision
    assert_eq!(engine.processor("Log").unwrap().auto_terminated, vec!["success".to_string()]);
}

#[tokio::test]
async fn test_auto_terminate_failure_is_recorded() {
    let engine = FakeFlowEngine::new().fail_on(Failure::AutoTerminate("Store".to_string()));
    let definition = FlowDefinition {
        processors: vec![processor_with("Store", "PutFile", &[("Directory", "/tmp/out")])],
        connections: Vec::new(),
        controller_services: None,
    };

    let result = builder_for(&engine).build_flow(&definition).await;

    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("auto-terminated relationships for processor 'Store'"));
    assert_eq!(result.processor_ids.len(), 1);
}

#[tokio::test]
async fn test_invalid_status_is_only_a_warning() {
    let engine = FakeFlowEngine::new()
        .report_invalid("Step 0", vec!["'Delete Attributes Expression' is invalid".to_string()]);
    let definition = FlowDefinition {
        processors: vec![processor_with("Step 0", "UpdateAttribute", &[("env", "prod")])],
        connections: Vec::new(),
        controller_services: None,
    };

    let result = builder_for(&engine).build_flow(&definition).await;

    assert!(result.success);
    assert_eq!(result.processor_ids.len(), 1);
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].contains("INVALID"));
    assert!(result.warnings[0].contains("Delete Attributes Expression"));
}

#[tokio::test]
async fn test_unknown_type_passes_through_verbatim() {
    let engine = FakeFlowEngine::new();
    let definition = FlowDefinition {
        processors: vec![processor_with("Custom", "com.example.nifi.Custom", &[("mode", "fast")])],
        connections: Vec::new(),
        controller_services: None,
    };

    let result = builder_for(&engine).build_flow(&definition).await;

    assert!(result.success);
    let custom = engine.processor("Custom").unwrap();
    assert_eq!(custom.type_name, "com.example.nifi.Custom");
    assert!(custom.bundle.is_none());
    assert!(custom.auto_terminated.is_empty());
}

#[tokio::test]
async fn test_foreign_type_sharing_a_catalog_class_name_is_verbatim() {
    let engine = FakeFlowEngine::new();
    let definition = FlowDefinition {
        processors: vec![processor("Archive", "com.acme.nifi.PutFile")],
        connections: Vec::new(),
        controller_services: None,
    };

    let result = builder_for(&engine).build_flow(&definition).await;

    assert!(result.success);
    let archive = engine.processor("Archive").unwrap();
    assert_eq!(archive.type_name, "com.acme.nifi.PutFile");
    assert!(archive.bundle.is_none());
    assert!(archive.properties.is_empty());
    assert!(archive.auto_terminated.is_empty());
}

#[tokio::test]
async fn test_generator_gets_sample_content() {
    let engine = FakeFlowEngine::new();
    let definition = FlowDefinition {
        processors: vec![processor_with("Generate", "GenerateFlowFile", &[("Custom Text", "")])],
        connections: Vec::new(),
        controller_services: None,
    };

    builder_for(&engine).build_flow(&definition).await;

    let generate = engine.processor("Generate").unwrap();
    assert!(!generate.properties["Custom Text"].is_empty());
    assert_eq!(generate.properties["Data Format"], "Text");
    let bundle = generate.bundle.unwrap();
    assert_eq!(bundle.artifact, "nifi-standard-nar");
    assert_eq!(bundle.version, "1.25.0");
}

#[tokio::test]
async fn test_target_failure_short_circuits() {
    let engine = FakeFlowEngine::new().fail_on(Failure::TargetGroup);
    let result = builder_for(&engine).build_flow(&pooled_query_definition()).await;

    assert!(!result.success);
    assert!(result.process_group_id.is_none());
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("target process group"));
    assert_eq!(engine.calls(), vec![EngineCall::TargetGroup]);
}

#[tokio::test]
async fn test_start_and_stop_flow() {
    let engine = FakeFlowEngine::new();
    let builder = builder_for(&engine);
    let result = builder.build_flow(&pooled_query_definition()).await;

    let started = builder.start_flow(&result).await;
    assert!(started.is_complete());
    assert_eq!(started.updated, result.processor_ids);
    assert!(engine
        .processors()
        .iter()
        .all(|p| p.run_state == RunState::Running));

    let stopped = builder.stop_flow(&result).await;
    assert!(stopped.is_complete());
    assert!(engine
        .processors()
        .iter()
        .all(|p| p.run_state == RunState::Stopped));
    assert!(!engine.service("Orders Pool").unwrap().enabled);
}

#[tokio::test]
async fn test_start_failure_is_collected() {
    let engine = FakeFlowEngine::new().fail_on(Failure::RunState("Step 0".to_string()));
    let builder = builder_for(&engine);
    let result = builder.build_flow(&linear_definition(3)).await;

    let report = builder.start_flow(&result).await;
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.updated.len(), 2);
}
