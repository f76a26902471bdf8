//! Mock implementation of the FlowEngineClient interface.

use async_trait::async_trait;
use etlsmith_core::{
    Bundle, ClientResult, FlowEngineClient, Position, PropertyMap, PropertyUpdate, RunState,
    ValidationStatus, Versioned,
};
use mockall::mock;

// Generate the mock implementation
mock! {
    pub FlowEngineClient {}

    #[async_trait]
    impl FlowEngineClient for FlowEngineClient {
        async fn default_target_group_id(&self) -> ClientResult<String>;
        async fn group_topology(&self, group_id: &str) -> ClientResult<Vec<Position>>;
        async fn create_processor(
            &self,
            group_id: &str,
            name: &str,
            type_name: &str,
            position: Position,
            bundle: Option<Bundle>,
        ) -> ClientResult<Versioned>;
        async fn update_processor_properties(
            &self,
            processor: &Versioned,
            properties: &PropertyMap,
        ) -> ClientResult<PropertyUpdate>;
        async fn update_processor_auto_terminate(
            &self,
            processor: &Versioned,
            relationships: &[String],
        ) -> ClientResult<i64>;
        async fn create_connection(
            &self,
            group_id: &str,
            source_id: &str,
            destination_id: &str,
            relationships: &[String],
        ) -> ClientResult<String>;
        async fn create_controller_service(
            &self,
            group_id: &str,
            name: &str,
            type_name: &str,
            properties: &PropertyMap,
            bundle: Option<Bundle>,
        ) -> ClientResult<Versioned>;
        async fn enable_controller_service(&self, service: &Versioned) -> ClientResult<i64>;
        async fn disable_controller_service(&self, service_id: &str) -> ClientResult<()>;
        async fn set_processor_run_state(&self, processor_id: &str, state: RunState) -> ClientResult<()>;
    }
}

/// Creates a mock that accepts every call.
///
/// Processors are named `proc-<name>`, services `svc-<name>` and connections
/// `conn-<source>-<destination>`; every mutation bumps the revision by one.
/// Tests that need failures should build their own mock.
pub fn create_mock_flow_engine() -> MockFlowEngineClient {
    let mut mock = MockFlowEngineClient::new();

    mock.expect_default_target_group_id()
        .returning(|| Ok("root".to_string()));
    mock.expect_group_topology().returning(|_| Ok(Vec::new()));
    mock.expect_create_processor()
        .returning(|_, name, _, _, _| Ok(Versioned::new(format!("proc-{}", name), 1)));
    mock.expect_update_processor_properties()
        .returning(|processor, _| {
            Ok(PropertyUpdate {
                revision: processor.revision + 1,
                validation_status: ValidationStatus::Valid,
                validation_errors: Vec::new(),
            })
        });
    mock.expect_update_processor_auto_terminate()
        .returning(|processor, _| Ok(processor.revision + 1));
    mock.expect_create_connection()
        .returning(|_, source, destination, _| Ok(format!("conn-{}-{}", source, destination)));
    mock.expect_create_controller_service()
        .returning(|_, name, _, _, _| Ok(Versioned::new(format!("svc-{}", name), 1)));
    mock.expect_enable_controller_service()
        .returning(|service| Ok(service.revision + 1));
    mock.expect_disable_controller_service().returning(|_| Ok(()));
    mock.expect_set_processor_run_state().returning(|_, _| Ok(()));

    mock
}
