//! Mock implementation of the FlowPlanner interface.

use async_trait::async_trait;
use etlsmith_core::FlowDefinition;
use etlsmith_planner::{FlowPlanner, PlannerResult};
use mockall::mock;

mock! {
    pub FlowPlanner {}

    #[async_trait]
    impl FlowPlanner for FlowPlanner {
        async fn plan(&self, description: &str) -> PlannerResult<FlowDefinition>;
    }
}

/// Creates a planner that answers every description with `definition`
pub fn planner_returning(definition: FlowDefinition) -> MockFlowPlanner {
    let mut mock = MockFlowPlanner::new();
    mock.expect_plan()
        .returning(move |_| Ok(definition.clone()));
    mock
}
