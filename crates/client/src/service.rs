//! The seam between the lifecycle controller and the orchestrator.
//!
//! The controller only ever talks to a [`WorkflowService`]. In production
//! that is [`WorkflowApi`]; tests substitute an in-memory implementation.

use async_trait::async_trait;
use qaflow_core::health::ServiceHealthResponse;
use qaflow_core::results::WorkflowResults;
use qaflow_core::workflow::{
    CancelWorkflowResponse, StartWorkflowResponse, WorkflowConfig, WorkflowList, WorkflowStatus,
};

use crate::api::{ApiError, WorkflowApi};

/// Remote operations the workflow lifecycle depends on.
#[async_trait]
pub trait WorkflowService: Send + Sync + 'static {
    async fn start_workflow(&self, config: &WorkflowConfig)
        -> Result<StartWorkflowResponse, ApiError>;

    async fn get_workflow_status(&self, workflow_id: &str) -> Result<WorkflowStatus, ApiError>;

    async fn get_workflow_results(&self, workflow_id: &str) -> Result<WorkflowResults, ApiError>;

    async fn get_service_health(&self) -> Result<ServiceHealthResponse, ApiError>;

    async fn list_workflows(&self) -> Result<WorkflowList, ApiError>;

    async fn cancel_workflow(&self, workflow_id: &str) -> Result<CancelWorkflowResponse, ApiError>;

    async fn check_liveness(&self) -> bool;
}

#[async_trait]
impl WorkflowService for WorkflowApi {
    async fn start_workflow(
        &self,
        config: &WorkflowConfig,
    ) -> Result<StartWorkflowResponse, ApiError> {
        WorkflowApi::start_workflow(self, config).await
    }

    async fn get_workflow_status(&self, workflow_id: &str) -> Result<WorkflowStatus, ApiError> {
        WorkflowApi::get_workflow_status(self, workflow_id).await
    }

    async fn get_workflow_results(&self, workflow_id: &str) -> Result<WorkflowResults, ApiError> {
        WorkflowApi::get_workflow_results(self, workflow_id).await
    }

    async fn get_service_health(&self) -> Result<ServiceHealthResponse, ApiError> {
        WorkflowApi::get_service_health(self).await
    }

    async fn list_workflows(&self) -> Result<WorkflowList, ApiError> {
        WorkflowApi::list_workflows(self).await
    }

    async fn cancel_workflow(&self, workflow_id: &str) -> Result<CancelWorkflowResponse, ApiError> {
        WorkflowApi::cancel_workflow(self, workflow_id).await
    }

    async fn check_liveness(&self) -> bool {
        WorkflowApi::check_liveness(self).await
    }
}
