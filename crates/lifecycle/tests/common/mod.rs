//! In-memory `WorkflowService` with scripted replies and call counters.

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use qaflow_client::{ApiError, WorkflowService};
use qaflow_core::health::{HealthSummary, ServiceHealth, ServiceHealthResponse};
use qaflow_core::results::{StageResults, WorkflowResults};
use qaflow_core::workflow::{
    CancelWorkflowResponse, StartWorkflowResponse, WorkflowConfig, WorkflowList, WorkflowState,
    WorkflowStatus, WorkflowType,
};
use qaflow_lifecycle::{ControllerConfig, WorkflowController};

/// One scripted reply.
#[derive(Clone)]
pub enum Reply<T> {
    Ok(T),
    /// Non-2xx response with this status code.
    Status(u16),
    /// Transport failure (no response received).
    Transport,
}

/// Queue of replies for one operation. The last reply is sticky: once the
/// queue is down to one entry it is returned on every further call.
pub struct Script<T> {
    replies: Mutex<VecDeque<Reply<T>>>,
    calls: AtomicUsize,
    delay: Mutex<Duration>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            delay: Mutex::new(Duration::ZERO),
        }
    }
}

impl<T: Clone> Script<T> {
    pub fn push(&self, reply: Reply<T>) -> &Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn ok(&self, value: T) -> &Self {
        self.push(Reply::Ok(value))
    }

    pub fn fail(&self, status: u16) -> &Self {
        self.push(Reply::Status(status))
    }

    /// Delay every reply by `delay`.
    pub fn delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn next(&self) -> Result<T, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            if replies.len() > 1 {
                replies.pop_front()
            } else {
                replies.front().cloned()
            }
        };

        match reply {
            Some(Reply::Ok(value)) => Ok(value),
            Some(Reply::Status(status)) => Err(ApiError::Api {
                status,
                body: format!("scripted {status}"),
            }),
            Some(Reply::Transport) => Err(transport_error().await),
            None => Err(ApiError::Api {
                status: 503,
                body: "no scripted reply".into(),
            }),
        }
    }
}

/// A genuine `reqwest` transport error, produced without touching the
/// network.
pub async fn transport_error() -> ApiError {
    let err = reqwest::Client::new()
        .get("not a url")
        .send()
        .await
        .unwrap_err();
    ApiError::Request(err)
}

/// Status and results replies are rewritten to carry the requested
/// workflow id, so one script can serve several workflows.
#[derive(Default)]
pub struct FakeService {
    pub start: Script<StartWorkflowResponse>,
    pub status: Script<WorkflowStatus>,
    pub results: Script<WorkflowResults>,
    pub health: Script<ServiceHealthResponse>,
    pub cancel: Script<CancelWorkflowResponse>,
    status_ids: Mutex<Vec<String>>,
}

impl FakeService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Workflow ids passed to `get_workflow_status`, in call order.
    pub fn polled_ids(&self) -> Vec<String> {
        self.status_ids.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkflowService for FakeService {
    async fn start_workflow(
        &self,
        _config: &WorkflowConfig,
    ) -> Result<StartWorkflowResponse, ApiError> {
        self.start.next().await
    }

    async fn get_workflow_status(&self, workflow_id: &str) -> Result<WorkflowStatus, ApiError> {
        self.status_ids.lock().unwrap().push(workflow_id.to_string());
        let mut status = self.status.next().await?;
        status.workflow_id = workflow_id.to_string();
        Ok(status)
    }

    async fn get_workflow_results(&self, workflow_id: &str) -> Result<WorkflowResults, ApiError> {
        let mut results = self.results.next().await?;
        results.workflow_id = workflow_id.to_string();
        Ok(results)
    }

    async fn get_service_health(&self) -> Result<ServiceHealthResponse, ApiError> {
        self.health.next().await
    }

    async fn list_workflows(&self) -> Result<WorkflowList, ApiError> {
        Ok(WorkflowList {
            total_workflows: 0,
            active_workflows: 0,
            completed_workflows: 0,
            workflows: Vec::new(),
        })
    }

    async fn cancel_workflow(&self, _workflow_id: &str) -> Result<CancelWorkflowResponse, ApiError> {
        self.cancel.next().await
    }

    async fn check_liveness(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Payload builders
// ---------------------------------------------------------------------------

pub fn started(id: &str) -> StartWorkflowResponse {
    StartWorkflowResponse {
        workflow_id: id.to_string(),
        status: "started".into(),
        message: "Workflow started successfully".into(),
        estimated_duration: None,
        monitoring_url: Some(format!("/workflows/{id}/status")),
    }
}

pub fn status(state: WorkflowState, progress: f64) -> WorkflowStatus {
    WorkflowStatus {
        status: state,
        progress,
        current_step: format!("step at {progress}"),
        ..WorkflowStatus::initial("scripted", Utc::now())
    }
}

pub fn results(state: WorkflowState) -> WorkflowResults {
    WorkflowResults {
        workflow_id: "scripted".into(),
        status: state,
        execution_time: Some(12.5),
        results: StageResults {
            website_analysis: Some(serde_json::json!({ "pages": 3 })),
            ..StageResults::default()
        },
        errors: None,
        service_statuses: Some(BTreeMap::from([("website_analysis".to_string(), true)])),
        completed_at: Some(Utc::now()),
    }
}

pub fn health(healthy: bool) -> ServiceHealthResponse {
    let now = Utc::now();
    ServiceHealthResponse {
        summary: HealthSummary {
            total_services: 1,
            healthy_services: u32::from(healthy),
            unhealthy_services: u32::from(!healthy),
            last_check: now,
        },
        services: BTreeMap::from([(
            "website_analyzer".to_string(),
            ServiceHealth {
                healthy,
                response_time_ms: Some(4.0),
                last_check: now,
                error_message: None,
            },
        )]),
    }
}

pub fn workflow_config() -> WorkflowConfig {
    WorkflowConfig::new("https://app.example.com", WorkflowType::Full)
}

pub fn controller(service: &Arc<FakeService>) -> Arc<WorkflowController> {
    controller_with(service, ControllerConfig::default())
}

pub fn controller_with(
    service: &Arc<FakeService>,
    config: ControllerConfig,
) -> Arc<WorkflowController> {
    let service: Arc<dyn WorkflowService> = service.clone();
    WorkflowController::new(service, config)
}
