//! HTTP client for the QA workflow orchestrator.
//!
//! [`api::WorkflowApi`] wraps the orchestrator's REST endpoints (workflow
//! submission, status, results, cancellation, service health) using
//! [`reqwest`]. [`service::WorkflowService`] is the trait the lifecycle
//! controller is written against.

pub mod api;
pub mod service;

pub use api::{ApiError, WorkflowApi, DEFAULT_REQUEST_TIMEOUT};
pub use service::WorkflowService;
