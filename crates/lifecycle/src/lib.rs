//! Workflow lifecycle controller.
//!
//! Drives one workflow at a time through start, polling, terminal-state
//! detection and result retrieval, keeps an independent service-health
//! refresh running, and routes the resulting state to views.
//!
//! - [`StateStore`] - owned state container; readers take snapshots or
//!   subscribe to changes.
//! - [`WorkflowController`] - the only writer; exposes the lifecycle
//!   operations and owns the background tasks.
//! - [`ViewRouter`] - effect task mapping every state change to a view.

pub mod backoff;
pub mod config;
pub mod controller;
mod health;
mod poller;
pub mod router;
pub mod store;

pub use backoff::PollRetryPolicy;
pub use config::ControllerConfig;
pub use controller::{StartOutcome, WorkflowController};
pub use router::{ViewRenderer, ViewRouter};
pub use store::StateStore;
