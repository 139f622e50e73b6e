//! Domain model for the QAFlow workflow client.
//!
//! Pure types and functions shared by the HTTP client, the lifecycle
//! controller and the CLI. Nothing in this crate performs I/O.

pub mod error;
pub mod health;
pub mod results;
pub mod state;
pub mod types;
pub mod view;
pub mod workflow;
