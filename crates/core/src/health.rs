//! Aggregate health of the backing services.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{lenient_timestamp, Timestamp};

/// Counts across all services at the time of the last check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub total_services: u32,
    pub healthy_services: u32,
    pub unhealthy_services: u32,
    #[serde(with = "lenient_timestamp")]
    pub last_check: Timestamp,
}

/// Health record for one backing service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub healthy: bool,
    #[serde(default)]
    pub response_time_ms: Option<f64>,
    #[serde(with = "lenient_timestamp")]
    pub last_check: Timestamp,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Payload of `GET /service-status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealthResponse {
    pub summary: HealthSummary,
    #[serde(default)]
    pub services: BTreeMap<String, ServiceHealth>,
}

impl ServiceHealthResponse {
    pub fn all_healthy(&self) -> bool {
        self.summary.unhealthy_services == 0 && self.services.values().all(|s| s.healthy)
    }

    /// Names of unhealthy services, in name order.
    pub fn unhealthy(&self) -> impl Iterator<Item = (&str, &ServiceHealth)> {
        self.services
            .iter()
            .filter(|(_, s)| !s.healthy)
            .map(|(name, s)| (name.as_str(), s))
    }
}
