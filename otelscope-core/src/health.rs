// Copyright 2025 Otelscope Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Service health report model and classification.
//!
//! A [`ServiceHealthMetrics`] report is built fresh per request, purely as a
//! function of the query results supplied to the builder; nothing is cached
//! across requests. Classification thresholds are fixed literals, not
//! configuration -- callers needing different cutoffs wrap
//! [`determine_health_status`].

use serde::{Deserialize, Serialize};

/// Error-rate percentage above which a service is critical
pub const ERROR_RATE_CRITICAL: f64 = 5.0;

/// Error-rate percentage above which a service is degraded
pub const ERROR_RATE_DEGRADED: f64 = 1.0;

/// p95 latency (ms) above which a service is critical
pub const P95_CRITICAL_MS: f64 = 1000.0;

/// p95 latency (ms) above which a service is degraded
pub const P95_DEGRADED_MS: f64 = 500.0;

/// Percentage-point change below which an error-rate trend counts as stable
pub const TREND_STABLE_BAND: f64 = 0.5;

/// Overall verdict for one service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Critical,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Critical => write!(f, "critical"),
        }
    }
}

/// Classify health from error rate (percent) and p95 latency (ms).
///
/// Critical beats degraded; either signal alone is enough to worsen the
/// verdict.
pub fn determine_health_status(error_rate: f64, p95_latency_ms: f64) -> HealthStatus {
    if error_rate > ERROR_RATE_CRITICAL || p95_latency_ms > P95_CRITICAL_MS {
        HealthStatus::Critical
    } else if error_rate > ERROR_RATE_DEGRADED || p95_latency_ms > P95_DEGRADED_MS {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

/// Direction of the error-rate trend against the previous period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Stable,
    Degrading,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendDirection::Improving => write!(f, "improving"),
            TrendDirection::Stable => write!(f, "stable"),
            TrendDirection::Degrading => write!(f, "degrading"),
        }
    }
}

/// Error-rate movement between the previous and current lookback period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRateTrend {
    pub direction: TrendDirection,
    /// Previous-period error rate, e.g. `"1.20%"`
    pub previous_error_rate: String,
    /// Signed percentage-point delta, e.g. `"+0.30%"`
    pub delta: String,
    /// Relative change `delta / previous * 100`, or `"N/A"` when the
    /// previous rate was exactly zero
    pub change_percent: String,
}

/// The pre-formatted metrics block of a health report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthMetricsBlock {
    /// e.g. `"12.34 req/s"`
    pub throughput: String,
    /// `throughput * window_seconds`, rounded
    pub estimated_requests: u64,
    /// `round(error_rate / 100 * estimated_requests)`
    pub estimated_errors: u64,
    /// e.g. `"0.00%"`
    pub error_rate: String,
    /// `max(0, 100 - error_rate)`, e.g. `"100.00%"`
    pub success_rate: String,
    /// e.g. `"3.2ms"`
    pub latency_p50: String,
    pub latency_p95: String,
    pub latency_p99: String,
}

/// One operation's error throughput from the top-K error query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationErrorRate {
    pub operation: String,
    pub errors_per_second: f64,
}

/// One operation's p95 latency from the top-K slowest query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationLatency {
    pub operation: String,
    pub p95_ms: f64,
}

/// The full health report for one service over one lookback period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealthMetrics {
    pub service: String,
    /// The caller-supplied lookback, e.g. `"1h"`
    pub period: String,
    pub health_status: HealthStatus,
    pub metrics: HealthMetricsBlock,
    /// Present only when the error-by-operation query returned series
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_errors: Option<Vec<OperationErrorRate>>,
    pub slowest_operations: Vec<OperationLatency>,
    /// Present only when previous-period data was requested and supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<ErrorRateTrend>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_thresholds() {
        assert_eq!(determine_health_status(0.5, 200.0), HealthStatus::Healthy);
        assert_eq!(determine_health_status(2.0, 200.0), HealthStatus::Degraded);
        assert_eq!(determine_health_status(0.5, 600.0), HealthStatus::Degraded);
        assert_eq!(determine_health_status(6.0, 1200.0), HealthStatus::Critical);
        assert_eq!(determine_health_status(6.0, 10.0), HealthStatus::Critical);
        assert_eq!(determine_health_status(0.0, 1500.0), HealthStatus::Critical);
    }

    #[test]
    fn test_thresholds_are_exclusive_bounds() {
        // Exactly at a threshold stays in the lower band.
        assert_eq!(determine_health_status(1.0, 500.0), HealthStatus::Healthy);
        assert_eq!(determine_health_status(5.0, 1000.0), HealthStatus::Degraded);
    }
}
