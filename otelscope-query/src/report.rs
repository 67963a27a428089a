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

//! Health report rendering.
//!
//! A pure rendering step: classification, rounding and ordering are the
//! builder's work and pass through unaltered.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use otelscope_core::{OtelscopeError, Result, ServiceHealthMetrics};

/// Output mode for a health report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Status line, key metrics, trend and top errors when present
    #[default]
    Summary,
    /// Summary plus the slowest-operations section
    Detailed,
    /// The report serialized verbatim, round-trip safe
    Json,
}

/// Render `report` in the requested mode
pub fn format_health_report(report: &ServiceHealthMetrics, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| OtelscopeError::Serialization(e.to_string())),
        ReportFormat::Summary => Ok(render_text(report, false)),
        ReportFormat::Detailed => Ok(render_text(report, true)),
    }
}

fn render_text(report: &ServiceHealthMetrics, include_slowest: bool) -> String {
    let mut out = String::new();
    let m = &report.metrics;

    // Infallible writes to a String; the fmt::Result is structural noise.
    let _ = writeln!(
        out,
        "Service: {} [{}] (last {})",
        report.service,
        report.health_status.to_string().to_uppercase(),
        report.period
    );
    let _ = writeln!(
        out,
        "Throughput: {} (~{} requests)",
        m.throughput, m.estimated_requests
    );
    let _ = writeln!(
        out,
        "Errors: {} ({} estimated)",
        m.error_rate, m.estimated_errors
    );
    let _ = writeln!(out, "Success rate: {}", m.success_rate);
    let _ = writeln!(
        out,
        "Latency: p50 {} | p95 {} | p99 {}",
        m.latency_p50, m.latency_p95, m.latency_p99
    );

    if let Some(trend) = &report.trend {
        let _ = writeln!(
            out,
            "Trend: {} (previous {}, delta {}, change {})",
            trend.direction, trend.previous_error_rate, trend.delta, trend.change_percent
        );
    }

    if let Some(top_errors) = &report.top_errors {
        let _ = writeln!(out, "Top error operations:");
        for (i, entry) in top_errors.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {}. {} ({} err/s)",
                i + 1,
                entry.operation,
                entry.errors_per_second
            );
        }
    }

    if include_slowest {
        let _ = writeln!(out, "Slowest operations (p95):");
        for (i, entry) in report.slowest_operations.iter().enumerate() {
            let _ = writeln!(out, "  {}. {} ({}ms)", i + 1, entry.operation, entry.p95_ms);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::{assemble_health_report, HealthQueryResults};
    use otelscope_core::{OperationLatency, ServiceHealthMetrics};

    fn sample_report() -> ServiceHealthMetrics {
        let mut report = assemble_health_report("cart", "1h", &HealthQueryResults::default());
        report.slowest_operations = vec![OperationLatency {
            operation: "GET /api/cart".into(),
            p95_ms: 42.5,
        }];
        report
    }

    #[test]
    fn test_json_round_trip() {
        let report = sample_report();
        let rendered = format_health_report(&report, ReportFormat::Json).unwrap();
        let parsed: ServiceHealthMetrics = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed.service, report.service);
        assert_eq!(parsed.health_status, report.health_status);
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_summary_omits_slowest_section() {
        let report = sample_report();
        let summary = format_health_report(&report, ReportFormat::Summary).unwrap();
        assert!(summary.contains("Service: cart [HEALTHY] (last 1h)"));
        assert!(summary.contains("Latency: p50 0.0ms"));
        assert!(!summary.contains("Slowest operations"));
    }

    #[test]
    fn test_detailed_appends_slowest_section() {
        let report = sample_report();
        let detailed = format_health_report(&report, ReportFormat::Detailed).unwrap();
        assert!(detailed.contains("Slowest operations (p95):"));
        assert!(detailed.contains("1. GET /api/cart (42.5ms)"));
        // Detailed is summary plus one section.
        let summary = format_health_report(&report, ReportFormat::Summary).unwrap();
        assert!(detailed.starts_with(&summary));
    }
}
