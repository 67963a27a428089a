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

//! Health reports against a mock metrics backend.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use otelscope_core::{EngineConfig, HealthStatus, ServiceHealthMetrics, TrendDirection};
use otelscope_query::{GetServiceHealthParams, ReportFormat, TelemetryEngine};

fn scalar_body(value: &str) -> serde_json::Value {
    json!({
        "status": "success",
        "data": {
            "resultType": "vector",
            "result": [ { "metric": {}, "value": [1700000000.0, value] } ]
        }
    })
}

fn topk_body(label: &str, entries: &[(&str, &str)]) -> serde_json::Value {
    json!({
        "status": "success",
        "data": {
            "resultType": "vector",
            "result": entries.iter().map(|(name, value)| json!({
                "metric": { label: name },
                "value": [1700000000.0, value]
            })).collect::<Vec<_>>()
        }
    })
}

/// Answers the whole health battery from the expression text, the way the
/// real backend would distinguish the eight queries.
struct SpanMetricsBackend;

impl Respond for SpanMetricsBackend {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let expr = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "query")
            .map(|(_, value)| value.to_string())
            .unwrap_or_default();

        let body = if expr.contains("topk") && expr.contains("STATUS_CODE_ERROR") {
            topk_body(
                "span_name",
                &[("POST /api/checkout", "0.25"), ("GET /api/cart", "0.05")],
            )
        } else if expr.contains("topk") {
            topk_body("span_name", &[("POST /api/checkout", "412.7")])
        } else if expr.contains("offset") {
            scalar_body("1.0")
        } else if expr.contains("STATUS_CODE_ERROR") {
            scalar_body("2.0")
        } else if expr.contains("histogram_quantile(0.5,") {
            scalar_body("35")
        } else if expr.contains("histogram_quantile(0.95,") {
            scalar_body("310")
        } else if expr.contains("histogram_quantile(0.99,") {
            scalar_body("890")
        } else {
            // Plain calls_total rate: throughput.
            scalar_body("10")
        };
        ResponseTemplate::new(200).set_body_json(body)
    }
}

async fn engine_for(server: &MockServer) -> TelemetryEngine {
    TelemetryEngine::new(EngineConfig::new(server.uri(), server.uri())).unwrap()
}

#[tokio::test]
async fn full_battery_builds_classified_report_with_trend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/query"))
        .respond_with(SpanMetricsBackend)
        .mount(&server)
        .await;

    let engine = engine_for(&server).await;
    let health = engine
        .get_service_health(GetServiceHealthParams {
            service: "checkout".into(),
            lookback: "1h".into(),
            format: ReportFormat::Detailed,
            include_trends: true,
        })
        .await
        .unwrap();

    let report = &health.report;
    assert_eq!(report.service, "checkout");
    assert_eq!(report.period, "1h");
    // 2% errors with p95 at 310ms is degraded, not critical.
    assert_eq!(report.health_status, HealthStatus::Degraded);
    assert_eq!(report.metrics.throughput, "10.00 req/s");
    assert_eq!(report.metrics.estimated_requests, 36_000);
    assert_eq!(report.metrics.estimated_errors, 720);
    assert_eq!(report.metrics.error_rate, "2.00%");
    assert_eq!(report.metrics.success_rate, "98.00%");
    assert_eq!(report.metrics.latency_p50, "35.0ms");
    assert_eq!(report.metrics.latency_p95, "310.0ms");
    assert_eq!(report.metrics.latency_p99, "890.0ms");

    let trend = report.trend.as_ref().expect("trend requested");
    assert_eq!(trend.direction, TrendDirection::Degrading);
    assert_eq!(trend.previous_error_rate, "1.00%");
    assert_eq!(trend.delta, "+1.00%");
    assert_eq!(trend.change_percent, "+100.0%");

    let top = report.top_errors.as_ref().expect("top errors present");
    assert_eq!(top[0].operation, "POST /api/checkout");
    assert_eq!(top[0].errors_per_second, 0.25);

    assert!(health.rendered.contains("Service: checkout [DEGRADED]"));
    assert!(health.rendered.contains("Slowest operations (p95):"));
    assert!(health.rendered.contains("POST /api/checkout (412.7ms)"));
}

#[tokio::test]
async fn trend_is_absent_unless_requested() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/query"))
        .respond_with(SpanMetricsBackend)
        .mount(&server)
        .await;

    let engine = engine_for(&server).await;
    let health = engine
        .get_service_health(GetServiceHealthParams {
            service: "checkout".into(),
            lookback: "1h".into(),
            format: ReportFormat::Summary,
            include_trends: false,
        })
        .await
        .unwrap();
    assert!(health.report.trend.is_none());
    assert!(!health.rendered.contains("Trend:"));
    assert!(!health.rendered.contains("Slowest operations"));
}

#[tokio::test]
async fn unreachable_metrics_backend_degrades_to_healthy_defaults() {
    // Nothing mounted: every query gets a 404 and degrades to "no result".
    let server = MockServer::start().await;
    let engine = engine_for(&server).await;

    let health = engine
        .get_service_health(GetServiceHealthParams {
            service: "cart".into(),
            lookback: "15m".into(),
            format: ReportFormat::Summary,
            include_trends: true,
        })
        .await
        .unwrap();

    let report = &health.report;
    assert_eq!(report.health_status, HealthStatus::Healthy);
    assert_eq!(report.metrics.error_rate, "0.00%");
    assert_eq!(report.metrics.latency_p50, "0.0ms");
    assert!(report.top_errors.is_none());
    // Even the failed previous-period query never blocks the report.
    assert!(report.trend.is_none());
}

#[tokio::test]
async fn json_format_round_trips() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/query"))
        .respond_with(SpanMetricsBackend)
        .mount(&server)
        .await;

    let engine = engine_for(&server).await;
    let health = engine
        .get_service_health(GetServiceHealthParams {
            service: "checkout".into(),
            lookback: "1h".into(),
            format: ReportFormat::Json,
            include_trends: false,
        })
        .await
        .unwrap();

    let parsed: ServiceHealthMetrics = serde_json::from_str(&health.rendered).unwrap();
    assert_eq!(parsed.service, health.report.service);
    assert_eq!(parsed.health_status, health.report.health_status);
    assert_eq!(parsed, health.report);
}
