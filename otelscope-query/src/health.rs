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

//! Health report builder.
//!
//! Fires the fixed battery of eight metrics queries concurrently (all
//! outstanding at once, results joined), then assembles the report from
//! whatever subset came back. Every input is independently nullable; absent
//! inputs degrade to zeros and a healthy verdict, never to an error.
//!
//! Query expressions follow spanmetrics conventions: a `calls_total` counter
//! and a `duration_milliseconds` histogram, both keyed by `service_name`,
//! with `status_code="STATUS_CODE_ERROR"` marking failed calls and
//! `span_name` naming the operation.

use tracing::debug;

use otelscope_core::{
    determine_health_status, window_to_seconds, ErrorRateTrend, HealthMetricsBlock,
    OperationErrorRate, OperationLatency, ServiceHealthMetrics, TrendDirection, TREND_STABLE_BAND,
};

use crate::metrics::{scalar, top_k, MetricsClient, PromData};

/// Series returned by the two top-K queries
pub const TOP_K: usize = 5;

/// The eight independently nullable query results feeding one report
#[derive(Debug, Default)]
pub struct HealthQueryResults {
    pub throughput: Option<PromData>,
    pub error_rate: Option<PromData>,
    pub p50: Option<PromData>,
    pub p95: Option<PromData>,
    pub p99: Option<PromData>,
    pub top_errors: Option<PromData>,
    pub slowest: Option<PromData>,
    pub previous_error_rate: Option<PromData>,
}

fn rate_expr(service: &str, window: &str, errors_only: bool, offset: bool) -> String {
    let selector = if errors_only {
        format!("{{service_name=\"{service}\", status_code=\"STATUS_CODE_ERROR\"}}")
    } else {
        format!("{{service_name=\"{service}\"}}")
    };
    let range = if offset {
        format!("[{window}] offset {window}")
    } else {
        format!("[{window}]")
    };
    format!("sum(rate(calls_total{selector}{range}))")
}

fn error_rate_expr(service: &str, window: &str, offset: bool) -> String {
    format!(
        "{} / {} * 100",
        rate_expr(service, window, true, offset),
        rate_expr(service, window, false, offset)
    )
}

fn quantile_expr(service: &str, window: &str, quantile: f64) -> String {
    format!(
        "histogram_quantile({quantile}, \
         sum(rate(duration_milliseconds_bucket{{service_name=\"{service}\"}}[{window}])) by (le))"
    )
}

/// Fire all eight queries concurrently and join the results.
///
/// The previous-period query only goes out when trends were requested.
pub async fn collect_health_metrics(
    client: &MetricsClient,
    service: &str,
    window: &str,
    include_trends: bool,
) -> HealthQueryResults {
    let q_throughput = rate_expr(service, window, false, false);
    let q_error_rate = error_rate_expr(service, window, false);
    let q_p50 = quantile_expr(service, window, 0.50);
    let q_p95 = quantile_expr(service, window, 0.95);
    let q_p99 = quantile_expr(service, window, 0.99);
    let q_top_errors = format!(
        "topk({TOP_K}, sum(rate(calls_total{{service_name=\"{service}\", \
         status_code=\"STATUS_CODE_ERROR\"}}[{window}])) by (span_name))"
    );
    let q_slowest = format!(
        "topk({TOP_K}, histogram_quantile(0.95, \
         sum(rate(duration_milliseconds_bucket{{service_name=\"{service}\"}}[{window}])) \
         by (le, span_name)))"
    );
    let q_previous = error_rate_expr(service, window, true);

    debug!(service, window, include_trends, "collecting health metrics");

    let (throughput, error_rate, p50, p95, p99, top_errors, slowest, previous_error_rate) = tokio::join!(
        client.query(&q_throughput),
        client.query(&q_error_rate),
        client.query(&q_p50),
        client.query(&q_p95),
        client.query(&q_p99),
        client.query(&q_top_errors),
        client.query(&q_slowest),
        async {
            if include_trends {
                client.query(&q_previous).await
            } else {
                None
            }
        },
    );

    HealthQueryResults {
        throughput,
        error_rate,
        p50,
        p95,
        p99,
        top_errors,
        slowest,
        previous_error_rate,
    }
}

/// Assemble a report from the query results. Pure; never fails on absent
/// inputs.
pub fn assemble_health_report(
    service: &str,
    lookback: &str,
    results: &HealthQueryResults,
) -> ServiceHealthMetrics {
    let throughput = scalar(results.throughput.as_ref(), 0.0);
    let error_rate = scalar(results.error_rate.as_ref(), 0.0);
    let p50 = scalar(results.p50.as_ref(), 0.0);
    let p95 = scalar(results.p95.as_ref(), 0.0);
    let p99 = scalar(results.p99.as_ref(), 0.0);

    let window_seconds = window_to_seconds(lookback);
    let success_rate = (100.0 - error_rate).max(0.0);
    let estimated_requests = (throughput * window_seconds as f64).round() as u64;
    let estimated_errors = (error_rate / 100.0 * estimated_requests as f64).round() as u64;

    let top_errors = {
        let pairs = top_k(results.top_errors.as_ref());
        if pairs.is_empty() {
            None
        } else {
            Some(
                pairs
                    .into_iter()
                    .map(|(labels, value)| OperationErrorRate {
                        operation: operation_label(&labels),
                        errors_per_second: round_to(value, 3),
                    })
                    .collect(),
            )
        }
    };

    let slowest_operations = top_k(results.slowest.as_ref())
        .into_iter()
        .map(|(labels, value)| OperationLatency {
            operation: operation_label(&labels),
            p95_ms: round_to(value, 1),
        })
        .collect();

    let trend = results
        .previous_error_rate
        .as_ref()
        .map(|data| build_trend(error_rate, scalar(Some(data), 0.0)));

    ServiceHealthMetrics {
        service: service.to_string(),
        period: lookback.to_string(),
        health_status: determine_health_status(error_rate, p95),
        metrics: HealthMetricsBlock {
            throughput: format!("{throughput:.2} req/s"),
            estimated_requests,
            estimated_errors,
            error_rate: format!("{error_rate:.2}%"),
            success_rate: format!("{success_rate:.2}%"),
            latency_p50: format!("{p50:.1}ms"),
            latency_p95: format!("{p95:.1}ms"),
            latency_p99: format!("{p99:.1}ms"),
        },
        top_errors,
        slowest_operations,
        trend,
    }
}

/// Collect and assemble in one step
pub async fn build_health_report(
    client: &MetricsClient,
    service: &str,
    lookback: &str,
    include_trends: bool,
) -> ServiceHealthMetrics {
    let results = collect_health_metrics(client, service, lookback, include_trends).await;
    assemble_health_report(service, lookback, &results)
}

fn build_trend(current: f64, previous: f64) -> ErrorRateTrend {
    let delta = current - previous;
    let direction = if delta.abs() < TREND_STABLE_BAND {
        TrendDirection::Stable
    } else if delta > 0.0 {
        TrendDirection::Degrading
    } else {
        TrendDirection::Improving
    };
    let change_percent = if previous == 0.0 {
        "N/A".to_string()
    } else {
        format!("{:+.1}%", delta / previous * 100.0)
    };

    ErrorRateTrend {
        direction,
        previous_error_rate: format!("{previous:.2}%"),
        delta: format!("{delta:+.2}%"),
        change_percent,
    }
}

fn operation_label(labels: &std::collections::HashMap<String, String>) -> String {
    labels
        .get("span_name")
        .cloned()
        .unwrap_or_else(|| "unknown".to_string())
}

fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}
