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

//! Engine facade.
//!
//! The operation surface consumed by the request-handling layer: list the
//! known services, fetch bounded trace summaries for one service or all of
//! them, and build a rendered health report. All operations are reads
//! against the two configured backends.

use serde::Deserialize;
use tracing::info;

use otelscope_core::{
    extract_trace_summaries, window_to_millis, AllServicesResult, EngineConfig, ExtractedTraces,
    OtelscopeError, Result, ServiceHealthMetrics, Span, TraceFilter,
};

use crate::fanout::{fetch_all_services, FanOutParams};
use crate::health::build_health_report;
use crate::metrics::MetricsClient;
use crate::report::{format_health_report, ReportFormat};
use crate::trace::{TraceClient, TraceSearchParams};

/// Pseudo-service selecting the cross-service fan-out
pub const ALL_SERVICES: &str = "all";

const DEFAULT_TRACE_LIMIT: usize = 20;
const DEFAULT_LOOKBACK: &str = "1h";

/// Parameters for [`TelemetryEngine::get_traces`]
#[derive(Debug, Clone, Deserialize)]
pub struct GetTracesParams {
    /// A service name, or `"all"` to fan out across every known service
    #[serde(default = "default_service")]
    pub service: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Lookback window, e.g. `"1h"`; malformed input is rejected
    #[serde(default = "default_lookback")]
    pub lookback: String,
    pub operation: Option<String>,
    /// Minimum span duration hint forwarded to the backend, e.g. `"100ms"`
    pub min_duration: Option<String>,
    #[serde(default)]
    pub filter: TraceFilter,
}

impl Default for GetTracesParams {
    fn default() -> Self {
        Self {
            service: default_service(),
            limit: default_limit(),
            lookback: default_lookback(),
            operation: None,
            min_duration: None,
            filter: TraceFilter::All,
        }
    }
}

fn default_service() -> String {
    ALL_SERVICES.to_string()
}

fn default_limit() -> usize {
    DEFAULT_TRACE_LIMIT
}

fn default_lookback() -> String {
    DEFAULT_LOOKBACK.to_string()
}

/// Parameters for [`TelemetryEngine::get_service_health`]
#[derive(Debug, Clone, Deserialize)]
pub struct GetServiceHealthParams {
    pub service: String,
    #[serde(default = "default_lookback")]
    pub lookback: String,
    #[serde(default)]
    pub format: ReportFormat,
    #[serde(default)]
    pub include_trends: bool,
}

/// Result of a trace query: one service's extraction, or the fan-out
/// aggregate
#[derive(Debug)]
pub enum TraceQueryResult {
    Single(ExtractedTraces),
    AllServices(AllServicesResult),
}

/// A built health report together with its rendering
#[derive(Debug)]
pub struct HealthReport {
    pub report: ServiceHealthMetrics,
    pub rendered: String,
}

/// The telemetry summarization engine
#[derive(Debug, Clone)]
pub struct TelemetryEngine {
    traces: TraceClient,
    metrics: MetricsClient,
}

impl TelemetryEngine {
    /// Build an engine over the two configured backends.
    ///
    /// A single HTTP client with the configured timeout backs every
    /// outbound call.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| OtelscopeError::TraceBackend(e.to_string()))?;

        Ok(Self {
            traces: TraceClient::new(&config.trace_backend_url, http.clone()),
            metrics: MetricsClient::new(&config.metrics_backend_url, http),
        })
    }

    /// Resolve configuration from the environment and build an engine.
    /// Missing backend URLs fail here, when the engine is first needed.
    pub fn from_env() -> Result<Self> {
        Self::new(EngineConfig::from_env()?)
    }

    /// The list of known service names
    pub async fn list_services(&self) -> Result<Vec<String>> {
        self.traces.list_services().await
    }

    /// Fetch bounded trace summaries for one service, or fan out across all
    /// of them.
    ///
    /// The lookback parses via the strict window parser so malformed tool
    /// input is rejected at the boundary. A backend failure for a direct
    /// single-service query propagates; during fan-out, per-service failures
    /// degrade instead.
    pub async fn get_traces(&self, params: GetTracesParams) -> Result<TraceQueryResult> {
        let GetTracesParams {
            service,
            limit,
            lookback,
            operation,
            min_duration,
            filter,
        } = params;
        let lookback_ms = window_to_millis(&lookback)?;
        info!(%service, limit, %lookback, ?filter, "trace query");

        if service == ALL_SERVICES {
            let aggregate = fetch_all_services(
                &self.traces,
                &FanOutParams {
                    lookback_ms,
                    limit,
                    operation,
                    min_duration,
                    filter,
                },
            )
            .await?;
            return Ok(TraceQueryResult::AllServices(aggregate));
        }

        let data = self
            .traces
            .search(&TraceSearchParams {
                service,
                lookback_ms,
                limit,
                operation,
                min_duration,
                errors_only: filter == TraceFilter::Errors,
            })
            .await?;

        let predicate = |span: &Span| filter.matches(span);
        let span_filter: Option<&dyn Fn(&Span) -> bool> = match filter {
            TraceFilter::All => None,
            _ => Some(&predicate),
        };
        Ok(TraceQueryResult::Single(extract_trace_summaries(
            &data,
            limit,
            span_filter,
        )))
    }

    /// Build the health report for one service and render it in the
    /// requested format. The report is always produced; failed metrics
    /// sub-queries degrade to zeros.
    pub async fn get_service_health(
        &self,
        params: GetServiceHealthParams,
    ) -> Result<HealthReport> {
        info!(
            service = %params.service,
            lookback = %params.lookback,
            include_trends = params.include_trends,
            "health report"
        );

        let report = build_health_report(
            &self.metrics,
            &params.service,
            &params.lookback,
            params.include_trends,
        )
        .await;
        let rendered = format_health_report(&report, params.format)?;

        Ok(HealthReport { report, rendered })
    }
}
