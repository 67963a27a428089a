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

//! Otelscope Core
//!
//! Data model and pure algorithms of the telemetry summarization engine:
//! OTLP/JSON wire types, attribute decoding, span classification and
//! compaction, the bounded trace-extraction pipeline, time-window
//! resolution, and the health-report model. No I/O lives here; the HTTP
//! clients and orchestration are in `otelscope-query`.

pub mod config;
pub mod error;
pub mod extract;
pub mod health;
pub mod otlp;
pub mod summary;
pub mod window;

pub use config::{EngineConfig, METRICS_BACKEND_URL_VAR, TRACE_BACKEND_URL_VAR};
pub use error::{OtelscopeError, Result};
pub use extract::extract_trace_summaries;
pub use health::{
    determine_health_status, ErrorRateTrend, HealthMetricsBlock, HealthStatus, OperationErrorRate,
    OperationLatency, ServiceHealthMetrics, TrendDirection, ERROR_RATE_CRITICAL,
    ERROR_RATE_DEGRADED, P95_CRITICAL_MS, P95_DEGRADED_MS, TREND_STABLE_BAND,
};
pub use otlp::{
    find_attribute, AnyValue, InstrumentationScope, KeyValue, Resource, ResourceSpans, ScopeSpans,
    Span, SpanEvent, SpanOutcome, Status, TraceData, TraceFilter,
};
pub use summary::{
    AllServicesResult, ExtractedTraces, ServiceTraceResult, SummaryEvent, TraceSummary,
};
pub use window::{nanos_to_iso8601, window_to_millis, window_to_seconds, DEFAULT_WINDOW_SECONDS};
