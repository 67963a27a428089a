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

//! Otelscope Query
//!
//! The I/O layer of the telemetry engine: HTTP clients for the tracing and
//! metrics backends, the cross-service fan-out orchestrator, the concurrent
//! health-report builder, the report formatter, and the engine facade the
//! request layer calls into.

pub mod engine;
pub mod fanout;
pub mod health;
pub mod metrics;
pub mod report;
pub mod trace;

pub use engine::{
    GetServiceHealthParams, GetTracesParams, HealthReport, TelemetryEngine, TraceQueryResult,
    ALL_SERVICES,
};
pub use fanout::{fetch_all_services, FanOutParams};
pub use health::{
    assemble_health_report, build_health_report, collect_health_metrics, HealthQueryResults, TOP_K,
};
pub use metrics::{scalar, top_k, MetricsClient, PromData, PromSeries};
pub use report::{format_health_report, ReportFormat};
pub use trace::{TraceClient, TraceSearchParams};
