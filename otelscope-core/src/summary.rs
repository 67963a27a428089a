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

//! Bounded trace summaries.
//!
//! A [`TraceSummary`] is the compacted output unit built from one raw span
//! plus its owning service. Summaries are immutable once built and live only
//! for the duration of one response; nothing here is persisted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::otlp::{find_attribute, AnyValue, Span, SpanOutcome};
use crate::window::nanos_to_iso8601;

/// Events kept per summary, regardless of how verbose the span was
pub const MAX_SUMMARY_EVENTS: usize = 3;

/// Attributes kept per summarized event
pub const MAX_EVENT_ATTRIBUTES: usize = 5;

/// Message substituted when an error span carries none
pub const NO_ERROR_MESSAGE: &str = "No error message";

/// A truncated span event carried in a summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryEvent {
    pub timestamp: String,
    pub name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

/// The bounded, consumer-friendly view of one span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSummary {
    pub trace_id: String,
    pub span_id: String,
    pub service: String,
    pub operation: String,
    /// ISO-8601 start instant
    pub start_time: String,
    /// `"<n>ms"`, or `"unknown"` when the span has no end time
    pub duration: String,
    pub status: SpanOutcome,
    /// Populated only for error spans
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// `error.type`, surfaced first-class because consumers almost always
    /// want it without a tag-map lookup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// `http.status_code`, likewise surfaced first-class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status_code: Option<i64>,
    pub tags: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<SummaryEvent>,
}

impl TraceSummary {
    /// Compact one raw span into a summary, given the service name derived
    /// from its enclosing resource.
    pub fn from_span(span: &Span, service: &str) -> Self {
        let outcome = span.outcome();

        let error_message = if outcome == SpanOutcome::Error {
            Some(
                span.status
                    .as_ref()
                    .and_then(|s| s.message.clone())
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| NO_ERROR_MESSAGE.to_string()),
            )
        } else {
            None
        };

        let logs = span
            .events
            .iter()
            .take(MAX_SUMMARY_EVENTS)
            .map(|event| SummaryEvent {
                timestamp: nanos_to_iso8601(&event.time_unix_nano),
                name: event.name.clone(),
                attributes: event
                    .attributes
                    .iter()
                    .take(MAX_EVENT_ATTRIBUTES)
                    .filter_map(|attr| {
                        attr.value.as_ref().map(|v| (attr.key.clone(), v.to_json()))
                    })
                    .collect(),
            })
            .collect();

        Self {
            trace_id: span.trace_id.clone(),
            span_id: span.span_id.clone(),
            service: service.to_string(),
            operation: span.name.clone(),
            start_time: nanos_to_iso8601(&span.start_time_unix_nano),
            duration: span_duration(span),
            status: outcome,
            error_message,
            error_type: find_attribute(&span.attributes, "error.type").map(AnyValue::display),
            http_status_code: find_attribute(&span.attributes, "http.status_code")
                .and_then(AnyValue::as_i64),
            tags: span.relevant_tags(),
            logs,
        }
    }
}

/// `(end − start) / 1e6` milliseconds as `"<n>ms"`, or `"unknown"` for a span
/// that never ended (crashed or still running).
fn span_duration(span: &Span) -> String {
    let Some(end) = span.end_time_unix_nano.as_deref() else {
        return "unknown".to_string();
    };
    match (
        span.start_time_unix_nano.trim().parse::<u128>(),
        end.trim().parse::<u128>(),
    ) {
        (Ok(start_ns), Ok(end_ns)) => {
            format!("{}ms", end_ns.saturating_sub(start_ns) / 1_000_000)
        }
        _ => "unknown".to_string(),
    }
}

/// Extraction output: scan breadth, kept count, and the summaries in input
/// order. `traces.len() <= limit` always holds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedTraces {
    /// Resource-span groups examined -- a scan-breadth metric, not a span
    /// count
    pub total_traces_searched: usize,
    pub traces_returned: usize,
    pub traces: Vec<TraceSummary>,
}

/// Traces found for one service during fan-out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceTraceResult {
    pub service: String,
    pub trace_count: usize,
    pub traces: Vec<TraceSummary>,
}

/// Aggregate of a cross-service fan-out.
///
/// A service whose query failed is silently absent from `services`; absence
/// never means "zero traces".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllServicesResult {
    /// Services examined, including failed and empty ones
    pub total_services: usize,
    pub services_with_traces: usize,
    pub services: Vec<ServiceTraceResult>,
}
