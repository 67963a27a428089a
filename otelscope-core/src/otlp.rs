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

//! OTLP/JSON wire model for the tracing backend's trace search response.
//!
//! The backend groups spans three levels deep: resource spans (one group per
//! originating service/process), scope spans (one group per instrumentation
//! library), and finally the spans themselves. The hierarchy is read-only
//! input; the engine never mutates it.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Attribute key prefixes surfaced in trace summaries. Everything outside
/// these namespaces is dropped to bound payload size.
pub const RELEVANT_TAG_PREFIXES: &[&str] = &["error.", "http.", "db.", "rpc.", "messaging."];

/// Resource attribute carrying the owning service name
pub const SERVICE_NAME_KEY: &str = "service.name";

/// Service name substituted when the resource omits `service.name`
pub const UNKNOWN_SERVICE: &str = "unknown";

/// An OTLP attribute value: a tagged union where exactly one variant is
/// populated.
///
/// OTLP/JSON encodes `intValue` as a decimal string because int64 exceeds
/// JSON's safe integer range; both string and number encodings are accepted.
/// Composite variants (`arrayValue`, `kvlistValue`) are not modeled; a
/// [`KeyValue`] holding one decodes to "no value" and is skipped downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnyValue {
    StringValue(String),
    #[serde(deserialize_with = "int_from_string_or_number")]
    IntValue(i64),
    BoolValue(bool),
    DoubleValue(f64),
}

impl AnyValue {
    /// Render the populated variant as a JSON value for tag maps
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AnyValue::StringValue(s) => serde_json::Value::String(s.clone()),
            AnyValue::IntValue(i) => serde_json::Value::from(*i),
            AnyValue::BoolValue(b) => serde_json::Value::Bool(*b),
            AnyValue::DoubleValue(d) => {
                serde_json::Number::from_f64(*d).map_or(serde_json::Value::Null, serde_json::Value::Number)
            }
        }
    }

    /// Render the populated variant as display text
    pub fn display(&self) -> String {
        match self {
            AnyValue::StringValue(s) => s.clone(),
            AnyValue::IntValue(i) => i.to_string(),
            AnyValue::BoolValue(b) => b.to_string(),
            AnyValue::DoubleValue(d) => d.to_string(),
        }
    }

    /// Interpret the value as an integer where it plausibly is one
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AnyValue::IntValue(i) => Some(*i),
            AnyValue::StringValue(s) => s.parse().ok(),
            AnyValue::DoubleValue(d) if d.fract() == 0.0 => Some(*d as i64),
            _ => None,
        }
    }
}

fn int_from_string_or_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntRepr {
        Number(i64),
        Text(String),
    }

    match IntRepr::deserialize(deserializer)? {
        IntRepr::Number(n) => Ok(n),
        IntRepr::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

/// An attribute: a key plus an optionally populated value.
///
/// Values that cannot be decoded (empty objects, composite variants) become
/// `None` rather than failing the surrounding payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    #[serde(default)]
    pub key: String,
    #[serde(default, deserialize_with = "lenient_any_value")]
    pub value: Option<AnyValue>,
}

fn lenient_any_value<'de, D>(deserializer: D) -> Result<Option<AnyValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).ok())
}

/// Linear scan for the first attribute matching `key`.
///
/// An empty slice is an ordinary miss, not an error.
pub fn find_attribute<'a>(attributes: &'a [KeyValue], key: &str) -> Option<&'a AnyValue> {
    attributes
        .iter()
        .find(|attr| attr.key == key)
        .and_then(|attr| attr.value.as_ref())
}

/// Span status carried by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub code: i64,
    pub message: Option<String>,
}

/// Tri-state span outcome derived from the status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanOutcome {
    Ok,
    Error,
    Unset,
}

impl SpanOutcome {
    /// Status code 1 is ok, 2 is error, anything else (including an absent
    /// status) is unset.
    pub fn from_status(status: Option<&Status>) -> Self {
        match status.map(|s| s.code) {
            Some(1) => SpanOutcome::Ok,
            Some(2) => SpanOutcome::Error,
            _ => SpanOutcome::Unset,
        }
    }
}

impl std::fmt::Display for SpanOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpanOutcome::Ok => write!(f, "ok"),
            SpanOutcome::Error => write!(f, "error"),
            SpanOutcome::Unset => write!(f, "unset"),
        }
    }
}

/// A log line or exception raised during a span's lifetime
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanEvent {
    #[serde(default)]
    pub time_unix_nano: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<KeyValue>,
}

/// One timed unit of work within a distributed trace.
///
/// Timestamps are nanoseconds since epoch carried as strings. A span with no
/// end time has unknown duration (crashed or still running); that alone never
/// makes it an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    #[serde(default)]
    pub trace_id: String,
    #[serde(default)]
    pub span_id: String,
    pub parent_span_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_time_unix_nano: String,
    pub end_time_unix_nano: Option<String>,
    #[serde(default)]
    pub attributes: Vec<KeyValue>,
    #[serde(default)]
    pub events: Vec<SpanEvent>,
    pub status: Option<Status>,
}

impl Span {
    /// Tri-state outcome of this span
    pub fn outcome(&self) -> SpanOutcome {
        SpanOutcome::from_status(self.status.as_ref())
    }

    /// True exactly when the status code is 2
    pub fn is_error(&self) -> bool {
        self.outcome() == SpanOutcome::Error
    }

    /// Negation of [`Span::is_error`]; an unset status counts as successful.
    ///
    /// The binary split is intentional: filtering wants a clean
    /// error/non-error divide, not "unset" as a third failure mode.
    pub fn is_success(&self) -> bool {
        !self.is_error()
    }

    /// Map of attributes within the well-known namespaces
    /// ([`RELEVANT_TAG_PREFIXES`]); undecodable values are skipped, never
    /// inserted as null.
    pub fn relevant_tags(&self) -> BTreeMap<String, serde_json::Value> {
        self.attributes
            .iter()
            .filter(|attr| {
                RELEVANT_TAG_PREFIXES
                    .iter()
                    .any(|prefix| attr.key.starts_with(prefix))
            })
            .filter_map(|attr| attr.value.as_ref().map(|v| (attr.key.clone(), v.to_json())))
            .collect()
    }
}

/// Caller-selectable span filter applied before compaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceFilter {
    #[default]
    All,
    Errors,
    Successful,
}

impl TraceFilter {
    /// Whether `span` passes this filter
    pub fn matches(&self, span: &Span) -> bool {
        match self {
            TraceFilter::All => true,
            TraceFilter::Errors => span.is_error(),
            TraceFilter::Successful => span.is_success(),
        }
    }
}

/// Instrumentation scope grouping spans within a resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentationScope {
    pub name: Option<String>,
    pub version: Option<String>,
}

/// Spans grouped by instrumentation library
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeSpans {
    pub scope: Option<InstrumentationScope>,
    #[serde(default)]
    pub spans: Vec<Span>,
}

/// The process/service a group of spans originated from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub attributes: Vec<KeyValue>,
}

/// Spans grouped by originating service/process
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpans {
    pub resource: Option<Resource>,
    #[serde(default)]
    pub scope_spans: Vec<ScopeSpans>,
}

impl ResourceSpans {
    /// Owning service name from the `service.name` resource attribute,
    /// defaulting to `"unknown"`.
    pub fn service_name(&self) -> String {
        self.resource
            .as_ref()
            .and_then(|r| find_attribute(&r.attributes, SERVICE_NAME_KEY))
            .map(AnyValue::display)
            .unwrap_or_else(|| UNKNOWN_SERVICE.to_string())
    }
}

/// The hierarchical body of a trace search response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceData {
    #[serde(default)]
    pub resource_spans: Vec<ResourceSpans>,
}
