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

//! Error types shared across the Otelscope engine.
//!
//! Every failure crossing the engine boundary is a structured kind plus
//! message, never a raw panic or stack trace.

use thiserror::Error;

/// Result alias used throughout the engine
pub type Result<T> = std::result::Result<T, OtelscopeError>;

/// Errors produced by the telemetry engine
#[derive(Debug, Error)]
pub enum OtelscopeError {
    /// A time window string did not match `<integer><s|m|h|d>`
    #[error("invalid time window format: {0:?} (expected e.g. \"30s\", \"15m\", \"2h\", \"7d\")")]
    InvalidTimeWindow(String),

    /// A required configuration value was absent
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    /// The tracing backend could not be reached
    #[error("trace backend request failed: {0}")]
    TraceBackend(String),

    /// The tracing backend answered with a non-success HTTP status
    #[error("trace backend returned HTTP {status} for {context}")]
    TraceBackendStatus { context: String, status: u16 },

    /// A backend response could not be decoded
    #[error("malformed backend response: {0}")]
    MalformedResponse(String),

    /// A report could not be serialized for output
    #[error("report serialization failed: {0}")]
    Serialization(String),
}
