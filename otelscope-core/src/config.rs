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

//! Engine configuration.
//!
//! Backend locations are carried in an explicit config struct threaded into
//! every client constructor, so the engine can be tested against injected
//! fake backends. A missing required URL is a structured error at resolve
//! time, never a silent default.

use std::env;
use std::time::Duration;

use crate::error::{OtelscopeError, Result};

/// Environment variable naming the tracing backend base URL
pub const TRACE_BACKEND_URL_VAR: &str = "TRACE_BACKEND_URL";

/// Environment variable naming the metrics backend base URL
pub const METRICS_BACKEND_URL_VAR: &str = "METRICS_BACKEND_URL";

/// Environment variable overriding the outbound request timeout (seconds)
pub const BACKEND_TIMEOUT_VAR: &str = "BACKEND_TIMEOUT_SECS";

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for the telemetry engine's two read-only HTTP backends
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Tracing backend base URL (no trailing slash)
    pub trace_backend_url: String,

    /// Metrics backend base URL (no trailing slash)
    pub metrics_backend_url: String,

    /// Timeout applied to every outbound backend call
    pub request_timeout: Duration,
}

impl EngineConfig {
    /// Create a config from explicit backend URLs with the default timeout
    pub fn new(trace_backend_url: impl Into<String>, metrics_backend_url: impl Into<String>) -> Self {
        Self {
            trace_backend_url: normalize(trace_backend_url.into()),
            metrics_backend_url: normalize(metrics_backend_url.into()),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Resolve the config from the process environment.
    ///
    /// Both backend URLs are required; absence of either is fatal to the
    /// operation being served, not to process startup.
    pub fn from_env() -> Result<Self> {
        let trace_backend_url = require(TRACE_BACKEND_URL_VAR)?;
        let metrics_backend_url = require(METRICS_BACKEND_URL_VAR)?;
        let timeout_secs = env::var(BACKEND_TIMEOUT_VAR)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            trace_backend_url: normalize(trace_backend_url),
            metrics_backend_url: normalize(metrics_backend_url),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Override the outbound request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

fn require(var: &str) -> Result<String> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(OtelscopeError::MissingConfig(format!(
            "{var} must be set to a backend base URL"
        ))),
    }
}

fn normalize(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
