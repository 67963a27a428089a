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

//! Read-only HTTP client for the tracing backend.
//!
//! Exposes the two endpoints the engine consumes: `GET /services` and
//! `GET /traces`. Transport and non-success failures surface as structured
//! errors; a single-service query has no fallback, so the caller decides
//! whether to propagate (direct query) or skip (fan-out).

use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use serde::Deserialize;
use tracing::debug;

use otelscope_core::{OtelscopeError, Result, TraceData};

/// Parameters for one `GET /traces` search
#[derive(Debug, Clone)]
pub struct TraceSearchParams {
    pub service: String,
    /// How far back from now to search
    pub lookback_ms: u64,
    /// Page-size hint forwarded as `search_depth`
    pub limit: usize,
    pub operation: Option<String>,
    /// e.g. `"100ms"`, forwarded verbatim as `duration_min`
    pub min_duration: Option<String>,
    /// Ask the backend to pre-filter to error traces (`attributes.error=true`)
    pub errors_only: bool,
}

#[derive(Debug, Deserialize)]
struct ServicesResponse {
    #[serde(default)]
    services: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TracesEnvelope {
    #[serde(default)]
    result: TraceData,
}

/// Client for the tracing backend's search API
#[derive(Debug, Clone)]
pub struct TraceClient {
    http: reqwest::Client,
    base_url: String,
}

impl TraceClient {
    pub fn new(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// `GET /services` -- the list of known service names
    pub async fn list_services(&self) -> Result<Vec<String>> {
        let url = format!("{}/services", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| OtelscopeError::TraceBackend(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OtelscopeError::TraceBackendStatus {
                context: "service list".to_string(),
                status: response.status().as_u16(),
            });
        }

        let body: ServicesResponse = response
            .json()
            .await
            .map_err(|e| OtelscopeError::MalformedResponse(e.to_string()))?;
        Ok(body.services)
    }

    /// `GET /traces` -- the hierarchical trace payload for one service over
    /// one time window
    pub async fn search(&self, params: &TraceSearchParams) -> Result<TraceData> {
        let now = Utc::now();
        let start = now - ChronoDuration::milliseconds(params.lookback_ms as i64);

        let mut query: Vec<(&str, String)> = vec![
            ("service_name", params.service.clone()),
            (
                "start_time_min",
                start.to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
            (
                "start_time_max",
                now.to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
            ("search_depth", params.limit.to_string()),
        ];
        if params.errors_only {
            query.push(("attributes.error", "true".to_string()));
        }
        if let Some(operation) = &params.operation {
            query.push(("operation_name", operation.clone()));
        }
        if let Some(min_duration) = &params.min_duration {
            query.push(("duration_min", min_duration.clone()));
        }

        debug!(service = %params.service, lookback_ms = params.lookback_ms, "trace search");

        let url = format!("{}/traces", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| OtelscopeError::TraceBackend(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OtelscopeError::TraceBackendStatus {
                context: format!("service {}", params.service),
                status: response.status().as_u16(),
            });
        }

        let body: TracesEnvelope = response
            .json()
            .await
            .map_err(|e| OtelscopeError::MalformedResponse(e.to_string()))?;
        Ok(body.result)
    }
}
