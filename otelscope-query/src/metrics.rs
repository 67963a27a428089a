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

//! Read-only HTTP client for the metrics backend.
//!
//! Issues single instant queries (`GET /query?query=<expr>`). Transport
//! errors, non-2xx statuses, parse failures and non-`success` payloads all
//! degrade to "no result" -- callers cannot distinguish "backend down" from
//! "empty result set" at this layer, by design, so a failed sub-query can
//! never block a health report.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

/// Parsed body of one instant query
#[derive(Debug, Clone, Deserialize)]
pub struct PromData {
    #[serde(default, rename = "resultType")]
    pub result_type: String,
    #[serde(default)]
    pub result: Vec<PromSeries>,
}

/// One (label-set, sample) pair from an instant query
#[derive(Debug, Clone, Deserialize)]
pub struct PromSeries {
    #[serde(default)]
    pub metric: HashMap<String, String>,
    /// `[unix_ts, "stringNumber"]`
    pub value: Option<(f64, String)>,
}

#[derive(Debug, Deserialize)]
struct PromResponse {
    #[serde(default)]
    status: String,
    data: Option<PromData>,
}

/// First series' numeric value, or `default` when the result is absent,
/// empty, or unparseable.
pub fn scalar(result: Option<&PromData>, default: f64) -> f64 {
    result
        .and_then(|data| data.result.first())
        .and_then(|series| series.value.as_ref())
        .and_then(|(_, raw)| raw.parse::<f64>().ok())
        .unwrap_or(default)
}

/// Every series as a (label map, value) pair; an absent or unparseable value
/// defaults to 0 rather than dropping the series.
pub fn top_k(result: Option<&PromData>) -> Vec<(HashMap<String, String>, f64)> {
    result
        .map(|data| {
            data.result
                .iter()
                .map(|series| {
                    let value = series
                        .value
                        .as_ref()
                        .and_then(|(_, raw)| raw.parse::<f64>().ok())
                        .unwrap_or(0.0);
                    (series.metric.clone(), value)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Client for the metrics backend's instant query API
#[derive(Debug, Clone)]
pub struct MetricsClient {
    http: reqwest::Client,
    base_url: String,
}

impl MetricsClient {
    pub fn new(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Issue one instant query. Any ordinary backend failure is `None`,
    /// never an error.
    pub async fn query(&self, expression: &str) -> Option<PromData> {
        let url = format!("{}/query", self.base_url);
        let response = match self.http.get(&url).query(&[("query", expression)]).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "metrics query transport failure");
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(status = %response.status(), "metrics query rejected");
            return None;
        }

        let body: PromResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                debug!(error = %e, "metrics query returned malformed body");
                return None;
            }
        };

        if body.status != "success" {
            debug!(status = %body.status, "metrics query unsuccessful");
            return None;
        }
        body.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> PromData {
        serde_json::from_value(json!({
            "resultType": "vector",
            "result": [
                { "metric": { "span_name": "GET /cart" }, "value": [1700000000.0, "12.5"] },
                { "metric": { "span_name": "POST /checkout" } },
                { "metric": {}, "value": [1700000000.0, "not-a-number"] }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_scalar_defaults() {
        assert_eq!(scalar(None, 0.0), 0.0);
        assert_eq!(scalar(None, 7.0), 7.0);

        let empty: PromData = serde_json::from_value(json!({ "result": [] })).unwrap();
        assert_eq!(scalar(Some(&empty), 3.0), 3.0);

        assert_eq!(scalar(Some(&sample()), 0.0), 12.5);
    }

    #[test]
    fn test_top_k_keeps_valueless_series_as_zero() {
        assert!(top_k(None).is_empty());

        let pairs = top_k(Some(&sample()));
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0].1, 12.5);
        assert_eq!(pairs[0].0.get("span_name").map(String::as_str), Some("GET /cart"));
        assert_eq!(pairs[1].1, 0.0);
        assert_eq!(pairs[2].1, 0.0);
    }
}
