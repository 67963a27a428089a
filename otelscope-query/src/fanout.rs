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

//! Cross-service fan-out.
//!
//! Enumerates every known service and queries each one independently.
//! Queries go out sequentially, one in flight at a time: the policy trades
//! latency for tracing-backend load, and is kept explicit here rather than
//! silently parallelized. One service's failure is logged and skipped; it
//! must never abort the aggregate or hide another service's results.

use tracing::{debug, warn};

use otelscope_core::{
    extract_trace_summaries, AllServicesResult, Result, ServiceTraceResult, Span, TraceFilter,
};

use crate::trace::{TraceClient, TraceSearchParams};

/// Fan-out parameters shared across every per-service query
#[derive(Debug, Clone)]
pub struct FanOutParams {
    pub lookback_ms: u64,
    /// Per-service summary cap
    pub limit: usize,
    pub operation: Option<String>,
    pub min_duration: Option<String>,
    pub filter: TraceFilter,
}

/// Query every known service and aggregate the results.
///
/// Failure to fetch the service list propagates (there is nothing to fan out
/// over); per-service failures degrade. A service with zero qualifying
/// traces is omitted from `services` but still counted in `total_services`.
pub async fn fetch_all_services(
    client: &TraceClient,
    params: &FanOutParams,
) -> Result<AllServicesResult> {
    let services = client.list_services().await?;
    let total_services = services.len();
    debug!(total_services, "fanning out trace queries");

    let predicate = |span: &Span| params.filter.matches(span);
    let filter: Option<&dyn Fn(&Span) -> bool> = match params.filter {
        TraceFilter::All => None,
        _ => Some(&predicate),
    };

    let mut per_service: Vec<ServiceTraceResult> = Vec::new();
    for service in &services {
        let search = TraceSearchParams {
            service: service.clone(),
            lookback_ms: params.lookback_ms,
            limit: params.limit,
            operation: params.operation.clone(),
            min_duration: params.min_duration.clone(),
            errors_only: params.filter == TraceFilter::Errors,
        };

        match client.search(&search).await {
            Ok(data) => {
                let extracted = extract_trace_summaries(&data, params.limit, filter);
                if !extracted.traces.is_empty() {
                    per_service.push(ServiceTraceResult {
                        service: service.clone(),
                        trace_count: extracted.traces.len(),
                        traces: extracted.traces,
                    });
                }
            }
            Err(e) => {
                warn!(service = %service, error = %e, "skipping service after failed trace query");
            }
        }
    }

    Ok(AllServicesResult {
        total_services,
        services_with_traces: per_service.len(),
        services: per_service,
    })
}
