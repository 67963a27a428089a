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

//! Trace extraction pipeline.
//!
//! Walks the three-level trace response (resource spans, scope spans, spans)
//! in input order, applies an optional predicate before compaction, and caps
//! output size while tracking scanned-vs-kept counts. No sorting, no
//! deduplication.

use crate::otlp::{Span, TraceData};
use crate::summary::{ExtractedTraces, TraceSummary};

/// Walk `data` and keep at most `limit` summaries.
///
/// The predicate, when given, runs on the raw span; compaction never runs on
/// a rejected span. Iteration stops at every nesting level as soon as the cap
/// is reached. `total_traces_searched` counts resource-span groups entered,
/// not individual spans.
pub fn extract_trace_summaries(
    data: &TraceData,
    limit: usize,
    filter: Option<&dyn Fn(&Span) -> bool>,
) -> ExtractedTraces {
    let mut traces: Vec<TraceSummary> = Vec::new();
    let mut searched = 0usize;

    'groups: for group in &data.resource_spans {
        if traces.len() >= limit {
            break;
        }
        searched += 1;
        let service = group.service_name();

        for scope in &group.scope_spans {
            for span in &scope.spans {
                if traces.len() >= limit {
                    break 'groups;
                }
                if let Some(predicate) = filter {
                    if !predicate(span) {
                        continue;
                    }
                }
                traces.push(TraceSummary::from_span(span, &service));
            }
        }
    }

    ExtractedTraces {
        total_traces_searched: searched,
        traces_returned: traces.len(),
        traces,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::otlp::{AnyValue, KeyValue, Resource, ResourceSpans, ScopeSpans, Status};
    use proptest::prelude::*;

    fn group(service: &str, span_counts: &[usize]) -> ResourceSpans {
        ResourceSpans {
            resource: Some(Resource {
                attributes: vec![KeyValue {
                    key: "service.name".into(),
                    value: Some(AnyValue::StringValue(service.into())),
                }],
            }),
            scope_spans: span_counts
                .iter()
                .map(|&n| ScopeSpans {
                    scope: None,
                    spans: (0..n)
                        .map(|i| Span {
                            trace_id: format!("{service}-trace-{i}"),
                            span_id: format!("{service}-span-{i}"),
                            name: format!("op-{i}"),
                            start_time_unix_nano: "1700000000000000000".into(),
                            end_time_unix_nano: Some("1700000000001000000".into()),
                            ..Default::default()
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_limit_caps_output_and_stops_scanning() {
        let data = TraceData {
            resource_spans: vec![group("a", &[3]), group("b", &[3]), group("c", &[3])],
        };

        let extracted = extract_trace_summaries(&data, 4, None);
        assert_eq!(extracted.traces.len(), 4);
        assert_eq!(extracted.traces_returned, 4);
        // The cap is hit inside the second group; the third is never entered.
        assert_eq!(extracted.total_traces_searched, 2);
        assert_eq!(extracted.traces[0].service, "a");
        assert_eq!(extracted.traces[3].service, "b");
    }

    #[test]
    fn test_zero_limit_yields_empty_without_scanning() {
        let data = TraceData {
            resource_spans: vec![group("a", &[2])],
        };
        let extracted = extract_trace_summaries(&data, 0, None);
        assert!(extracted.traces.is_empty());
        assert_eq!(extracted.total_traces_searched, 0);
    }

    #[test]
    fn test_predicate_runs_before_compaction() {
        let mut data = TraceData {
            resource_spans: vec![group("a", &[4])],
        };
        // Mark spans 1 and 3 as errors.
        for (i, span) in data.resource_spans[0].scope_spans[0].spans.iter_mut().enumerate() {
            if i % 2 == 1 {
                span.status = Some(Status {
                    code: 2,
                    message: None,
                });
            }
        }

        let errors_only = |span: &Span| span.is_error();
        let extracted = extract_trace_summaries(&data, 10, Some(&errors_only));
        assert_eq!(extracted.traces.len(), 2);
        assert!(extracted
            .traces
            .iter()
            .all(|t| t.status == crate::otlp::SpanOutcome::Error));
    }

    #[test]
    fn test_output_preserves_input_order() {
        let data = TraceData {
            resource_spans: vec![group("b", &[2]), group("a", &[2])],
        };
        let extracted = extract_trace_summaries(&data, 10, None);
        let services: Vec<&str> = extracted.traces.iter().map(|t| t.service.as_str()).collect();
        assert_eq!(services, vec!["b", "b", "a", "a"]);
    }

    proptest! {
        #[test]
        fn prop_never_exceeds_limit(
            group_sizes in proptest::collection::vec(0usize..6, 0..6),
            limit in 0usize..20,
        ) {
            let data = TraceData {
                resource_spans: group_sizes
                    .iter()
                    .map(|&n| group("svc", &[n]))
                    .collect(),
            };
            let extracted = extract_trace_summaries(&data, limit, None);
            prop_assert!(extracted.traces.len() <= limit);
            prop_assert_eq!(extracted.traces_returned, extracted.traces.len());
            prop_assert!(extracted.total_traces_searched <= group_sizes.len());
        }
    }
}
