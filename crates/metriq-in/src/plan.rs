//! Execution planning: group resolved queries by region and hand them to a fetcher
use crate::normalizer::QueryOutcome;
use metriq_core::{ResolvedQuery, Sample, TimeSeriesFetcher, TransportError};
use std::collections::BTreeMap;

/// Resolved queries keyed by region, input order kept within a region
pub type RegionPlan = BTreeMap<String, Vec<ResolvedQuery>>;

/// Samples (or the transport failure) for one query
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub ref_id: String,
    pub region: String,
    pub result: Result<Vec<Sample>, TransportError>,
}

/// Group the successful outcomes of a batch by region
pub fn plan_by_region(outcomes: &[QueryOutcome]) -> RegionPlan {
    let mut plan = RegionPlan::new();
    for resolved in outcomes.iter().filter_map(|o| o.result.as_ref().ok()) {
        plan.entry(resolved.region.clone())
            .or_default()
            .push(resolved.clone());
    }
    plan
}

/// Fetch every planned query; a failed fetch does not stop the others
pub fn fetch_plan<F>(fetcher: &F, plan: &RegionPlan) -> Vec<FetchOutcome>
where
    F: TimeSeriesFetcher + ?Sized,
{
    let mut outcomes = Vec::new();
    for (region, queries) in plan {
        tracing::debug!(%region, count = queries.len(), "fetching region");
        for query in queries {
            let result = fetcher.fetch(query, region);
            if let Err(err) = &result {
                tracing::warn!(ref_id = %query.ref_id, %region, error = %err, "fetch failed");
            }
            outcomes.push(FetchOutcome {
                ref_id: query.ref_id.clone(),
                region: region.clone(),
                result,
            });
        }
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use metriq_core::{ApiMode, Dimensions, MetricEditorMode, MetricQueryType, QueryError};

    fn resolved(ref_id: &str, region: &str) -> ResolvedQuery {
        ResolvedQuery {
            ref_id: ref_id.to_string(),
            id: format!("query{}", ref_id),
            region: region.to_string(),
            namespace: "AWS/EC2".to_string(),
            metric_name: "CPUUtilization".to_string(),
            dimensions: Dimensions::new(),
            statistic: "Average".to_string(),
            period: 300,
            expression: String::new(),
            sql_expression: String::new(),
            metric_query_type: MetricQueryType::Search,
            metric_editor_mode: MetricEditorMode::Builder,
            api_mode: ApiMode::MetricStat,
            match_exact: true,
            alias: String::new(),
            label: String::new(),
            return_data: true,
        }
    }

    struct FlakyFetcher;

    impl TimeSeriesFetcher for FlakyFetcher {
        fn fetch(&self, query: &ResolvedQuery, region: &str) -> Result<Vec<Sample>, TransportError> {
            if query.ref_id == "B" {
                return Err(TransportError::new("GetMetricData", format!("throttled in {}", region)));
            }
            Ok(vec![Sample {
                timestamp: Utc.with_ymd_and_hms(2026, 10, 17, 11, 0, 0).unwrap(),
                value: 42.0,
            }])
        }
    }

    fn outcome(query: ResolvedQuery) -> QueryOutcome {
        QueryOutcome {
            ref_id: query.ref_id.clone(),
            result: Ok(query),
        }
    }

    #[test]
    fn test_plan_groups_by_region() {
        let outcomes = vec![
            outcome(resolved("A", "us-east-1")),
            outcome(resolved("B", "eu-west-1")),
            QueryOutcome {
                ref_id: "C".to_string(),
                result: Err(QueryError::Parse(metriq_core::ParseError::InvalidStatistic)),
            },
            outcome(resolved("D", "us-east-1")),
        ];
        let plan = plan_by_region(&outcomes);

        assert_eq!(plan.len(), 2);
        let east: Vec<_> = plan["us-east-1"].iter().map(|q| q.ref_id.as_str()).collect();
        assert_eq!(east, vec!["A", "D"]);
        assert_eq!(plan["eu-west-1"].len(), 1);
    }

    #[test]
    fn test_fetch_failure_is_isolated() {
        let plan = plan_by_region(&[
            outcome(resolved("A", "us-east-1")),
            outcome(resolved("B", "us-east-1")),
        ]);
        let results = fetch_plan(&FlakyFetcher, &plan);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].result.as_ref().unwrap().len(), 1);
        assert_eq!(
            results[1].result,
            Err(TransportError::new("GetMetricData", "throttled in us-east-1"))
        );
    }
}
