//! Assembling the response a caller (typically an HTTP layer) serializes.
//!
//! `build_summary` is pure projection: field copying from the aggregation
//! totals, the window stats, and the echoed request parameters. No
//! computation happens here and no input is mutated.
//!
//! `aggregate` is the one entry point external layers call: it validates the
//! request, picks the frequency fast path when the hit source licenses it
//! (unconstrained pattern, single hit attribute at offset 0), runs the
//! accumulator, windows the groups, and assembles the response.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::accumulate::accumulate_hits;
use crate::corpus::{Corpus, DocumentFilter};
use crate::error::GroupError;
use crate::frequency::accumulate_frequency;
use crate::group::{Group, ResultTotals};
use crate::property::GroupingSpec;
use crate::types::{HitList, SubcorpusSize};
use crate::window::{window, SortOrder, WindowSpec, WindowStats};

/// One name/value pair of a group's `properties` list, mirroring the
/// grouping spec's order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyValue {
    pub name: String,
    pub value: String,
}

/// One group as serialized in the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HitGroup {
    pub identity: String,
    pub identity_display: String,
    pub size: u64,
    pub properties: Vec<PropertyValue>,
    pub number_of_docs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcorpus_size: Option<SubcorpusSize>,
}

/// The `summary` object: echoed parameters, totals, pagination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub search_param: BTreeMap<String, String>,
    pub window_first_result: u64,
    pub number_of_groups: u64,
    pub largest_group_size: u64,
    pub requested_window_size: u64,
    pub actual_window_size: u64,
    pub window_has_previous: bool,
    pub window_has_next: bool,
    pub still_counting: bool,
    pub number_of_hits: u64,
    pub number_of_hits_retrieved: u64,
    pub stopped_counting_hits: bool,
    pub stopped_retrieving_hits: bool,
    pub number_of_docs: u64,
    pub number_of_docs_retrieved: u64,
}

/// The full response body: `summary` plus the windowed `hitGroups` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub summary: Summary,
    pub hit_groups: Vec<HitGroup>,
}

/// Project one group into its wire form, pairing property names with the
/// identity components they produced.
fn project_group(spec: &GroupingSpec, group: &Group) -> HitGroup {
    let properties = spec
        .properties()
        .iter()
        .zip(group.identity.components())
        .map(|(property, component)| PropertyValue {
            name: property.name(),
            value: component.display(),
        })
        .collect();
    HitGroup {
        identity: group.identity.serialize(),
        identity_display: group.identity.display(),
        size: group.size,
        properties,
        number_of_docs: group.number_of_docs(),
        subcorpus_size: group.subcorpus_size,
    }
}

/// Pure assembly of totals + window stats + echoed parameters.
pub fn build_summary(
    spec: &GroupingSpec,
    groups: &[Group],
    stats: &WindowStats,
    totals: &ResultTotals,
    search_param: BTreeMap<String, String>,
) -> SummaryResponse {
    SummaryResponse {
        summary: Summary {
            search_param,
            window_first_result: stats.window_first_result,
            number_of_groups: stats.number_of_groups,
            largest_group_size: stats.largest_group_size,
            requested_window_size: stats.requested_window_size,
            actual_window_size: stats.actual_window_size,
            window_has_previous: stats.window_has_previous,
            window_has_next: stats.window_has_next,
            still_counting: totals.still_counting,
            number_of_hits: totals.total_hits,
            number_of_hits_retrieved: totals.total_hits_retrieved,
            stopped_counting_hits: totals.stopped_counting_hits,
            stopped_retrieving_hits: totals.stopped_retrieving_hits,
            number_of_docs: totals.total_docs,
            number_of_docs_retrieved: totals.total_docs_retrieved,
        },
        hit_groups: groups.iter().map(|g| project_group(spec, g)).collect(),
    }
}

/// Group, window, and summarize one request.
///
/// Takes the frequency fast path iff the hit source is flagged unconstrained
/// and the spec is a single hit attribute at offset 0; otherwise the regular
/// accumulator runs. Both paths produce identical results where both apply.
pub fn aggregate(
    corpus: &Corpus,
    hits: &HitList,
    spec: &GroupingSpec,
    filter: &DocumentFilter,
    sort: &SortOrder,
    window_spec: &WindowSpec,
    search_param: BTreeMap<String, String>,
) -> Result<SummaryResponse, GroupError> {
    let result = if hits.unconstrained && spec.as_single_hit_attribute().is_some() {
        accumulate_frequency(corpus, spec, filter)?
    } else {
        accumulate_hits(corpus, hits, spec, filter)?
    };
    let (groups, stats, totals) = window(result, sort, window_spec);
    Ok(build_summary(spec, &groups, &stats, &totals, search_param))
}
