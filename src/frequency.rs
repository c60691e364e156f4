//! The frequency fast path: grouping without touching individual hits.
//!
//! When the pattern places no constraint on token content, every token
//! position is a hit, so per-group statistics can be read straight off a
//! precomputed (attribute value → per-document count) table joined against
//! the filtered document set. Summing counts gives the group size; counting
//! filtered documents with a nonzero count gives `numberOfDocs`.
//!
//! This path must produce results identical to the regular accumulator for
//! the same spec and filter — that equivalence is the core correctness
//! property of the subsystem, and it is cross-tested continuously rather
//! than trusted to review (see `tests/property.rs`). The only divergence is
//! the per-group example hit: this path never materializes hits, so there is
//! none to store.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::corpus::{Corpus, DocumentFilter};
use crate::error::GroupError;
use crate::group::{AggregationResult, Group, GroupIdentity, PropValue, ResultTotals};
use crate::property::{GroupingSpec, Sensitivity};
use crate::types::DocId;

/// Per-attribute token frequencies: folded value → per-document count.
///
/// Corpus-scoped cached state, owned by the corpus and dropped on reload
/// (see `Corpus::frequency_table`). BTreeMaps keep construction and
/// iteration order deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    attribute: String,
    sensitivity: Sensitivity,
    counts: BTreeMap<String, BTreeMap<DocId, u64>>,
}

impl FrequencyTable {
    /// Walk the corpus once and tally every token of the attribute layer.
    pub fn build(corpus: &Corpus, attribute: &str, sensitivity: Sensitivity) -> Self {
        let mut counts: BTreeMap<String, BTreeMap<DocId, u64>> = BTreeMap::new();
        for doc in corpus.doc_ids() {
            for pos in 0..corpus.doc_len(doc) {
                if let Some(token) = corpus.token_attribute(doc, pos, attribute) {
                    *counts
                        .entry(sensitivity.fold(token))
                        .or_default()
                        .entry(doc)
                        .or_insert(0) += 1;
                }
            }
        }
        FrequencyTable {
            attribute: attribute.to_string(),
            sensitivity,
            counts,
        }
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn sensitivity(&self) -> Sensitivity {
        self.sensitivity
    }

    /// Number of distinct (folded) values.
    pub fn num_values(&self) -> usize {
        self.counts.len()
    }

    /// Total occurrences of one value in a document.
    pub fn count(&self, value: &str, doc: DocId) -> u64 {
        self.counts
            .get(value)
            .and_then(|docs| docs.get(&doc))
            .copied()
            .unwrap_or(0)
    }
}

/// Group every token position by the spec, using the frequency table.
///
/// Only legal for a spec of exactly one hit attribute at offset 0; anything
/// else is `UnsupportedGroupingSpec` and the caller must fall back to the
/// regular path (`aggregate` does this automatically).
pub fn accumulate_frequency(
    corpus: &Corpus,
    spec: &GroupingSpec,
    filter: &DocumentFilter,
) -> Result<AggregationResult, GroupError> {
    spec.validate(corpus)?;
    filter.validate(corpus)?;
    let (attribute, sensitivity) = spec
        .as_single_hit_attribute()
        .ok_or_else(|| GroupError::UnsupportedGroupingSpec(spec.name()))?;

    let table = corpus.frequency_table(attribute, sensitivity)?;

    let mut groups: HashMap<GroupIdentity, Group> = HashMap::new();
    let mut docs_seen: HashSet<DocId> = HashSet::new();
    let mut total_hits: u64 = 0;

    for (value, doc_counts) in &table.counts {
        let identity = GroupIdentity::new(vec![PropValue::ContextWord {
            attribute: attribute.to_string(),
            sensitivity,
            word: Some(value.clone()),
        }]);
        let mut group = Group::new(identity.clone());
        for (&doc, &count) in doc_counts {
            if !filter.accepts(corpus, doc) {
                continue;
            }
            group.size += count;
            group.docs.insert(doc);
        }
        // A value whose documents are all filtered out forms no group.
        if group.size > 0 {
            total_hits += group.size;
            docs_seen.extend(group.docs.iter().copied());
            groups.insert(identity, group);
        }
    }

    Ok(AggregationResult {
        totals: ResultTotals {
            total_hits,
            total_hits_retrieved: total_hits,
            total_docs: docs_seen.len() as u64,
            total_docs_retrieved: docs_seen.len() as u64,
            ..ResultTotals::default()
        },
        groups,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulate::accumulate_hits;
    use crate::testing::{filtered_to, groups_by_identity, very_corpus};

    #[test]
    fn table_counts_per_document() {
        let corpus = very_corpus();
        let table = FrequencyTable::build(&corpus, "word", Sensitivity::Insensitive);
        assert_eq!(table.count("very", DocId(0)), 3);
        assert_eq!(table.count("very", DocId(1)), 4);
        assert_eq!(table.count("much", DocId(0)), 1);
        assert_eq!(table.count("nosuchword", DocId(0)), 0);
        assert_eq!(table.attribute(), "word");
    }

    #[test]
    fn rejects_incompatible_specs() {
        let corpus = very_corpus();
        for bad in ["wordright:word:i", "hit:word:i,field:title", "field:title"] {
            let spec: GroupingSpec = bad.parse().unwrap();
            assert_eq!(
                accumulate_frequency(&corpus, &spec, &DocumentFilter::All).unwrap_err(),
                GroupError::UnsupportedGroupingSpec(spec.name())
            );
        }
    }

    #[test]
    fn matches_regular_path_unfiltered() {
        let corpus = very_corpus();
        let spec: GroupingSpec = "hit:word:i".parse().unwrap();

        let fast = accumulate_frequency(&corpus, &spec, &DocumentFilter::All).unwrap();
        let regular = accumulate_hits(
            &corpus,
            &corpus.all_token_hits(),
            &spec,
            &DocumentFilter::All,
        )
        .unwrap();

        assert_eq!(groups_by_identity(&fast), groups_by_identity(&regular));
        assert_eq!(fast.totals, regular.totals);
    }

    #[test]
    fn matches_regular_path_filtered() {
        let corpus = very_corpus();
        let spec: GroupingSpec = "hit:word:i".parse().unwrap();
        let filter = filtered_to(&corpus, 1);

        let fast = accumulate_frequency(&corpus, &spec, &filter).unwrap();
        let regular = accumulate_hits(&corpus, &corpus.all_token_hits(), &spec, &filter).unwrap();

        assert_eq!(groups_by_identity(&fast), groups_by_identity(&regular));
        assert_eq!(fast.totals, regular.totals);
        assert_eq!(fast.totals.total_docs, 1);
    }

    #[test]
    fn fast_path_groups_carry_no_example() {
        let corpus = very_corpus();
        let spec: GroupingSpec = "hit:word:i".parse().unwrap();
        let fast = accumulate_frequency(&corpus, &spec, &DocumentFilter::All).unwrap();
        assert!(fast.groups.values().all(|g| g.example.is_none()));
    }
}
