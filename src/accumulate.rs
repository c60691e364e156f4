//! The regular accumulation path: one pass over the hit stream.
//!
//! Every hit that passes the document filter is resolved to a group identity
//! and folded into its group: size, the group-local distinct-document set,
//! and the first hit kept as a display example. Runs to stream exhaustion;
//! any truncation was decided upstream by the matcher and only its flags are
//! propagated here.
//!
//! The pass is deterministic: the same hit list, spec, and filter always
//! produce the same result (set equality over groups, identical totals).
//! The parallel variant partitions the stream, folds partial group maps, and
//! merges them in partition order, so examples and all counts come out
//! identical to the serial pass.

use std::collections::{HashMap, HashSet};

use crate::corpus::{Corpus, DocumentFilter};
use crate::error::GroupError;
use crate::group::{AggregationResult, Group, GroupIdentity, ResultTotals};
use crate::property::{GroupProperty, GroupingSpec};
use crate::types::{DocId, HitList, SubcorpusSize, Truncation};

/// Group a hit list by the spec, restricted to documents passing the filter.
pub fn accumulate_hits(
    corpus: &Corpus,
    hits: &HitList,
    spec: &GroupingSpec,
    filter: &DocumentFilter,
) -> Result<AggregationResult, GroupError> {
    spec.validate(corpus)?;
    filter.validate(corpus)?;

    let mut groups: HashMap<GroupIdentity, Group> = HashMap::new();
    let mut docs_seen: HashSet<DocId> = HashSet::new();
    let mut retrieved: u64 = 0;

    for hit in &hits.hits {
        if !filter.accepts(corpus, hit.doc) {
            continue;
        }
        retrieved += 1;
        docs_seen.insert(hit.doc);

        let identity = spec.resolve(corpus, hit);
        let group = groups
            .entry(identity.clone())
            .or_insert_with(|| Group::new(identity));
        group.size += 1;
        group.docs.insert(hit.doc);
        if group.example.is_none() {
            group.example = Some(*hit);
        }
    }

    attach_subcorpus_sizes(corpus, spec, filter, &mut groups);
    Ok(AggregationResult {
        totals: totals_from(&hits.truncation, retrieved, docs_seen.len() as u64),
        groups,
    })
}

/// Parallel variant: partition the stream, fold per partition, merge.
///
/// Sizes add, document sets union (never sum), examples keep the earliest
/// partition's hit. Requires no locks; each partition owns its partial map.
#[cfg(feature = "parallel")]
pub fn accumulate_hits_parallel(
    corpus: &Corpus,
    hits: &HitList,
    spec: &GroupingSpec,
    filter: &DocumentFilter,
) -> Result<AggregationResult, GroupError> {
    use rayon::prelude::*;

    spec.validate(corpus)?;
    filter.validate(corpus)?;

    struct Partial {
        groups: HashMap<GroupIdentity, Group>,
        docs: HashSet<DocId>,
        retrieved: u64,
    }

    const CHUNK: usize = 4096;
    let partials: Vec<Partial> = hits
        .hits
        .par_chunks(CHUNK)
        .map(|chunk| {
            let mut partial = Partial {
                groups: HashMap::new(),
                docs: HashSet::new(),
                retrieved: 0,
            };
            for hit in chunk {
                if !filter.accepts(corpus, hit.doc) {
                    continue;
                }
                partial.retrieved += 1;
                partial.docs.insert(hit.doc);
                let identity = spec.resolve(corpus, hit);
                let group = partial
                    .groups
                    .entry(identity.clone())
                    .or_insert_with(|| Group::new(identity));
                group.size += 1;
                group.docs.insert(hit.doc);
                if group.example.is_none() {
                    group.example = Some(*hit);
                }
            }
            partial
        })
        .collect();

    let mut groups: HashMap<GroupIdentity, Group> = HashMap::new();
    let mut docs_seen: HashSet<DocId> = HashSet::new();
    let mut retrieved: u64 = 0;
    // Merge in partition order so the kept example matches the serial pass.
    for partial in partials {
        retrieved += partial.retrieved;
        docs_seen.extend(partial.docs);
        for (identity, partial_group) in partial.groups {
            match groups.entry(identity) {
                std::collections::hash_map::Entry::Vacant(slot) => {
                    slot.insert(partial_group);
                }
                std::collections::hash_map::Entry::Occupied(mut slot) => {
                    let group = slot.get_mut();
                    group.size += partial_group.size;
                    group.docs.extend(partial_group.docs);
                }
            }
        }
    }

    attach_subcorpus_sizes(corpus, spec, filter, &mut groups);
    Ok(AggregationResult {
        totals: totals_from(&hits.truncation, retrieved, docs_seen.len() as u64),
        groups,
    })
}

/// Counted totals fall back to retrieved totals when the matcher did not
/// keep counting past its cap; they never undercut what was retrieved.
pub(crate) fn totals_from(
    truncation: &Truncation,
    retrieved_hits: u64,
    retrieved_docs: u64,
) -> ResultTotals {
    ResultTotals {
        total_hits: truncation
            .hits_counted
            .unwrap_or(retrieved_hits)
            .max(retrieved_hits),
        total_hits_retrieved: retrieved_hits,
        total_docs: truncation
            .docs_counted
            .unwrap_or(retrieved_docs)
            .max(retrieved_docs),
        total_docs_retrieved: retrieved_docs,
        still_counting: truncation.still_counting,
        stopped_counting_hits: truncation.stopped_counting_hits,
        stopped_retrieving_hits: truncation.stopped_retrieving_hits,
    }
}

/// Fill per-group subcorpus sizes for specs with document-field components:
/// the filtered documents whose field values equal the group's field
/// components, with their summed token counts.
fn attach_subcorpus_sizes(
    corpus: &Corpus,
    spec: &GroupingSpec,
    filter: &DocumentFilter,
    groups: &mut HashMap<GroupIdentity, Group>,
) {
    if !spec.has_document_fields() {
        return;
    }
    let field_positions: Vec<usize> = spec
        .properties()
        .iter()
        .enumerate()
        .filter(|(_, p)| matches!(p, GroupProperty::DocumentField { .. }))
        .map(|(i, _)| i)
        .collect();

    let mut per_tuple: HashMap<Vec<crate::group::PropValue>, SubcorpusSize> = HashMap::new();
    for doc in corpus.doc_ids() {
        if !filter.accepts(corpus, doc) {
            continue;
        }
        let tuple: Vec<_> = field_positions
            .iter()
            .filter_map(|&i| spec.properties()[i].resolve_for_doc(corpus, doc))
            .collect();
        let entry = per_tuple.entry(tuple).or_insert(SubcorpusSize {
            documents: 0,
            tokens: 0,
        });
        entry.documents += 1;
        entry.tokens += corpus.doc_len(doc) as u64;
    }

    for group in groups.values_mut() {
        let tuple: Vec<_> = field_positions
            .iter()
            .map(|&i| group.identity.components()[i].clone())
            .collect();
        group.subcorpus_size = Some(per_tuple.get(&tuple).copied().unwrap_or(SubcorpusSize {
            documents: 0,
            tokens: 0,
        }));
    }
}
