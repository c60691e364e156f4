//! Test fixtures shared across unit, integration, and property tests.
//!
//! This module is always compiled but hidden from documentation.
//! It provides the canonical corpora the test suite asserts exact numbers
//! against, so the expectations live in one place.

#![doc(hidden)]

use std::collections::BTreeMap;

use crate::corpus::{Corpus, Document, DocumentFilter};
use crate::group::AggregationResult;
use crate::types::{DocId, HitList};

/// Build a document from attribute layers and metadata fields.
pub fn doc(layers: &[(&str, &[&str])], fields: &[(&str, &str)]) -> Document {
    Document {
        fields: fields
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect(),
        layers: layers
            .iter()
            .map(|(name, tokens)| {
                (
                    (*name).to_string(),
                    tokens.iter().map(|t| (*t).to_string()).collect(),
                )
            })
            .collect(),
    }
}

/// The canonical two-document corpus behind most exact-number assertions.
///
/// `very` occurs 7 times across both documents; the words to its right are
/// `much, good, nice` (doc 0) and `much, happy, calm, glad` (doc 1), so
/// grouping `"very"` by `wordright:word:i` yields 6 groups with `much` the
/// largest (size 2, in 2 docs).
pub fn very_corpus() -> Corpus {
    let doc0 = doc(
        &[(
            "word",
            &["it", "was", "very", "much", "very", "good", "and", "very", "nice"],
        )],
        &[
            ("title", "interview about a conference"),
            ("fromInputFile", "/input/doc-0.xml"),
        ],
    );
    let doc1 = doc(
        &[(
            "word",
            &["she", "was", "very", "much", "very", "happy", "very", "calm", "very", "glad"],
        )],
        &[
            ("title", "impressions of a city"),
            ("fromInputFile", "/input/doc-1.xml"),
        ],
    );
    match Corpus::new(
        vec!["word".to_string()],
        vec!["title".to_string(), "fromInputFile".to_string()],
        vec![doc0, doc1],
    ) {
        Ok(corpus) => corpus,
        Err(e) => panic!("fixture corpus is invalid: {}", e),
    }
}

/// A corpus whose first document is 22 repetitions of one word, for the
/// filtered fast-path/regular-path comparison scenario.
pub fn repeated_corpus() -> Corpus {
    let doc0 = doc(
        &[("word", &["la"; 22])],
        &[("fromInputFile", "/input/PBsve430.xml")],
    );
    let doc1 = doc(
        &[("word", &["mary", "had", "a", "little", "lamb"])],
        &[("fromInputFile", "/input/other.xml")],
    );
    match Corpus::new(
        vec!["word".to_string()],
        vec!["fromInputFile".to_string()],
        vec![doc0, doc1],
    ) {
        Ok(corpus) => corpus,
        Err(e) => panic!("fixture corpus is invalid: {}", e),
    }
}

/// Filter accepting exactly one fixture document, via its input-file field.
pub fn filtered_to(corpus: &Corpus, doc_index: u32) -> DocumentFilter {
    let value = corpus
        .field_value(DocId(doc_index), "fromInputFile")
        .unwrap_or_default()
        .to_string();
    DocumentFilter::Field {
        name: "fromInputFile".to_string(),
        value,
    }
}

/// Every token position as an explicit, constrained hit list — what a
/// matcher produces for a pattern like `[word != "zzzzzz"]` that happens to
/// match everything without being declared unconstrained. Forces the
/// regular path.
pub fn explicit_token_hits(corpus: &Corpus) -> HitList {
    let mut hits = corpus.all_token_hits();
    hits.unconstrained = false;
    hits
}

/// Path-independent view of a result for equivalence assertions:
/// serialized identity → (size, sorted contributing docs).
pub fn groups_by_identity(result: &AggregationResult) -> BTreeMap<String, (u64, Vec<DocId>)> {
    result
        .groups
        .values()
        .map(|g| {
            let mut docs: Vec<DocId> = g.docs.iter().copied().collect();
            docs.sort();
            (g.identity.serialize(), (g.size, docs))
        })
        .collect()
}
