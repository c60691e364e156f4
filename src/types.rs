//! The building blocks of a grouping request.
//!
//! These types sit on the boundary between the external pattern matcher and
//! the aggregation core: the matcher produces [`Hit`]s wrapped in a
//! [`HitList`], the core only ever reads them.
//!
//! # Invariants (the stuff that breaks if you ignore it)
//!
//! - **Hit**: `start <= end` and `end <= corpus.doc_len(doc)`.
//!   Token offsets, end exclusive. A hit never spans documents.
//!
//! - **HitList**: `truncation.hits_counted`, when present, is >= `hits.len()`.
//!   The matcher may keep counting after it stops retrieving; it never counts
//!   fewer hits than it handed over.
//!
//! - **HitList::unconstrained** may only be set by a matcher whose pattern
//!   places no constraint on token content, i.e. hit positions coincide
//!   one-to-one with token positions. The frequency fast path is legal only
//!   under this flag.

use serde::{Deserialize, Serialize};

/// Type-safe document identifier.
///
/// Prevents accidentally passing a token offset where a document ID is
/// expected. Use `DocId::new()` for runtime-validated construction, or
/// `.into()` for trusted sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct DocId(pub u32);

impl DocId {
    /// Create a new DocId, validating it's within bounds.
    #[inline]
    pub fn new(id: u32, num_docs: usize) -> Option<Self> {
        if (id as usize) < num_docs {
            Some(DocId(id))
        } else {
            None
        }
    }

    /// Get the underlying value.
    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    /// Convert to usize for array indexing.
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for DocId {
    fn from(id: u32) -> Self {
        DocId(id)
    }
}

impl From<DocId> for usize {
    fn from(id: DocId) -> Self {
        id.0 as usize
    }
}

/// One matched occurrence of a pattern: a token range within a document.
///
/// Produced by the external matcher, read-only to the aggregation core.
/// `start` is the first matched token, `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hit {
    pub doc: DocId,
    pub start: usize,
    pub end: usize,
}

impl Hit {
    #[inline]
    pub fn new(doc: DocId, start: usize, end: usize) -> Self {
        Hit { doc, start, end }
    }

    /// Number of tokens covered by the match.
    #[inline]
    pub fn width(&self) -> usize {
        self.end - self.start
    }
}

/// Cap signals reported by the external matcher alongside its hits.
///
/// A matcher that hits its retrieval cap stops materializing hits but may
/// keep counting; one that hits its count cap stops even that. Neither is an
/// error: totals derived from a truncated stream are valid undercounts as
/// long as these flags accompany them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Truncation {
    /// The matcher stopped materializing hits before exhausting the pattern.
    pub stopped_retrieving_hits: bool,
    /// The matcher also stopped counting.
    pub stopped_counting_hits: bool,
    /// A count is still running elsewhere; the totals below are a snapshot.
    pub still_counting: bool,
    /// Total hits counted, when it exceeds the number retrieved.
    pub hits_counted: Option<u64>,
    /// Total documents counted, when it exceeds the number retrieved.
    pub docs_counted: Option<u64>,
}

/// The hit stream as handed over by the matcher: materialized hits plus the
/// flags describing how the stream relates to the full match set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitList {
    pub hits: Vec<Hit>,
    /// True iff the pattern matches every token position (see module docs).
    pub unconstrained: bool,
    pub truncation: Truncation,
}

impl HitList {
    /// A complete, constrained hit list: everything the pattern matched.
    pub fn complete(hits: Vec<Hit>) -> Self {
        HitList {
            hits,
            unconstrained: false,
            truncation: Truncation::default(),
        }
    }

    /// A complete hit list for a pattern matching every token position.
    pub fn unconstrained(hits: Vec<Hit>) -> Self {
        HitList {
            hits,
            unconstrained: true,
            truncation: Truncation::default(),
        }
    }

    /// A truncated hit list with the matcher's cap flags attached.
    pub fn truncated(hits: Vec<Hit>, truncation: Truncation) -> Self {
        HitList {
            hits,
            unconstrained: false,
            truncation,
        }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Size of the subcorpus a group was computed over: the filtered documents
/// whose metadata matches the group's document-field components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubcorpusSize {
    pub documents: u64,
    pub tokens: u64,
}
