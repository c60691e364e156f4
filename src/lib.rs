//! Grouped hit aggregation for tokenized text corpora.
//!
//! Given a stream of matched occurrences ("hits") from a pattern matcher,
//! this crate groups them by a request-supplied property — a token attribute
//! at a fixed offset from the match, or a document metadata field — computes
//! per-group and corpus-wide statistics, and exposes the result as a
//! paginated summary.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌────────────────────┐    ┌─────────────┐
//! │ property.rs  │───▶│   accumulate.rs    │───▶│  window.rs  │
//! │ (GroupingSpec│    │ (regular path)     │    │ (sort+page) │
//! │  + resolve)  │    ├────────────────────┤    └──────┬──────┘
//! └──────┬───────┘    │   frequency.rs     │           ▼
//!        │            │ (fast path, must   │    ┌─────────────┐
//!        ▼            │  agree exactly)    │    │ summary.rs  │
//! ┌──────────────┐    └────────────────────┘    │ (response)  │
//! │   group.rs   │                              └─────────────┘
//! │ (identities) │
//! └──────────────┘
//! ```
//!
//! The two accumulation paths are an optimization with a strict equivalence
//! contract, not an architectural branch that may drift: for an
//! unconstrained pattern (every token position is a hit) and a grouping spec
//! of one hit attribute at offset 0, the frequency path reads group
//! statistics off a cached per-attribute frequency table instead of walking
//! hits, and must produce a result identical to the regular path. The
//! property tests cross-check this continuously.
//!
//! # Usage
//!
//! ```ignore
//! use concord::{aggregate, Corpus, DocumentFilter, GroupingSpec, SortOrder, WindowSpec};
//!
//! let corpus = Corpus::new(attributes, fields, documents)?;
//! let hits = corpus.word_hits("word", "very", Sensitivity::Insensitive);
//! let spec: GroupingSpec = "wordright:word:i".parse()?;
//! let response = aggregate(
//!     &corpus, &hits, &spec,
//!     &DocumentFilter::All, &SortOrder::default(), &WindowSpec::default(),
//!     params,
//! )?;
//! ```

// Module declarations
mod accumulate;
mod corpus;
mod error;
mod frequency;
mod group;
mod property;
mod summary;
pub mod testing;
mod types;
mod utils;
mod window;

// Re-exports for public API
pub use accumulate::accumulate_hits;
#[cfg(feature = "parallel")]
pub use accumulate::accumulate_hits_parallel;
pub use corpus::{Corpus, Document, DocumentFilter};
pub use error::GroupError;
pub use frequency::{accumulate_frequency, FrequencyTable};
pub use group::{AggregationResult, Group, GroupIdentity, PropValue, ResultTotals, NO_VALUE};
pub use property::{GroupProperty, GroupingSpec, Sensitivity};
pub use summary::{aggregate, build_summary, HitGroup, PropertyValue, Summary, SummaryResponse};
pub use types::{DocId, Hit, HitList, SubcorpusSize, Truncation};
pub use utils::normalize;
pub use window::{
    window, GroupSort, GroupSortKey, SortOrder, WindowSpec, WindowStats, DEFAULT_WINDOW_SIZE,
};
