//! Error taxonomy for grouped aggregation requests.
//!
//! Everything here is a request-validation failure surfaced before or instead
//! of aggregation. Two conditions deliberately do NOT appear:
//!
//! - An attribute offset that lands outside a document degrades to the
//!   no-value sentinel component (see `PropValue`), never an error.
//! - A capped hit source is not an error either: the truncation flags travel
//!   with the otherwise-valid partial result.

use thiserror::Error;

/// Errors produced while validating or running a grouping request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GroupError {
    /// The grouping spec or filter names an attribute or metadata field the
    /// corpus does not declare. Rejected before aggregation starts.
    #[error("unknown field or attribute: {0}")]
    UnknownField(String),

    /// The frequency path was asked to handle a spec it cannot represent
    /// (anything other than a single hit attribute at offset 0).
    #[error("grouping spec not supported by the frequency path: {0}")]
    UnsupportedGroupingSpec(String),

    /// A grouping spec must contain at least one property.
    #[error("grouping spec is empty")]
    EmptyGroupingSpec,

    /// A grouping property string could not be parsed.
    #[error("invalid grouping property: {0}")]
    InvalidProperty(String),

    /// A document filter string could not be parsed.
    #[error("invalid document filter: {0}")]
    InvalidFilter(String),

    /// A group sort order string could not be parsed.
    #[error("invalid sort order: {0}")]
    InvalidSort(String),

    /// The corpus payload is structurally inconsistent (e.g. a document whose
    /// attribute layers disagree on token count).
    #[error("invalid corpus: {0}")]
    InvalidCorpus(String),
}
