//! Group identities, labels, and the per-request aggregation result.
//!
//! A group's identity is the canonical composite key over the resolved
//! property values of its hits. Identity construction must be injective: two
//! distinct value tuples never collapse to one identity, equal tuples always
//! produce equal identities. The serialized form tags each component
//! (`cwo` for context words, `str` for document fields) and percent-escapes
//! the reserved characters, so the joined string stays injective too.
//!
//! The display label is a non-unique rendering for humans. A missing value
//! (offset outside the document) renders as the explicit `-` marker so it
//! stays distinguishable from a genuinely empty attribute value.

use std::collections::HashMap;

use crate::property::Sensitivity;
use crate::types::{DocId, Hit, SubcorpusSize};

/// Marker displayed for a value the resolver could not produce.
pub const NO_VALUE: &str = "-";

/// One resolved component of a group identity.
///
/// `ContextWord { word: None }` is the out-of-range sentinel; `Some("")` is a
/// genuinely empty attribute value. They compare, hash, serialize, and
/// display differently.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropValue {
    ContextWord {
        attribute: String,
        sensitivity: Sensitivity,
        word: Option<String>,
    },
    Field {
        value: String,
    },
}

impl PropValue {
    /// Human-readable rendering of this component.
    pub fn display(&self) -> String {
        match self {
            PropValue::ContextWord { word: Some(w), .. } => w.clone(),
            PropValue::ContextWord { word: None, .. } => NO_VALUE.to_string(),
            PropValue::Field { value } => value.clone(),
        }
    }

    /// Canonical serialized form, injective over (variant, fields).
    ///
    /// The sentinel serializes with three parts (`cwo:attr:i`), a present
    /// value with four (`cwo:attr:i:value`), so `None` and `Some("")` stay
    /// distinct.
    pub fn serialize(&self) -> String {
        match self {
            PropValue::ContextWord {
                attribute,
                sensitivity,
                word,
            } => match word {
                Some(w) => format!(
                    "cwo:{}:{}:{}",
                    escape(attribute),
                    sensitivity.suffix(),
                    escape(w)
                ),
                None => format!("cwo:{}:{}", escape(attribute), sensitivity.suffix()),
            },
            PropValue::Field { value } => format!("str:{}", escape(value)),
        }
    }
}

/// Percent-escape the characters the serialized form reserves.
///
/// `%` first, then the separators, so unescaping (if a caller ever needs it)
/// is unambiguous.
fn escape(part: &str) -> String {
    part.replace('%', "%25").replace(':', "%3A").replace(';', "%3B")
}

/// Canonical composite key uniquely identifying a group.
///
/// Component order mirrors the grouping spec. Equality and ordering are over
/// the resolved components; insensitive components were folded at resolve
/// time, so no further folding happens here.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupIdentity(Vec<PropValue>);

impl GroupIdentity {
    pub fn new(components: Vec<PropValue>) -> Self {
        GroupIdentity(components)
    }

    pub fn components(&self) -> &[PropValue] {
        &self.0
    }

    /// Injective string form; also the unconditional sort tie-breaker.
    pub fn serialize(&self) -> String {
        self.0
            .iter()
            .map(PropValue::serialize)
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Display label: component labels joined with ` / `.
    pub fn display(&self) -> String {
        self.0
            .iter()
            .map(PropValue::display)
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

/// One group of hits sharing a resolved property-value combination.
///
/// Mutated only by its owning accumulator during the single aggregation
/// pass; read-only afterwards. `docs` is group-local (a document may appear
/// in many groups).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub identity: GroupIdentity,
    /// Number of hits assigned to this group.
    pub size: u64,
    /// Distinct documents contributing hits to this group.
    pub docs: std::collections::HashSet<DocId>,
    /// First hit seen for the group, kept as a display example. The frequency
    /// path never materializes hits, so it may be absent.
    pub example: Option<Hit>,
    /// Present when the grouping spec contains document-field components.
    pub subcorpus_size: Option<SubcorpusSize>,
}

impl Group {
    pub fn new(identity: GroupIdentity) -> Self {
        Group {
            identity,
            size: 0,
            docs: std::collections::HashSet::new(),
            example: None,
            subcorpus_size: None,
        }
    }

    pub fn number_of_docs(&self) -> u64 {
        self.docs.len() as u64
    }
}

/// Corpus-wide totals and truncation flags for one aggregation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultTotals {
    /// Total hits counted (>= retrieved when the matcher kept counting past
    /// its retrieval cap).
    pub total_hits: u64,
    pub total_hits_retrieved: u64,
    pub total_docs: u64,
    pub total_docs_retrieved: u64,
    pub still_counting: bool,
    pub stopped_counting_hits: bool,
    pub stopped_retrieving_hits: bool,
}

/// Everything one aggregation pass produced. Owned by the accumulator that
/// built it; handed by value to the windower. Never shared across requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationResult {
    pub groups: HashMap<GroupIdentity, Group>,
    pub totals: ResultTotals,
}

impl AggregationResult {
    pub fn number_of_groups(&self) -> u64 {
        self.groups.len() as u64
    }

    pub fn largest_group_size(&self) -> u64 {
        self.groups.values().map(|g| g.size).max().unwrap_or(0)
    }
}
