//! Grouping properties: what a hit is grouped by.
//!
//! A grouping request supplies an ordered list of property descriptors, each
//! either a token attribute at a fixed offset from the match or a document
//! metadata field. Dynamic, request-supplied combinations force a
//! tagged-variant representation; resolvers dispatch on the variant.
//!
//! # Property name syntax
//!
//! | Name                  | Meaning                                         |
//! |-----------------------|-------------------------------------------------|
//! | `hit:word:i`          | attribute `word` of the first matched token     |
//! | `wordleft:word:i`     | attribute `word` one token left of the match    |
//! | `wordright:word:i`    | attribute `word` one token right of match start |
//! | `hit+3:lemma:s`       | attribute `lemma` three tokens right            |
//! | `hit-2:word`          | two tokens left, sensitivity defaults to `i`    |
//! | `field:title`         | document metadata field `title`                 |
//!
//! Composite specs are comma-separated lists of the above. The trailing
//! `s`/`i` selects match sensitivity; insensitive values are folded (case and
//! diacritics) at resolve time, so group identity equality is equality of the
//! folded value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::corpus::Corpus;
use crate::error::GroupError;
use crate::group::{GroupIdentity, PropValue};
use crate::types::{DocId, Hit};
use crate::utils::normalize;

/// Whether attribute values are compared exactly or folded first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Sensitive,
    Insensitive,
}

impl Sensitivity {
    /// One-letter suffix used in property names and serialized identities.
    pub fn suffix(self) -> &'static str {
        match self {
            Sensitivity::Sensitive => "s",
            Sensitivity::Insensitive => "i",
        }
    }

    pub fn from_suffix(s: &str) -> Option<Self> {
        match s {
            "s" => Some(Sensitivity::Sensitive),
            "i" => Some(Sensitivity::Insensitive),
            _ => None,
        }
    }

    /// Apply the sensitivity to a raw attribute value.
    pub fn fold(self, value: &str) -> String {
        match self {
            Sensitivity::Sensitive => value.to_string(),
            Sensitivity::Insensitive => normalize(value),
        }
    }
}

/// One grouping property descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupProperty {
    /// A token attribute at a fixed offset from the start of the match.
    /// Offset 0 is the first matched token; negative and positive offsets may
    /// reach outside the match for context-based grouping.
    HitAttribute {
        attribute: String,
        offset: i64,
        sensitivity: Sensitivity,
    },
    /// A document metadata field.
    DocumentField { field: String },
}

impl GroupProperty {
    /// The canonical request-string name of this property.
    pub fn name(&self) -> String {
        match self {
            GroupProperty::HitAttribute {
                attribute,
                offset,
                sensitivity,
            } => {
                let prefix = match offset {
                    0 => "hit".to_string(),
                    -1 => "wordleft".to_string(),
                    1 => "wordright".to_string(),
                    n => format!("hit{:+}", n),
                };
                format!("{}:{}:{}", prefix, attribute, sensitivity.suffix())
            }
            GroupProperty::DocumentField { field } => format!("field:{}", field),
        }
    }

    /// Check the property against the corpus schema.
    pub fn validate(&self, corpus: &Corpus) -> Result<(), GroupError> {
        match self {
            GroupProperty::HitAttribute { attribute, .. } => {
                if corpus.has_attribute(attribute) {
                    Ok(())
                } else {
                    Err(GroupError::UnknownField(attribute.clone()))
                }
            }
            GroupProperty::DocumentField { field } => {
                if corpus.has_field(field) {
                    Ok(())
                } else {
                    Err(GroupError::UnknownField(field.clone()))
                }
            }
        }
    }

    /// Resolve the property value for one hit.
    ///
    /// An offset that lands outside the document resolves to the no-value
    /// sentinel (`word: None`); the aggregation never aborts over it.
    pub fn resolve(&self, corpus: &Corpus, hit: &Hit) -> PropValue {
        match self {
            GroupProperty::HitAttribute {
                attribute,
                offset,
                sensitivity,
            } => {
                let pos = hit.start as i64 + offset;
                let word = usize::try_from(pos)
                    .ok()
                    .and_then(|p| corpus.token_attribute(hit.doc, p, attribute))
                    .map(|w| sensitivity.fold(w));
                PropValue::ContextWord {
                    attribute: attribute.clone(),
                    sensitivity: *sensitivity,
                    word,
                }
            }
            GroupProperty::DocumentField { field } => PropValue::Field {
                value: corpus
                    .field_value(hit.doc, field)
                    .unwrap_or_default()
                    .to_string(),
            },
        }
    }

    /// Resolve the property for a whole document; `None` for hit-scoped
    /// properties. Used to size per-group subcorpora.
    pub fn resolve_for_doc(&self, corpus: &Corpus, doc: DocId) -> Option<PropValue> {
        match self {
            GroupProperty::HitAttribute { .. } => None,
            GroupProperty::DocumentField { field } => Some(PropValue::Field {
                value: corpus.field_value(doc, field).unwrap_or_default().to_string(),
            }),
        }
    }
}

impl fmt::Display for GroupProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for GroupProperty {
    type Err = GroupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let invalid = || GroupError::InvalidProperty(s.to_string());

        match parts.as_slice() {
            ["field", field] if !field.is_empty() => Ok(GroupProperty::DocumentField {
                field: (*field).to_string(),
            }),
            [prefix, attribute] | [prefix, attribute, _] if !attribute.is_empty() => {
                let sensitivity = match parts.get(2) {
                    Some(suffix) => Sensitivity::from_suffix(suffix).ok_or_else(invalid)?,
                    None => Sensitivity::Insensitive,
                };
                let offset = match *prefix {
                    "hit" => 0,
                    "wordleft" => -1,
                    "wordright" => 1,
                    p => p
                        .strip_prefix("hit")
                        .filter(|rest| rest.starts_with('+') || rest.starts_with('-'))
                        .and_then(|rest| rest.parse::<i64>().ok())
                        .ok_or_else(invalid)?,
                };
                Ok(GroupProperty::HitAttribute {
                    attribute: (*attribute).to_string(),
                    offset,
                    sensitivity,
                })
            }
            _ => Err(invalid()),
        }
    }
}

/// The ordered list of properties a request groups by.
///
/// Immutable once built; component order is significant for display and for
/// pairing identity components with property names, not for group equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupingSpec {
    properties: Vec<GroupProperty>,
}

impl GroupingSpec {
    pub fn new(properties: Vec<GroupProperty>) -> Result<Self, GroupError> {
        if properties.is_empty() {
            return Err(GroupError::EmptyGroupingSpec);
        }
        Ok(GroupingSpec { properties })
    }

    pub fn single(property: GroupProperty) -> Self {
        GroupingSpec {
            properties: vec![property],
        }
    }

    pub fn properties(&self) -> &[GroupProperty] {
        &self.properties
    }

    /// The canonical request-string name, e.g. `wordright:word:i` or
    /// `hit:word:i,field:title`.
    pub fn name(&self) -> String {
        self.properties
            .iter()
            .map(GroupProperty::name)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Validate every property against the corpus schema. Runs before
    /// aggregation starts; an unknown name rejects the whole request.
    pub fn validate(&self, corpus: &Corpus) -> Result<(), GroupError> {
        for property in &self.properties {
            property.validate(corpus)?;
        }
        Ok(())
    }

    /// Resolve the full composite identity for one hit.
    pub fn resolve(&self, corpus: &Corpus, hit: &Hit) -> GroupIdentity {
        GroupIdentity::new(
            self.properties
                .iter()
                .map(|p| p.resolve(corpus, hit))
                .collect(),
        )
    }

    /// True if any component is a document field (such specs get per-group
    /// subcorpus sizes).
    pub fn has_document_fields(&self) -> bool {
        self.properties
            .iter()
            .any(|p| matches!(p, GroupProperty::DocumentField { .. }))
    }

    /// The shape the frequency fast path can handle: exactly one hit
    /// attribute at offset 0.
    pub fn as_single_hit_attribute(&self) -> Option<(&str, Sensitivity)> {
        match self.properties.as_slice() {
            [GroupProperty::HitAttribute {
                attribute,
                offset: 0,
                sensitivity,
            }] => Some((attribute.as_str(), *sensitivity)),
            _ => None,
        }
    }
}

impl FromStr for GroupingSpec {
    type Err = GroupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(GroupError::EmptyGroupingSpec);
        }
        let properties = s
            .split(',')
            .map(|part| part.trim().parse())
            .collect::<Result<Vec<_>, _>>()?;
        GroupingSpec::new(properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::very_corpus;

    #[test]
    fn parses_common_property_names() {
        let p: GroupProperty = "hit:word:i".parse().unwrap();
        assert_eq!(
            p,
            GroupProperty::HitAttribute {
                attribute: "word".to_string(),
                offset: 0,
                sensitivity: Sensitivity::Insensitive,
            }
        );

        let p: GroupProperty = "wordright:word:s".parse().unwrap();
        assert_eq!(
            p,
            GroupProperty::HitAttribute {
                attribute: "word".to_string(),
                offset: 1,
                sensitivity: Sensitivity::Sensitive,
            }
        );

        let p: GroupProperty = "hit-3:lemma".parse().unwrap();
        assert_eq!(
            p,
            GroupProperty::HitAttribute {
                attribute: "lemma".to_string(),
                offset: -3,
                sensitivity: Sensitivity::Insensitive,
            }
        );

        let p: GroupProperty = "field:title".parse().unwrap();
        assert_eq!(
            p,
            GroupProperty::DocumentField {
                field: "title".to_string()
            }
        );
    }

    #[test]
    fn name_round_trips() {
        for name in ["hit:word:i", "wordleft:word:s", "wordright:lemma:i", "hit+4:word:i", "field:title"] {
            let p: GroupProperty = name.parse().unwrap();
            assert_eq!(p.name(), name);
            let again: GroupProperty = p.name().parse().unwrap();
            assert_eq!(again, p);
        }
    }

    #[test]
    fn rejects_malformed_names() {
        assert!("".parse::<GroupProperty>().is_err());
        assert!("field:".parse::<GroupProperty>().is_err());
        assert!("hit:word:x".parse::<GroupProperty>().is_err());
        assert!("somewhere:word:i".parse::<GroupProperty>().is_err());
        assert!("hit+:word:i".parse::<GroupProperty>().is_err());
    }

    #[test]
    fn spec_parse_is_comma_separated() {
        let spec: GroupingSpec = "hit:word:i,field:title".parse().unwrap();
        assert_eq!(spec.properties().len(), 2);
        assert!(spec.has_document_fields());
        assert_eq!(spec.name(), "hit:word:i,field:title");
        assert!("".parse::<GroupingSpec>().is_err());
    }

    #[test]
    fn single_hit_attribute_shape() {
        let spec: GroupingSpec = "hit:word:i".parse().unwrap();
        assert_eq!(
            spec.as_single_hit_attribute(),
            Some(("word", Sensitivity::Insensitive))
        );

        let spec: GroupingSpec = "wordright:word:i".parse().unwrap();
        assert_eq!(spec.as_single_hit_attribute(), None);

        let spec: GroupingSpec = "hit:word:i,field:title".parse().unwrap();
        assert_eq!(spec.as_single_hit_attribute(), None);
    }

    #[test]
    fn out_of_range_offset_resolves_to_sentinel() {
        let corpus = very_corpus();
        let property: GroupProperty = "wordleft:word:i".parse().unwrap();
        let hit = Hit::new(DocId(0), 0, 1);
        match property.resolve(&corpus, &hit) {
            PropValue::ContextWord { word, .. } => assert_eq!(word, None),
            other => panic!("expected context word, got {:?}", other),
        }
    }

    #[test]
    fn unknown_names_fail_validation() {
        let corpus = very_corpus();
        let spec: GroupingSpec = "hit:nosuchattr:i".parse().unwrap();
        assert_eq!(
            spec.validate(&corpus),
            Err(GroupError::UnknownField("nosuchattr".to_string()))
        );

        let spec: GroupingSpec = "field:nosuchfield".parse().unwrap();
        assert_eq!(
            spec.validate(&corpus),
            Err(GroupError::UnknownField("nosuchfield".to_string()))
        );
    }
}
