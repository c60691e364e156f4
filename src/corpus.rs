//! The in-memory tokenized document store the aggregation core reads from.
//!
//! The core's contract only needs four lookups: token attribute by
//! (document, offset, attribute), document field by (document, field), a
//! per-attribute frequency table, and document filter evaluation. [`Corpus`]
//! provides all four over a validated in-memory payload.
//!
//! Also here: the two stand-in matchers the CLI and tests drive the core
//! with — an all-token matcher (the `[]` pattern, which licenses the
//! frequency fast path) and a literal token-equality matcher. The real
//! pattern language lives outside this crate.
//!
//! # Invariants
//!
//! - Every document carries every declared attribute layer, and all layers of
//!   one document have the same token count. Validated on construction and
//!   reload; `doc_len` reads the first declared layer.
//! - Frequency tables are corpus-scoped cached state, keyed by
//!   (attribute, sensitivity), and are dropped when the documents change.
//!   They are never shared across corpora.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::GroupError;
use crate::frequency::FrequencyTable;
use crate::property::Sensitivity;
use crate::types::{DocId, Hit, HitList};

/// One document: metadata fields plus parallel token-attribute layers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Metadata fields, e.g. `title`, `fromInputFile`.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    /// Token attribute layers, e.g. `word` and `lemma`. All layers of one
    /// document have the same length.
    pub layers: BTreeMap<String, Vec<String>>,
}

impl Document {
    /// Token count of the document (length of any layer).
    pub fn len(&self) -> usize {
        self.layers.values().next().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A tokenized corpus with a declared schema and a frequency-table cache.
#[derive(Debug)]
pub struct Corpus {
    docs: Vec<Document>,
    attributes: Vec<String>,
    fields: Vec<String>,
    freq_cache: RwLock<HashMap<(String, Sensitivity), Arc<FrequencyTable>>>,
}

impl Corpus {
    /// Build a corpus, validating every document against the declared schema.
    pub fn new(
        attributes: Vec<String>,
        fields: Vec<String>,
        docs: Vec<Document>,
    ) -> Result<Self, GroupError> {
        if attributes.is_empty() {
            return Err(GroupError::InvalidCorpus(
                "no token attributes declared".to_string(),
            ));
        }
        validate_docs(&attributes, &fields, &docs)?;
        Ok(Corpus {
            docs,
            attributes,
            fields,
            freq_cache: RwLock::new(HashMap::new()),
        })
    }

    /// Replace the document set, revalidating and dropping cached frequency
    /// tables. The cache must never outlive the documents it was built from.
    pub fn reload(&mut self, docs: Vec<Document>) -> Result<(), GroupError> {
        validate_docs(&self.attributes, &self.fields, &docs)?;
        self.docs = docs;
        self.invalidate_frequency_tables();
        Ok(())
    }

    /// Drop all cached frequency tables.
    pub fn invalidate_frequency_tables(&self) {
        self.freq_cache.write().clear();
    }

    pub fn num_docs(&self) -> usize {
        self.docs.len()
    }

    pub fn doc_ids(&self) -> impl Iterator<Item = DocId> + '_ {
        (0..self.docs.len() as u32).map(DocId)
    }

    pub fn doc(&self, doc: DocId) -> &Document {
        &self.docs[doc.as_usize()]
    }

    /// Token count of a document.
    pub fn doc_len(&self, doc: DocId) -> usize {
        self.docs[doc.as_usize()].len()
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.attributes.iter().any(|a| a == attribute)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Token attribute lookup. `None` when the offset is outside the
    /// document or the attribute layer is absent.
    pub fn token_attribute(&self, doc: DocId, pos: usize, attribute: &str) -> Option<&str> {
        self.docs
            .get(doc.as_usize())?
            .layers
            .get(attribute)?
            .get(pos)
            .map(String::as_str)
    }

    /// Document field lookup. `None` when the document does not carry the
    /// field (a declared-but-absent field reads as missing, not an error).
    pub fn field_value(&self, doc: DocId, field: &str) -> Option<&str> {
        self.docs
            .get(doc.as_usize())?
            .fields
            .get(field)
            .map(String::as_str)
    }

    /// Every token position as a hit: the `[]` pattern. The returned list is
    /// flagged unconstrained, which licenses the frequency fast path.
    pub fn all_token_hits(&self) -> HitList {
        let mut hits = Vec::new();
        for doc in self.doc_ids() {
            for pos in 0..self.doc_len(doc) {
                hits.push(Hit::new(doc, pos, pos + 1));
            }
        }
        HitList::unconstrained(hits)
    }

    /// Literal single-token matcher: every position whose attribute value
    /// equals `value` under the given sensitivity.
    pub fn word_hits(&self, attribute: &str, value: &str, sensitivity: Sensitivity) -> HitList {
        let needle = sensitivity.fold(value);
        let mut hits = Vec::new();
        for doc in self.doc_ids() {
            for pos in 0..self.doc_len(doc) {
                if let Some(token) = self.token_attribute(doc, pos, attribute) {
                    if sensitivity.fold(token) == needle {
                        hits.push(Hit::new(doc, pos, pos + 1));
                    }
                }
            }
        }
        HitList::complete(hits)
    }

    /// The cached (value → per-document count) table for an attribute,
    /// building it on first use.
    pub fn frequency_table(
        &self,
        attribute: &str,
        sensitivity: Sensitivity,
    ) -> Result<Arc<FrequencyTable>, GroupError> {
        if !self.has_attribute(attribute) {
            return Err(GroupError::UnknownField(attribute.to_string()));
        }
        let key = (attribute.to_string(), sensitivity);
        if let Some(table) = self.freq_cache.read().get(&key) {
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(FrequencyTable::build(self, attribute, sensitivity));
        self.freq_cache
            .write()
            .entry(key)
            .or_insert_with(|| Arc::clone(&table));
        Ok(table)
    }

    #[cfg(test)]
    pub(crate) fn cached_frequency_tables(&self) -> usize {
        self.freq_cache.read().len()
    }
}

fn validate_docs(
    attributes: &[String],
    fields: &[String],
    docs: &[Document],
) -> Result<(), GroupError> {
    for (i, doc) in docs.iter().enumerate() {
        let len = doc.len();
        for attribute in attributes {
            match doc.layers.get(attribute) {
                Some(layer) if layer.len() == len => {}
                Some(layer) => {
                    return Err(GroupError::InvalidCorpus(format!(
                        "document {}: layer '{}' has {} tokens, expected {}",
                        i,
                        attribute,
                        layer.len(),
                        len
                    )))
                }
                None => {
                    return Err(GroupError::InvalidCorpus(format!(
                        "document {}: missing layer '{}'",
                        i, attribute
                    )))
                }
            }
        }
        for layer in doc.layers.keys() {
            if !attributes.iter().any(|a| a == layer) {
                return Err(GroupError::InvalidCorpus(format!(
                    "document {}: undeclared layer '{}'",
                    i, layer
                )));
            }
        }
        for field in doc.fields.keys() {
            if !fields.iter().any(|f| f == field) {
                return Err(GroupError::InvalidCorpus(format!(
                    "document {}: undeclared field '{}'",
                    i, field
                )));
            }
        }
    }
    Ok(())
}

/// Predicate over document ids, pre-applied to every aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DocumentFilter {
    /// Accept every document.
    #[default]
    All,
    /// Accept documents whose metadata field equals the value exactly.
    Field { name: String, value: String },
    /// Accept an explicit document set.
    Docs(BTreeSet<DocId>),
}

impl DocumentFilter {
    pub fn accepts(&self, corpus: &Corpus, doc: DocId) -> bool {
        match self {
            DocumentFilter::All => true,
            DocumentFilter::Field { name, value } => {
                corpus.field_value(doc, name) == Some(value.as_str())
            }
            DocumentFilter::Docs(ids) => ids.contains(&doc),
        }
    }

    /// Check the filter against the corpus schema.
    pub fn validate(&self, corpus: &Corpus) -> Result<(), GroupError> {
        match self {
            DocumentFilter::Field { name, .. } if !corpus.has_field(name) => {
                Err(GroupError::UnknownField(name.clone()))
            }
            _ => Ok(()),
        }
    }
}

impl FromStr for DocumentFilter {
    type Err = GroupError;

    /// Parse the `field:"value"` request syntax; an empty string accepts all.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(DocumentFilter::All);
        }
        let (name, rest) = s
            .split_once(':')
            .ok_or_else(|| GroupError::InvalidFilter(s.to_string()))?;
        let value = rest
            .strip_prefix('"')
            .and_then(|r| r.strip_suffix('"'))
            .ok_or_else(|| GroupError::InvalidFilter(s.to_string()))?;
        if name.is_empty() {
            return Err(GroupError::InvalidFilter(s.to_string()));
        }
        Ok(DocumentFilter::Field {
            name: name.to_string(),
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{doc, very_corpus};

    #[test]
    fn rejects_mismatched_layers() {
        let mut bad = doc(&[("word", &["a", "b"])], &[]);
        bad.layers.insert("lemma".to_string(), vec!["a".to_string()]);
        let err = Corpus::new(
            vec!["word".to_string(), "lemma".to_string()],
            vec![],
            vec![bad],
        )
        .unwrap_err();
        assert!(matches!(err, GroupError::InvalidCorpus(_)));
    }

    #[test]
    fn rejects_missing_and_undeclared_layers() {
        let d = doc(&[("word", &["a"])], &[]);
        assert!(matches!(
            Corpus::new(vec!["word".to_string(), "lemma".to_string()], vec![], vec![d.clone()]),
            Err(GroupError::InvalidCorpus(_))
        ));
        assert!(matches!(
            Corpus::new(vec!["lemma".to_string()], vec![], vec![d]),
            Err(GroupError::InvalidCorpus(_))
        ));
    }

    #[test]
    fn all_token_hits_cover_every_position() {
        let corpus = very_corpus();
        let hits = corpus.all_token_hits();
        assert!(hits.unconstrained);
        let expected: usize = corpus.doc_ids().map(|d| corpus.doc_len(d)).sum();
        assert_eq!(hits.len(), expected);
    }

    #[test]
    fn word_hits_match_insensitively() {
        let corpus = very_corpus();
        let hits = corpus.word_hits("word", "VERY", Sensitivity::Insensitive);
        assert_eq!(hits.len(), 7);
        assert!(!hits.unconstrained);

        let none = corpus.word_hits("word", "VERY", Sensitivity::Sensitive);
        assert_eq!(none.len(), 0);
    }

    #[test]
    fn filter_parses_request_syntax() {
        let filter: DocumentFilter = "fromInputFile:\"/input/PBsve430.xml\"".parse().unwrap();
        assert_eq!(
            filter,
            DocumentFilter::Field {
                name: "fromInputFile".to_string(),
                value: "/input/PBsve430.xml".to_string(),
            }
        );
        assert_eq!("".parse::<DocumentFilter>().unwrap(), DocumentFilter::All);
        assert!("nocolon".parse::<DocumentFilter>().is_err());
        assert!("f:unquoted".parse::<DocumentFilter>().is_err());
    }

    #[test]
    fn frequency_cache_builds_once_and_invalidates() {
        let corpus = very_corpus();
        assert_eq!(corpus.cached_frequency_tables(), 0);
        let a = corpus
            .frequency_table("word", Sensitivity::Insensitive)
            .unwrap();
        let b = corpus
            .frequency_table("word", Sensitivity::Insensitive)
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(corpus.cached_frequency_tables(), 1);

        corpus.invalidate_frequency_tables();
        assert_eq!(corpus.cached_frequency_tables(), 0);
    }

    #[test]
    fn reload_drops_cached_tables() {
        let mut corpus = very_corpus();
        corpus
            .frequency_table("word", Sensitivity::Insensitive)
            .unwrap();
        assert_eq!(corpus.cached_frequency_tables(), 1);

        let docs: Vec<Document> = corpus.doc_ids().map(|d| corpus.doc(d).clone()).collect();
        corpus.reload(docs).unwrap();
        assert_eq!(corpus.cached_frequency_tables(), 0);
    }

    #[test]
    fn unknown_attribute_table_is_rejected() {
        let corpus = very_corpus();
        assert_eq!(
            corpus
                .frequency_table("nosuch", Sensitivity::Insensitive)
                .unwrap_err(),
            GroupError::UnknownField("nosuch".to_string())
        );
    }
}
