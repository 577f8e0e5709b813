use serde::{Deserialize, Serialize};

/// One extracted fact: a head entity, a relation label, and a tail entity.
///
/// After any pipeline stage completes, `relation` is a member of the
/// vocabulary in [`crate::vocab`] (the reconciler enforces this; the
/// extractor passes relations through unchecked).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triple {
    pub head: String,
    pub relation: String,
    pub tail: String,
}

impl Triple {
    #[must_use]
    pub fn new(
        head: impl Into<String>,
        relation: impl Into<String>,
        tail: impl Into<String>,
    ) -> Self {
        Self {
            head: head.into(),
            relation: relation.into(),
            tail: tail.into(),
        }
    }

    /// Render as `(head, relation, tail)` for prompt listings.
    #[must_use]
    pub fn as_tuple_str(&self) -> String {
        format!("({}, {}, {})", self.head, self.relation, self.tail)
    }
}

/// Extraction mode recorded on every draft document.
pub const EXTRACTION_MODE_ZERO_SHOT: &str = "zero_shot";

/// One document's triples, carried from draft extraction through
/// verification. The `triples` field is replaced with the reconciled list
/// by the verification pass; everything else is copied from the source
/// article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentExtraction {
    pub news_id: String,
    pub title: String,
    pub publish_time: Option<String>,
    pub extraction_mode: String,
    #[serde(default)]
    pub triples: Vec<Triple>,
}

impl DocumentExtraction {
    #[must_use]
    pub fn zero_shot(
        news_id: String,
        title: String,
        publish_time: Option<String>,
        triples: Vec<Triple>,
    ) -> Self {
        Self {
            news_id,
            title,
            publish_time,
            extraction_mode: EXTRACTION_MODE_ZERO_SHOT.to_string(),
            triples,
        }
    }
}
