use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::decode::{self, DecodeError, JsonShape};
use crate::llm::{CompletionClient, LlmError};
use crate::triple::Triple;
use crate::vocab;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Inference failed: {0}")]
    Inference(#[from] LlmError),
    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),
}

pub type VerifyResult<T> = Result<T, VerifyError>;

/// Per-triple verdict from the verification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerifyAction {
    Keep,
    Modify,
    Delete,
}

impl VerifyAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Keep => "KEEP",
            Self::Modify => "MODIFY",
            Self::Delete => "DELETE",
        }
    }

    /// Lenient parse: anything that is not DELETE or MODIFY counts as
    /// KEEP, including missing or unrecognized action strings.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "DELETE" => Self::Delete,
            "MODIFY" => Self::Modify,
            _ => Self::Keep,
        }
    }
}

impl std::fmt::Display for VerifyAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One verifier verdict about a draft triple, matched back to the draft by
/// the `(head, tail)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationJudgement {
    pub head: String,
    pub tail: String,
    /// Corrected relation; `None` means the verdict did not carry one and
    /// the draft's relation stands (subject to vocabulary coercion).
    pub relation: Option<String>,
    pub action: VerifyAction,
    /// Diagnostic only; never used in reconciliation logic.
    #[serde(default)]
    pub reason: String,
}

/// Audits one document's candidate triples against the source text with a
/// single inference call.
///
/// An `Err` means "judgement unavailable, do not trust the absence of
/// entries"; an empty `Ok` list means "judged, none survived". The caller
/// must not invoke this with an empty draft.
pub struct TripleVerifier {
    client: Arc<dyn CompletionClient>,
}

impl TripleVerifier {
    #[must_use]
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Request one judgement per draft triple.
    ///
    /// # Errors
    ///
    /// Fails when the inference call or the response decode fails; the
    /// caller falls back to degraded mode for this document.
    pub async fn verify(
        &self,
        article_text: &str,
        draft: &[Triple],
    ) -> VerifyResult<Vec<VerificationJudgement>> {
        let user_prompt = build_prompt(article_text, draft);

        let raw = self
            .client
            .complete(
                "You are a knowledge graph verification expert. Output valid JSON only.",
                &user_prompt,
            )
            .await?;

        let value = decode::decode_json(&raw, JsonShape::Object)?;

        let entries = value
            .get("verified_triples")
            .and_then(serde_json::Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(entries.iter().filter_map(parse_judgement).collect())
    }
}

/// Read one judgement out of a decoded entry. Entries without a head and
/// tail cannot be matched to any draft triple and are skipped.
fn parse_judgement(entry: &serde_json::Value) -> Option<VerificationJudgement> {
    let head = entry.get("head")?.as_str()?.to_string();
    let tail = entry.get("tail")?.as_str()?.to_string();

    let relation = entry
        .get("relation")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string);

    let action = entry
        .get("action")
        .and_then(serde_json::Value::as_str)
        .map_or(VerifyAction::Keep, VerifyAction::parse);

    let reason = entry
        .get("reason")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();

    Some(VerificationJudgement {
        head,
        tail,
        relation,
        action,
        reason,
    })
}

fn build_prompt(article_text: &str, draft: &[Triple]) -> String {
    let triples_str = draft
        .iter()
        .map(|t| format!("- {}", t.as_tuple_str()))
        .collect::<Vec<_>>()
        .join("\n");

    let valid_relations = vocab::relations_list();

    format!(
        r#"You are a knowledge graph quality control expert. Please verify the following triples extracted from the news article.

**News Article:**
{article_text}

**Extracted Triples:**
{triples_str}

**Valid Relation Types (Strict Schema):**
[{valid_relations}]

**Your Task:**
For each triple, decide:
1. **KEEP**: The triple is correct, supported by the article, AND the relation is in the Valid Relation Types list.
2. **MODIFY**:
   - The relation is semantically correct but NOT in the Valid List (e.g., "RATES" -> change to "REPORTS" or "COMMENTS_ON").
   - The relation is factually incorrect -> provide the corrected relation.
3. **DELETE**: The triple is a hallucination (not mentioned in the article) -> remove it.

**Output Format (JSON only, no explanation):**
{{
    "verified_triples": [
        {{
            "head": "Entity A",
            "relation": "CORRECT_RELATION_FROM_LIST",
            "tail": "Entity B",
            "action": "KEEP",
            "reason": "Supported by text"
        }},
        {{
            "head": "Entity C",
            "relation": "REPORTS",
            "tail": "Entity D",
            "action": "MODIFY",
            "reason": "Changed RATES to REPORTS to match schema"
        }}
    ]
}}"#
    )
}
