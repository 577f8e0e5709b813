use std::sync::Arc;

use thiserror::Error;

use super::decode::{self, DecodeError, JsonShape};
use crate::llm::{CompletionClient, LlmError};
use crate::triple::Triple;
use crate::vocab;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Inference failed: {0}")]
    Inference(#[from] LlmError),
    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),
}

/// Turns one document's text into candidate triples via a single
/// zero-temperature inference call.
///
/// Relations pass through uncorrected here; the verification pass enforces
/// the vocabulary. Failure degrades per document: the caller gets an empty
/// triple list and an empty raw response, never an error.
pub struct TripleExtractor {
    client: Arc<dyn CompletionClient>,
}

impl TripleExtractor {
    #[must_use]
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Extract candidate triples anchored to `target` from `article_text`.
    /// Returns the triples plus the raw response text for audit logging.
    pub async fn extract(&self, article_text: &str, target: &str) -> (Vec<Triple>, String) {
        match self.try_extract(article_text, target).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, "extraction failed, continuing with no triples");
                (Vec::new(), String::new())
            }
        }
    }

    async fn try_extract(
        &self,
        article_text: &str,
        target: &str,
    ) -> Result<(Vec<Triple>, String), ExtractError> {
        let (system_prompt, user_prompt) = build_prompts(article_text, target);

        let raw = self.client.complete(&system_prompt, &user_prompt).await?;
        let value = decode::decode_json(&raw, JsonShape::Array)?;

        let entries = value.as_array().cloned().unwrap_or_default();
        let triples = entries
            .iter()
            .filter_map(parse_triple)
            .collect::<Vec<Triple>>();

        Ok((triples, raw))
    }
}

/// Read one candidate triple out of a decoded array entry. Entries missing
/// a head or tail, trimming to empty, or carrying a category-label
/// placeholder in place of a concrete entity name are dropped.
fn parse_triple(entry: &serde_json::Value) -> Option<Triple> {
    let head = entry.get("head")?.as_str()?.trim();
    let tail = entry.get("tail")?.as_str()?.trim();

    if head.is_empty() || tail.is_empty() {
        return None;
    }

    if vocab::is_placeholder(head) || vocab::is_placeholder(tail) {
        tracing::debug!(head, tail, "dropping placeholder triple");
        return None;
    }

    let relation = entry
        .get("relation")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .trim();

    Some(Triple::new(head, relation, tail))
}

fn build_prompts(article_text: &str, target: &str) -> (String, String) {
    let entity_types = vocab::ENTITY_CATEGORIES
        .iter()
        .map(|c| format!("\"{c}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let relation_types = vocab::relations_list();

    let system_prompt = format!(
        r#"You are a professional supply chain risk analyst. Your task is to extract "entity-relation-entity" triples from financial news.
Please strictly follow the Schema definition below:
1. Entity Types: [{entity_types}]
2. Relation Types: [{relation_types}]

**CRITICAL RULES:**
1. **RELATION CONSTRAINT**: You MUST ONLY use the relation types listed above. Do NOT use verbs like "SURGED", "TUMBLED", "ROSE", etc.
2. **TARGET ANCHORING**: Focus ONLY on entities and events that have a direct or indirect relationship with the target entity: {target}. Ignore completely unrelated background news (e.g., unrelated entertainment or geopolitical events unless they directly affect {target} or its sector).
3. **NO PLACEHOLDERS (ANTI-HALLUCINATION)**: Extract the ACTUAL NAMES of entities from the text. NEVER output literal category labels such as "Event", "Company", "Product", "Risk", "Person", or "Entity1" as the head or tail. If a company announces a relocation, the tail should be the specific action (e.g., "Headquarters relocation to Miami"), NOT the word "Event".

### Output Format:
Return a JSON Array with this EXACT structure (the examples below use concrete names, do not use abstract placeholders):
[
  {{"head": "Federal Reserve", "relation": "AFFECTS", "tail": "Tech Stocks"}},
  {{"head": "Apple", "relation": "LAUNCHES", "tail": "Vision Pro"}}
]

Use "head" and "tail" as keys. The output format must be a pure JSON Array, without any Markdown tags or additional text."#
    );

    let user_prompt = format!(
        "Please analyze the following news content and extract triples relevant to {target}:\n\n{article_text}"
    );

    (system_prompt, user_prompt)
}
