//! Merge of draft triples with verifier judgements into the final,
//! schema-valid triple list.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::verify::{VerificationJudgement, VerifyAction};
use crate::triple::Triple;
use crate::vocab;

/// Per-document reconciliation accounting.
///
/// Invariants: `before == kept + modified + deleted` and
/// `after == kept + modified`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileDelta {
    pub before: usize,
    pub after: usize,
    pub kept: usize,
    pub modified: usize,
    pub deleted: usize,
}

/// Run-wide accumulator over per-document deltas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationStats {
    pub total_before: usize,
    pub total_after: usize,
    pub kept: usize,
    pub modified: usize,
    pub deleted: usize,
}

impl ReconciliationStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn absorb(&mut self, delta: ReconcileDelta) {
        self.total_before += delta.before;
        self.total_after += delta.after;
        self.kept += delta.kept;
        self.modified += delta.modified;
        self.deleted += delta.deleted;
    }
}

impl std::fmt::Display for ReconciliationStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Before: {} triples, After: {} triples (Kept: {}, Modified: {}, Deleted: {})",
            self.total_before, self.total_after, self.kept, self.modified, self.deleted
        )
    }
}

/// Result of reconciling one document.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub triples: Vec<Triple>,
    pub delta: ReconcileDelta,
}

/// Merge `draft` with the verifier's judgements.
///
/// `judgements` of `None` is degraded mode: verification was unavailable
/// for this document and the entire draft passes through unchanged, all
/// counted as kept. An empty judgement list means the document was judged;
/// every draft triple then falls back to the omission default (keep).
///
/// Judgements are matched to draft triples by the `(head, tail)` pair
/// exactly as given. When two judgements share a key, the later one wins;
/// a known precision limitation inherited from the original matching
/// scheme and preserved for output compatibility.
///
/// Whatever the judgement claimed, a relation that fails the vocabulary
/// test is coerced to [`vocab::FALLBACK_RELATION`]; schema validity of the
/// final output does not depend on verifier behavior.
#[must_use]
pub fn reconcile(
    draft: &[Triple],
    judgements: Option<&[VerificationJudgement]>,
) -> ReconcileOutcome {
    let mut delta = ReconcileDelta {
        before: draft.len(),
        ..ReconcileDelta::default()
    };

    let Some(judgements) = judgements else {
        delta.after = draft.len();
        delta.kept = draft.len();
        return ReconcileOutcome {
            triples: draft.to_vec(),
            delta,
        };
    };

    // Last-wins on duplicate (head, tail) keys.
    let mut lookup: HashMap<(&str, &str), &VerificationJudgement> = HashMap::new();
    for judgement in judgements {
        lookup.insert((judgement.head.as_str(), judgement.tail.as_str()), judgement);
    }

    let mut triples = Vec::with_capacity(draft.len());

    for original in draft {
        let Some(judgement) = lookup.get(&(original.head.as_str(), original.tail.as_str()))
        else {
            // Verifier omitted this triple; omission is not rejection.
            triples.push(original.clone());
            delta.kept += 1;
            continue;
        };

        match judgement.action {
            VerifyAction::Delete => {
                delta.deleted += 1;
            }
            action => {
                let mut relation = judgement
                    .relation
                    .clone()
                    .unwrap_or_else(|| original.relation.clone());

                if !vocab::is_valid_relation(&relation) {
                    relation = vocab::FALLBACK_RELATION.to_string();
                }

                triples.push(Triple::new(
                    original.head.clone(),
                    relation,
                    original.tail.clone(),
                ));

                if action == VerifyAction::Modify {
                    delta.modified += 1;
                } else {
                    delta.kept += 1;
                }
            }
        }
    }

    delta.after = triples.len();

    ReconcileOutcome { triples, delta }
}
