use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::extract::TripleExtractor;
use super::reconcile::{self, ReconciliationStats};
use super::verify::TripleVerifier;
use crate::article::NewsArticle;
use crate::llm::CompletionClient;
use crate::triple::DocumentExtraction;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Input collection is empty: {0}")]
    EmptyInput(PathBuf),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Knobs for the sequential two-pass pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Character cap applied to article text before the verification
    /// prompt.
    pub verify_text_cap: usize,
    /// Pause between consecutive verification calls, for external rate
    /// limits.
    pub verify_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            verify_text_cap: 5000,
            verify_delay: Duration::from_millis(500),
        }
    }
}

/// Accounting record for one completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLog {
    pub id: Uuid,
    pub target: String,
    pub started_at: DateTime<Utc>,
    pub articles: usize,
    pub draft_path: PathBuf,
    pub verified_path: PathBuf,
    pub stats: ReconciliationStats,
}

/// Sequences extraction over all documents, then verification and
/// reconciliation, one document at a time. A failed inference call only
/// costs that document's contribution, never the run.
pub struct PipelineDriver {
    extractor: TripleExtractor,
    verifier: TripleVerifier,
    config: PipelineConfig,
}

impl PipelineDriver {
    #[must_use]
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self::with_config(client, PipelineConfig::default())
    }

    #[must_use]
    pub fn with_config(client: Arc<dyn CompletionClient>, config: PipelineConfig) -> Self {
        Self {
            extractor: TripleExtractor::new(Arc::clone(&client)),
            verifier: TripleVerifier::new(client),
            config,
        }
    }

    /// First pass: one extraction call per article, in input order.
    pub async fn run_extraction(
        &self,
        articles: &[NewsArticle],
        target: &str,
    ) -> Vec<DocumentExtraction> {
        let total = articles.len();
        tracing::info!(total, target, "starting extraction pass");

        let mut drafts = Vec::with_capacity(total);

        for (i, article) in articles.iter().enumerate() {
            tracing::info!(
                position = i + 1,
                total,
                title = %article.title,
                "extracting"
            );

            let (triples, _raw) = self.extractor.extract(&article.full_text(), target).await;

            tracing::info!(count = triples.len(), "extracted triples");

            drafts.push(DocumentExtraction::zero_shot(
                article.news_id.clone(),
                article.title.clone(),
                article.publish_time.clone(),
                triples,
            ));
        }

        drafts
    }

    /// Second pass: verify and reconcile each draft against its source
    /// article.
    ///
    /// Drafts whose `news_id` has no matching article are skipped with a
    /// warning. Empty drafts pass through without an inference call.
    /// Verification failure puts that document in degraded mode: its draft
    /// triples survive unchanged.
    pub async fn run_verification(
        &self,
        drafts: Vec<DocumentExtraction>,
        articles: &[NewsArticle],
    ) -> (Vec<DocumentExtraction>, ReconciliationStats) {
        let article_map: HashMap<&str, &NewsArticle> = articles
            .iter()
            .map(|a| (a.news_id.as_str(), a))
            .collect();

        let total = drafts.len();
        tracing::info!(total, "starting verification pass");

        let mut verified = Vec::with_capacity(total);
        let mut stats = ReconciliationStats::new();

        for (i, mut draft) in drafts.into_iter().enumerate() {
            tracing::info!(position = i + 1, total, news_id = %draft.news_id, "verifying");

            let Some(article) = article_map.get(draft.news_id.as_str()) else {
                tracing::warn!(news_id = %draft.news_id, "no matching source article, skipping");
                continue;
            };

            if draft.triples.is_empty() {
                verified.push(draft);
                continue;
            }

            let text = article.flattened_text(self.config.verify_text_cap);

            let judgements = match self.verifier.verify(&text, &draft.triples).await {
                Ok(judgements) => Some(judgements),
                Err(e) => {
                    tracing::warn!(
                        news_id = %draft.news_id,
                        error = %e,
                        "verification unavailable, keeping draft triples"
                    );
                    None
                }
            };

            let outcome = reconcile::reconcile(&draft.triples, judgements.as_deref());
            stats.absorb(outcome.delta);

            draft.triples = outcome.triples;
            verified.push(draft);

            tokio::time::sleep(self.config.verify_delay).await;
        }

        (verified, stats)
    }

    /// Extraction stage over a news JSON file; writes the draft triples
    /// next to the input as `{target}_triples_zero_shot.json`.
    ///
    /// # Errors
    ///
    /// Fails when the input cannot be read or parsed, is empty, or the
    /// output cannot be written.
    pub async fn extract_file(&self, news_path: &Path, target: &str) -> PipelineResult<PathBuf> {
        let articles = load_articles(news_path).await?;

        let drafts = self.run_extraction(&articles, target).await;

        let output = sibling_path(news_path, target, "triples_zero_shot");
        write_json(&output, &drafts).await?;

        tracing::info!(path = %output.display(), "wrote draft triples");
        Ok(output)
    }

    /// Verification stage over a draft file plus its source news file;
    /// writes `{target}_triples_verified.json` and returns the run stats.
    ///
    /// # Errors
    ///
    /// Fails when either input cannot be read or parsed, either collection
    /// is empty, or the output cannot be written.
    pub async fn verify_file(
        &self,
        draft_path: &Path,
        news_path: &Path,
        target: &str,
    ) -> PipelineResult<(PathBuf, ReconciliationStats)> {
        let drafts = load_drafts(draft_path).await?;
        let articles = load_articles(news_path).await?;

        let (verified, stats) = self.run_verification(drafts, &articles).await;

        let output = sibling_path(draft_path, target, "triples_verified");
        write_json(&output, &verified).await?;

        tracing::info!(path = %output.display(), %stats, "wrote verified triples");
        Ok((output, stats))
    }

    /// Both stages chained over one news file.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::extract_file`] and
    /// [`Self::verify_file`].
    pub async fn run(&self, news_path: &Path, target: &str) -> PipelineResult<RunLog> {
        let started_at = Utc::now();

        let articles = load_articles(news_path).await?;

        let drafts = self.run_extraction(&articles, target).await;
        let draft_path = sibling_path(news_path, target, "triples_zero_shot");
        write_json(&draft_path, &drafts).await?;

        let (verified, stats) = self.run_verification(drafts, &articles).await;
        let verified_path = sibling_path(news_path, target, "triples_verified");
        write_json(&verified_path, &verified).await?;

        tracing::info!(target, %stats, "run complete");

        Ok(RunLog {
            id: Uuid::now_v7(),
            target: target.to_string(),
            started_at,
            articles: articles.len(),
            draft_path,
            verified_path,
            stats,
        })
    }
}

async fn load_articles(path: &Path) -> PipelineResult<Vec<NewsArticle>> {
    let raw = tokio::fs::read_to_string(path).await?;
    let articles: Vec<NewsArticle> = serde_json::from_str(&raw)?;

    if articles.is_empty() {
        return Err(PipelineError::EmptyInput(path.to_path_buf()));
    }
    Ok(articles)
}

async fn load_drafts(path: &Path) -> PipelineResult<Vec<DocumentExtraction>> {
    let raw = tokio::fs::read_to_string(path).await?;
    let drafts: Vec<DocumentExtraction> = serde_json::from_str(&raw)?;

    if drafts.is_empty() {
        return Err(PipelineError::EmptyInput(path.to_path_buf()));
    }
    Ok(drafts)
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> PipelineResult<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, rendered).await?;
    Ok(())
}

/// Output path in the same directory as `input`, named
/// `{target}_{suffix}.json` with a lowercased target.
fn sibling_path(input: &Path, target: &str, suffix: &str) -> PathBuf {
    let dir = input.parent().unwrap_or_else(|| Path::new("."));
    dir.join(format!("{}_{suffix}.json", target.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::llm::{LlmError, LlmResult};
    use crate::triple::Triple;

    /// Pops one canned response per call; `None` simulates an inference
    /// failure.
    struct ScriptedClient {
        responses: Mutex<VecDeque<Option<String>>>,
        calls: AtomicUsize,
    }

    impl ScriptedClient {
        fn new(responses: Vec<Option<&str>>) -> Self {
            Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .map(|r| r.map(String::from))
                        .collect(),
                ),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, _system: &str, _user: &str) -> LlmResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.responses.lock().unwrap().pop_front().flatten();
            next.ok_or(LlmError::EmptyResponse)
        }
    }

    fn fast_config() -> PipelineConfig {
        PipelineConfig {
            verify_delay: Duration::ZERO,
            ..PipelineConfig::default()
        }
    }

    fn article(news_id: &str, paragraphs: &[&str]) -> NewsArticle {
        NewsArticle {
            news_id: news_id.into(),
            title: format!("Title for {news_id}"),
            url: None,
            publisher: None,
            publish_time: Some("2024-01-01T00:00:00Z".into()),
            content: paragraphs.iter().map(|p| (*p).to_string()).collect(),
        }
    }

    fn draft(news_id: &str, triples: Vec<Triple>) -> DocumentExtraction {
        DocumentExtraction::zero_shot(news_id.into(), format!("Title for {news_id}"), None, triples)
    }

    #[tokio::test]
    async fn test_extraction_pass_builds_one_draft_per_article() {
        let client = Arc::new(ScriptedClient::new(vec![
            Some(r#"[{"head": "A", "relation": "AFFECTS", "tail": "B"}]"#),
            None,
        ]));
        let driver = PipelineDriver::with_config(client.clone(), fast_config());

        let articles = vec![article("n1", &["One."]), article("n2", &["Two."])];
        let drafts = driver.run_extraction(&articles, "TSLA").await;

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].triples.len(), 1);
        assert_eq!(drafts[0].extraction_mode, "zero_shot");
        // Second article's call failed; it degrades to zero triples.
        assert!(drafts[1].triples.is_empty());
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_verification_skips_mismatched_news_id() {
        let client = Arc::new(ScriptedClient::new(vec![]));
        let driver = PipelineDriver::with_config(client.clone(), fast_config());

        let drafts = vec![draft("ghost", vec![Triple::new("A", "AFFECTS", "B")])];
        let articles = vec![article("n1", &["One."])];

        let (verified, stats) = driver.run_verification(drafts, &articles).await;

        assert!(verified.is_empty());
        assert_eq!(stats, ReconciliationStats::new());
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_verification_skips_call_for_empty_draft() {
        let client = Arc::new(ScriptedClient::new(vec![]));
        let driver = PipelineDriver::with_config(client.clone(), fast_config());

        let drafts = vec![draft("n1", vec![])];
        let articles = vec![article("n1", &["One."])];

        let (verified, stats) = driver.run_verification(drafts, &articles).await;

        assert_eq!(verified.len(), 1);
        assert!(verified[0].triples.is_empty());
        assert_eq!(stats.total_before, 0);
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_verification_failure_keeps_draft_unchanged() {
        let client = Arc::new(ScriptedClient::new(vec![None]));
        let driver = PipelineDriver::with_config(client.clone(), fast_config());

        let triples = vec![
            Triple::new("A", "AFFECTS", "B"),
            Triple::new("C", "SURGED", "D"),
        ];
        let drafts = vec![draft("n1", triples.clone())];
        let articles = vec![article("n1", &["One."])];

        let (verified, stats) = driver.run_verification(drafts, &articles).await;

        assert_eq!(verified[0].triples, triples);
        assert_eq!(stats.kept, 2);
        assert_eq!(stats.total_before, 2);
        assert_eq!(stats.total_after, 2);
    }

    #[tokio::test]
    async fn test_verification_applies_judgements_and_accumulates_stats() {
        let response = r#"{
            "verified_triples": [
                {"head": "A", "relation": "AFFECTS", "tail": "B", "action": "KEEP", "reason": "ok"},
                {"head": "C", "relation": "RATES", "tail": "D", "action": "MODIFY", "reason": "schema"},
                {"head": "E", "relation": "CAUSES", "tail": "F", "action": "DELETE", "reason": "hallucination"}
            ]
        }"#;
        let client = Arc::new(ScriptedClient::new(vec![Some(response)]));
        let driver = PipelineDriver::with_config(client.clone(), fast_config());

        let drafts = vec![draft(
            "n1",
            vec![
                Triple::new("A", "AFFECTS", "B"),
                Triple::new("C", "SURGED", "D"),
                Triple::new("E", "CAUSES", "F"),
            ],
        )];
        let articles = vec![article("n1", &["One."])];

        let (verified, stats) = driver.run_verification(drafts, &articles).await;

        assert_eq!(verified[0].triples.len(), 2);
        // Off-vocabulary correction coerced to the fallback relation.
        assert_eq!(verified[0].triples[1].relation, "REPORTS");
        assert_eq!(stats.kept, 1);
        assert_eq!(stats.modified, 1);
        assert_eq!(stats.deleted, 1);
        assert_eq!(stats.total_before, stats.kept + stats.modified + stats.deleted);
        assert_eq!(stats.total_after, stats.kept + stats.modified);
    }

    #[tokio::test]
    async fn test_run_writes_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let news_path = dir.path().join("tsla_news.json");

        let articles = vec![article("n1", &["Tesla expands the Berlin Gigafactory."])];
        tokio::fs::write(&news_path, serde_json::to_string(&articles).unwrap())
            .await
            .unwrap();

        let client = Arc::new(ScriptedClient::new(vec![
            Some(r#"[{"head": "Tesla", "relation": "EXPANDS", "tail": "Berlin Gigafactory"}]"#),
            Some(
                r#"{"verified_triples": [{"head": "Tesla", "relation": "EXPANDS", "tail": "Berlin Gigafactory", "action": "KEEP", "reason": "ok"}]}"#,
            ),
        ]));
        let driver = PipelineDriver::with_config(client.clone(), fast_config());

        let log = driver.run(&news_path, "TSLA").await.unwrap();

        assert_eq!(log.articles, 1);
        assert_eq!(log.stats.kept, 1);
        assert!(log.draft_path.ends_with("tsla_triples_zero_shot.json"));
        assert!(log.verified_path.ends_with("tsla_triples_verified.json"));

        let raw = tokio::fs::read_to_string(&log.verified_path).await.unwrap();
        let verified: Vec<DocumentExtraction> = serde_json::from_str(&raw).unwrap();
        assert_eq!(verified[0].triples[0].head, "Tesla");
    }

    #[tokio::test]
    async fn test_empty_input_collection_halts() {
        let dir = tempfile::tempdir().unwrap();
        let news_path = dir.path().join("empty_news.json");
        tokio::fs::write(&news_path, "[]").await.unwrap();

        let client = Arc::new(ScriptedClient::new(vec![]));
        let driver = PipelineDriver::with_config(client, fast_config());

        assert!(matches!(
            driver.run(&news_path, "TSLA").await,
            Err(PipelineError::EmptyInput(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_input_file_is_io_error() {
        let client = Arc::new(ScriptedClient::new(vec![]));
        let driver = PipelineDriver::with_config(client, fast_config());

        assert!(matches!(
            driver.run(Path::new("/nonexistent/news.json"), "TSLA").await,
            Err(PipelineError::Io(_))
        ));
    }

    #[test]
    fn test_sibling_path_lowercases_target() {
        let path = sibling_path(Path::new("/data/TSLA_news.json"), "TSLA", "triples_verified");
        assert_eq!(path, Path::new("/data/tsla_triples_verified.json"));
    }
}
