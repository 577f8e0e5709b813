use serde::{Deserialize, Serialize};

/// A source document as produced by the news-scraping stage.
///
/// `news_id` is the join key between an article and its triples across the
/// pipeline; it must be stable and unique within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub news_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_time: Option<String>,
    #[serde(default)]
    pub content: Vec<String>,
}

impl NewsArticle {
    /// Paragraphs joined with newlines, as fed to the extraction prompt.
    #[must_use]
    pub fn full_text(&self) -> String {
        self.content.join("\n")
    }

    /// Paragraphs joined with spaces and truncated to at most `cap`
    /// characters, as fed to the verification prompt. Judgements about
    /// content beyond the cap are not obtainable; that is an accepted
    /// precision loss.
    #[must_use]
    pub fn flattened_text(&self, cap: usize) -> String {
        self.content.join(" ").chars().take(cap).collect()
    }
}
