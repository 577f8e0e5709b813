use serde::{Deserialize, Serialize};

/// Configuration for the chat-completions client.
///
/// Credentials are supplied once at process start and travel with the
/// client object; nothing in the pipeline reads the environment after
/// construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    /// Whole-request timeout, seconds.
    pub request_timeout_seconds: u32,
    /// Connect timeout, seconds.
    pub connect_timeout_seconds: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            request_timeout_seconds: 120,
            connect_timeout_seconds: 10,
        }
    }
}

impl LlmConfig {
    /// Build a config from `OPENAI_API_KEY` and the optional
    /// `OPENAI_BASE_URL` / `OPENAI_MODEL` overrides.
    ///
    /// # Errors
    ///
    /// Returns [`super::LlmError::MissingApiKey`] when the key is unset or
    /// empty.
    pub fn from_env() -> Result<Self, super::LlmError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(super::LlmError::MissingApiKey)?;

        let mut config = Self {
            api_key,
            ..Self::default()
        };

        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            if !base_url.trim().is_empty() {
                config.base_url = base_url;
            }
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            if !model.trim().is_empty() {
                config.model = model;
            }
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Chat-completions endpoint derived from `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`super::LlmError::InvalidBaseUrl`] when `base_url` does not
    /// parse.
    pub fn completions_url(&self) -> Result<url::Url, super::LlmError> {
        let base = self.base_url.trim_end_matches('/');
        url::Url::parse(&format!("{base}/chat/completions"))
            .map_err(|_| super::LlmError::InvalidBaseUrl(self.base_url.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_url_from_default_base() {
        let config = LlmConfig::default();
        let url = config.completions_url().unwrap();
        assert_eq!(url.as_str(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_completions_url_tolerates_trailing_slash() {
        let config = LlmConfig::default().with_base_url("http://localhost:8080/v1/");
        let url = config.completions_url().unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let config = LlmConfig::default().with_base_url("not a url");
        assert!(matches!(
            config.completions_url(),
            Err(super::super::LlmError::InvalidBaseUrl(_))
        ));
    }
}
