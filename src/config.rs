//! Pipeline configuration and validation utilities

use crate::aggregator::LinkFailurePolicy;
use crate::fetcher::{FetcherConfig, StatusPolicy, DEFAULT_FETCH_TIMEOUT, DEFAULT_USER_AGENT};
use crate::llm::LlmProvider;
use crate::llm_providers::ollama::DEFAULT_OLLAMA_ENDPOINT;
use crate::llm_providers::openai::LOCAL_OPENAI_BASE;
use crate::llm_providers::{OllamaProvider, OpenAiProvider};
use crate::prompts::DEFAULT_MAX_PROMPT_CHARS;
use crate::summarizer::DEFAULT_SUMMARY_PATH;
use crate::synthesizer::DEFAULT_BROCHURE_PATH;
use crate::{BrochureError, Fetcher};
use async_openai::config::OpenAIConfig;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Which inference backend answers the chat requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LlmBackend {
    /// Local server speaking the OpenAI chat-completions protocol (Ollama's `/v1`).
    Local { api_base: String },
    /// Ollama's native `/api/chat`.
    Ollama { endpoint: String },
    /// Hosted OpenAI, or another hosted service when `api_base` is set.
    OpenAi {
        api_key: String,
        api_base: Option<String>,
    },
}

impl Default for LlmBackend {
    fn default() -> Self {
        LlmBackend::Local {
            api_base: LOCAL_OPENAI_BASE.to_string(),
        }
    }
}

impl LlmBackend {
    pub fn is_local(&self) -> bool {
        !matches!(self, LlmBackend::OpenAi { .. })
    }
}

/// Everything a run needs, passed into the pipeline instead of read from globals.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub company_name: String,
    pub url: String,
    pub model: String,
    pub backend: LlmBackend,
    /// Character budget of the brochure and summary prompts.
    pub max_prompt_chars: usize,
    pub output_path: PathBuf,
    pub summary_path: PathBuf,
    pub link_failure_policy: LinkFailurePolicy,
    pub status_policy: StatusPolicy,
    /// Request JSON mode for the brochure call too.
    pub brochure_json_mode: bool,
    pub fetch_timeout: Duration,
    pub user_agent: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            company_name: "HuggingFace".to_string(),
            url: "https://huggingface.co".to_string(),
            model: "gemma3:4b".to_string(),
            backend: LlmBackend::default(),
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
            output_path: PathBuf::from(DEFAULT_BROCHURE_PATH),
            summary_path: PathBuf::from(DEFAULT_SUMMARY_PATH),
            link_failure_policy: LinkFailurePolicy::default(),
            status_policy: StatusPolicy::default(),
            brochure_json_mode: true,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self, BrochureError> {
        Self::default().with_env_source(|key| std::env::var(key).ok())
    }

    /// Overlays values from `lookup`, which stands in for the environment.
    ///
    /// Recognised keys: `BROCHURE_COMPANY`, `BROCHURE_URL`, `BROCHURE_MODEL`,
    /// `BROCHURE_LLM_BACKEND` (`local`, `ollama`, `openai`), `OPENAI_API_KEY`,
    /// `OPENAI_BASE_URL`, `OLLAMA_ENDPOINT`, `BROCHURE_MAX_PROMPT_CHARS`.
    pub fn with_env_source<F>(mut self, lookup: F) -> Result<Self, BrochureError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(company) = lookup("BROCHURE_COMPANY") {
            self.company_name = company;
        }
        if let Some(url) = lookup("BROCHURE_URL") {
            self.url = url;
        }
        if let Some(model) = lookup("BROCHURE_MODEL") {
            self.model = model;
        }
        if let Some(max) = lookup("BROCHURE_MAX_PROMPT_CHARS") {
            self.max_prompt_chars = max.parse().map_err(|_| {
                BrochureError::InvalidConfiguration(format!(
                    "BROCHURE_MAX_PROMPT_CHARS must be a positive integer, got '{max}'"
                ))
            })?;
        }

        if let Some(backend) = lookup("BROCHURE_LLM_BACKEND") {
            self.backend = match backend.to_lowercase().as_str() {
                "local" => LlmBackend::Local {
                    api_base: lookup("OPENAI_BASE_URL")
                        .unwrap_or_else(|| LOCAL_OPENAI_BASE.to_string()),
                },
                "ollama" => LlmBackend::Ollama {
                    endpoint: lookup("OLLAMA_ENDPOINT")
                        .unwrap_or_else(|| DEFAULT_OLLAMA_ENDPOINT.to_string()),
                },
                "openai" => LlmBackend::OpenAi {
                    api_key: lookup("OPENAI_API_KEY").ok_or_else(|| {
                        BrochureError::InvalidConfiguration(
                            "OPENAI_API_KEY environment variable not set".to_string(),
                        )
                    })?,
                    api_base: lookup("OPENAI_BASE_URL"),
                },
                other => {
                    return Err(BrochureError::InvalidConfiguration(format!(
                        "Unknown LLM backend '{other}', expected local, ollama or openai"
                    )))
                }
            };
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), BrochureError> {
        let url = Url::parse(&self.url).map_err(|e| {
            BrochureError::InvalidConfiguration(format!("Invalid target URL '{}': {e}", self.url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(BrochureError::InvalidConfiguration(format!(
                "Target URL must be http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.model.trim().is_empty() {
            return Err(BrochureError::InvalidConfiguration(
                "Model name cannot be empty".to_string(),
            ));
        }

        if self.max_prompt_chars == 0 {
            return Err(BrochureError::InvalidConfiguration(
                "Prompt budget must be greater than zero".to_string(),
            ));
        }

        if let LlmBackend::OpenAi { api_key, api_base } = &self.backend {
            validate_openai_key(api_key, api_base.is_some())?;
        }

        Ok(())
    }

    pub fn use_local(&self) -> bool {
        self.backend.is_local()
    }

    pub fn fetcher(&self) -> Fetcher {
        Fetcher::new_with_config(FetcherConfig {
            user_agent: self.user_agent.clone(),
            timeout: self.fetch_timeout,
            status_policy: self.status_policy,
            ..Default::default()
        })
    }

    pub fn provider(&self) -> Arc<dyn LlmProvider> {
        match &self.backend {
            LlmBackend::Local { api_base } => Arc::new(OpenAiProvider::local(api_base.clone())),
            LlmBackend::Ollama { endpoint } => Arc::new(OllamaProvider::new(endpoint.clone())),
            LlmBackend::OpenAi { api_key, api_base } => {
                let mut config = OpenAIConfig::new().with_api_key(api_key.clone());
                if let Some(base) = api_base {
                    config = config.with_api_base(base.clone());
                }
                Arc::new(OpenAiProvider::from_config(config, "openai"))
            }
        }
    }
}

/// Hosted OpenAI keys start with `sk-`; compatible services use their own formats.
fn validate_openai_key(api_key: &str, custom_base: bool) -> Result<(), BrochureError> {
    if api_key.is_empty() {
        return Err(BrochureError::InvalidConfiguration(
            "OpenAI API key cannot be empty".to_string(),
        ));
    }

    if !custom_base && !api_key.starts_with("sk-") {
        return Err(BrochureError::InvalidConfiguration(
            "OpenAI API key must start with 'sk-'".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.model, "gemma3:4b");
        assert_eq!(config.max_prompt_chars, 5_000);
        assert_eq!(config.output_path, PathBuf::from("brochure.html"));
        assert_eq!(config.link_failure_policy, LinkFailurePolicy::Abort);
        assert!(config.use_local());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overlay() {
        let config = PipelineConfig::default()
            .with_env_source(env(&[
                ("BROCHURE_COMPANY", "Acme"),
                ("BROCHURE_URL", "https://acme.test"),
                ("BROCHURE_LLM_BACKEND", "ollama"),
                ("OLLAMA_ENDPOINT", "http://gpu-box:11434"),
                ("BROCHURE_MAX_PROMPT_CHARS", "8000"),
            ]))
            .unwrap();

        assert_eq!(config.company_name, "Acme");
        assert_eq!(config.url, "https://acme.test");
        assert_eq!(config.max_prompt_chars, 8_000);
        assert_eq!(
            config.backend,
            LlmBackend::Ollama {
                endpoint: "http://gpu-box:11434".to_string()
            }
        );
        assert_eq!(config.provider().name(), "ollama");
    }

    #[test]
    fn test_openai_backend_requires_key() {
        let err = PipelineConfig::default()
            .with_env_source(env(&[("BROCHURE_LLM_BACKEND", "openai")]))
            .unwrap_err();
        assert!(matches!(err, BrochureError::InvalidConfiguration(_)));

        let err = PipelineConfig::default()
            .with_env_source(env(&[
                ("BROCHURE_LLM_BACKEND", "openai"),
                ("OPENAI_API_KEY", "not-a-key"),
            ]))
            .unwrap_err();
        assert!(err.to_string().contains("sk-"));

        let config = PipelineConfig::default()
            .with_env_source(env(&[
                ("BROCHURE_LLM_BACKEND", "openai"),
                ("OPENAI_API_KEY", "sk-1234567890abcdef"),
            ]))
            .unwrap();
        assert!(!config.use_local());
    }

    #[test]
    fn test_invalid_values_rejected() {
        for pairs in [
            vec![("BROCHURE_LLM_BACKEND", "carrier-pigeon")],
            vec![("BROCHURE_URL", "ftp://x.com")],
            vec![("BROCHURE_URL", "not a url")],
            vec![("BROCHURE_MAX_PROMPT_CHARS", "lots")],
            vec![("BROCHURE_MAX_PROMPT_CHARS", "0")],
            vec![("BROCHURE_MODEL", "  ")],
        ] {
            assert!(
                PipelineConfig::default().with_env_source(env(&pairs)).is_err(),
                "{pairs:?} should be rejected"
            );
        }
    }
}
