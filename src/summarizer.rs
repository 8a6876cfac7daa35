use crate::llm::{ChatRequest, LlmProvider};
use crate::prompts::{summary_user_prompt, DEFAULT_MAX_PROMPT_CHARS, SUMMARY_SYSTEM_PROMPT};
use crate::synthesizer::save_output;
use crate::{BrochureError, Fetcher};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument};

pub const DEFAULT_SUMMARY_PATH: &str = "summary.md";

#[derive(Clone, Debug)]
pub struct Summary {
    pub markdown: String,
    pub path: PathBuf,
}

/// Single-page markdown summary.
pub struct Summarizer {
    fetcher: Fetcher,
    provider: Arc<dyn LlmProvider>,
    model: String,
    max_prompt_chars: usize,
    output_path: PathBuf,
}

impl Summarizer {
    pub fn new(fetcher: Fetcher, provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            fetcher,
            provider,
            model: model.into(),
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
            output_path: PathBuf::from(DEFAULT_SUMMARY_PATH),
        }
    }

    pub fn with_max_prompt_chars(mut self, max_prompt_chars: usize) -> Self {
        self.max_prompt_chars = max_prompt_chars;
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn summarize(&self, url: &str) -> Result<Summary, BrochureError> {
        let page = self.fetcher.fetch_page(url).await?;
        info!(title = %page.title, "Summarizing page");

        let request = ChatRequest::new(
            &self.model,
            SUMMARY_SYSTEM_PROMPT,
            summary_user_prompt(&page, self.max_prompt_chars),
        );
        let response = self.provider.complete(request).await?;

        info!(path = %self.output_path.display(), "Saving summary");
        save_output(&self.output_path, &response.content).await?;

        Ok(Summary {
            markdown: response.content,
            path: self.output_path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockProvider;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_summarize_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><head><title>Ed's site</title></head><body><p>I teach LLM engineering.</p></body></html>",
            ))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("summary.md");
        let provider = Arc::new(MockProvider::new().with_response("# Summary\nA course site."));

        let summary = Summarizer::new(Fetcher::new(), provider.clone(), "gemma3:4b")
            .with_output_path(&out)
            .summarize(&server.uri())
            .await
            .unwrap();

        assert_eq!(summary.markdown, "# Summary\nA course site.");
        assert_eq!(std::fs::read_to_string(&out).unwrap(), summary.markdown);

        let request = &provider.requests()[0];
        assert!(!request.json_mode);
        let prompt = request.user_prompt().unwrap();
        assert!(prompt.contains("titled Ed's site"));
        assert!(prompt.ends_with("I teach LLM engineering."));
    }
}
