use crate::aggregator::AggregatedDocument;
use crate::llm::{ChatRequest, LlmProvider};
use crate::prompts::{brochure_user_prompt, BROCHURE_SYSTEM_PROMPT, DEFAULT_MAX_PROMPT_CHARS};
use crate::BrochureError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub const DEFAULT_BROCHURE_PATH: &str = "brochure.html";

/// The model's answer, saved verbatim.
#[derive(Clone, Debug)]
pub struct Brochure {
    pub html: String,
    pub path: PathBuf,
}

pub struct BrochureSynthesizer {
    provider: Arc<dyn LlmProvider>,
    model: String,
    max_prompt_chars: usize,
    json_mode: bool,
    output_path: PathBuf,
}

impl BrochureSynthesizer {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_prompt_chars: DEFAULT_MAX_PROMPT_CHARS,
            json_mode: true,
            output_path: PathBuf::from(DEFAULT_BROCHURE_PATH),
        }
    }

    pub fn with_max_prompt_chars(mut self, max_prompt_chars: usize) -> Self {
        self.max_prompt_chars = max_prompt_chars;
        self
    }

    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn build_user_prompt(&self, company_name: &str, document: &AggregatedDocument) -> String {
        brochure_user_prompt(company_name, &document.render(), self.max_prompt_chars)
    }

    /// Asks for the brochure and writes whatever comes back to the output path.
    #[instrument(level = "debug", skip(self, document))]
    pub async fn synthesize(
        &self,
        company_name: &str,
        document: &AggregatedDocument,
    ) -> Result<Brochure, BrochureError> {
        info!("Generating brochure...");

        let user_prompt = self.build_user_prompt(company_name, document);
        debug!(prompt_chars = user_prompt.chars().count(), "Brochure prompt built");

        let request = ChatRequest::new(&self.model, BROCHURE_SYSTEM_PROMPT, user_prompt)
            .with_json_mode(self.json_mode);
        let response = self.provider.complete(request).await?;

        info!(path = %self.output_path.display(), "Saving brochure");
        save_output(&self.output_path, &response.content).await?;

        Ok(Brochure {
            html: response.content,
            path: self.output_path.clone(),
        })
    }
}

/// UTF-8, overwriting any previous file.
pub(crate) async fn save_output(path: &Path, content: &str) -> Result<(), BrochureError> {
    tokio::fs::write(path, content)
        .await
        .map_err(|source| BrochureError::Persistence {
            path: path.to_path_buf(),
            source,
        })
}
