//! Scrape a company website, let an LLM pick the pages worth reading and have
//! it write a short HTML brochure from them.
//!
//! ```no_run
//! use site_brochure::{BrochurePipeline, PipelineConfig};
//!
//! # async fn run() -> Result<(), site_brochure::BrochureError> {
//! let config = PipelineConfig {
//!     company_name: "HuggingFace".into(),
//!     url: "https://huggingface.co".into(),
//!     ..Default::default()
//! };
//! let brochure = BrochurePipeline::from_config(config).run().await?;
//! println!("saved to {}", brochure.path.display());
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod config;
mod error;
mod extractor;
mod fetcher;
pub mod link_filter;
pub mod llm;
pub mod llm_providers;
#[cfg(feature = "logging")]
mod logging;
pub mod pipeline;
pub mod prompts;
pub mod reasoning;
pub mod summarizer;
pub mod synthesizer;
mod utils;

pub use aggregator::{AggregatedDocument, ContentAggregator, LinkFailurePolicy, LANDING_PAGE_LABEL};
pub use config::{LlmBackend, PipelineConfig};
pub use error::BrochureError;
pub use extractor::{PageTextExtractor, NO_TITLE_PLACEHOLDER};
pub use fetcher::{Fetcher, FetcherConfig, StatusPolicy, DEFAULT_USER_AGENT};
pub use link_filter::{FilterOutcome, LinkRelevanceFilter, RelevantLink};
pub use llm::{ChatMessage, ChatRequest, ChatResponse, LlmProvider, Role, TokenUsage};
pub use llm_providers::{MockProvider, OllamaProvider, OpenAiProvider};
#[cfg(feature = "logging")]
pub use logging::{log_document_card, log_error_card, setup_logging, LogConfig, LogLevelGuard};
pub use pipeline::{ask, BrochurePipeline, PipelineStage};
pub use reasoning::ModelReply;
pub use summarizer::{Summarizer, Summary};
pub use synthesizer::{Brochure, BrochureSynthesizer};
pub use utils::resolve_link;

/// One fetched and extracted web page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub url: String,
    pub title: String,
    /// Body text, one trimmed text node per line.
    pub text: String,
    /// Raw `href` values in document order; may be relative.
    pub links: Vec<String>,
}

impl Page {
    pub fn from_html(html: &str, url: &str) -> Self {
        PageTextExtractor::new().extract(html, url)
    }

    /// The block that goes into the aggregated document and the prompts.
    pub fn contents(&self) -> String {
        format!(
            "Webpage Title:\n{}\nWebpage Contents:\n{}\n\n",
            self.title, self.text
        )
    }
}
