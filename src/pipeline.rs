use crate::aggregator::{AggregatedDocument, ContentAggregator};
use crate::config::PipelineConfig;
use crate::link_filter::LinkRelevanceFilter;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::reasoning::ModelReply;
use crate::synthesizer::{Brochure, BrochureSynthesizer};
use crate::BrochureError;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

/// Linear stages of a brochure run. There is no way back: a run ends in
/// [`PipelineStage::Saved`] or [`PipelineStage::Aborted`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    FetchingLanding,
    FilteringLinks,
    FetchingRelevantPages,
    Synthesizing,
    Saved,
    Aborted,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::FetchingLanding => "fetching landing page",
            PipelineStage::FilteringLinks => "filtering links",
            PipelineStage::FetchingRelevantPages => "fetching relevant pages",
            PipelineStage::Synthesizing => "synthesizing",
            PipelineStage::Saved => "saved",
            PipelineStage::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Fetch landing page, filter links, fetch relevant pages, write the brochure.
///
/// Every step waits for the previous one; `N` selected links cost `N + 3`
/// round trips in total.
pub struct BrochurePipeline {
    config: PipelineConfig,
    aggregator: ContentAggregator,
    synthesizer: BrochureSynthesizer,
    stage: Mutex<PipelineStage>,
}

impl BrochurePipeline {
    pub fn new(config: PipelineConfig, provider: Arc<dyn LlmProvider>) -> Self {
        let filter = LinkRelevanceFilter::new(provider.clone(), &config.model);
        let aggregator = ContentAggregator::new(config.fetcher(), filter)
            .with_policy(config.link_failure_policy);
        let synthesizer = BrochureSynthesizer::new(provider, &config.model)
            .with_max_prompt_chars(config.max_prompt_chars)
            .with_json_mode(config.brochure_json_mode)
            .with_output_path(config.output_path.clone());

        Self {
            config,
            aggregator,
            synthesizer,
            stage: Mutex::new(PipelineStage::Idle),
        }
    }

    /// Builds the provider described by the configuration.
    pub fn from_config(config: PipelineConfig) -> Self {
        let provider = config.provider();
        Self::new(config, provider)
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
            .lock()
            .map(|stage| *stage)
            .unwrap_or(PipelineStage::Aborted)
    }

    fn enter(&self, next: PipelineStage) {
        if let Ok(mut stage) = self.stage.lock() {
            let from = *stage;
            debug!(from = %from, to = %next, "Pipeline stage transition");
            *stage = next;
        }
    }

    pub async fn run(&self) -> Result<Brochure, BrochureError> {
        info!(
            company = %self.config.company_name,
            url = %self.config.url,
            model = %self.config.model,
            "Starting brochure run"
        );

        match self.run_stages().await {
            Ok(brochure) => {
                self.enter(PipelineStage::Saved);
                info!(path = %brochure.path.display(), "Brochure completed");
                Ok(brochure)
            }
            Err(e) => {
                let failed_at = self.stage();
                self.enter(PipelineStage::Aborted);
                e.log();
                error!(stage = %failed_at, "Brochure run aborted");
                Err(e)
            }
        }
    }

    /// Landing page plus relevant pages, without writing anything.
    pub async fn aggregate(&self) -> Result<AggregatedDocument, BrochureError> {
        self.enter(PipelineStage::FetchingLanding);
        let landing = self.aggregator.fetch_landing(&self.config.url).await?;

        self.enter(PipelineStage::FilteringLinks);
        let outcome = self.aggregator.select_links(&landing).await?;

        self.enter(PipelineStage::FetchingRelevantPages);
        self.aggregator.collect(&landing, outcome).await
    }

    async fn run_stages(&self) -> Result<Brochure, BrochureError> {
        let document = self.aggregate().await?;
        #[cfg(feature = "logging")]
        crate::logging::log_document_card(&document);
        if !document.skipped().is_empty() {
            info!(skipped = document.skipped().len(), "Some relevant links were skipped");
        }

        self.enter(PipelineStage::Synthesizing);
        self.synthesizer
            .synthesize(&self.config.company_name, &document)
            .await
    }
}

/// One free-text question, answer split from any `<think>` block.
pub async fn ask(
    provider: &dyn LlmProvider,
    model: &str,
    question: &str,
) -> Result<ModelReply, BrochureError> {
    info!(model = %model, "Querying model");
    let request = ChatRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::user(question)],
        json_mode: false,
    };
    let response = provider.complete(request).await?;
    Ok(ModelReply::parse(&response.content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockProvider;

    #[test]
    fn test_new_pipeline_is_idle() {
        let pipeline = BrochurePipeline::new(PipelineConfig::default(), Arc::new(MockProvider::new()));
        assert_eq!(pipeline.stage(), PipelineStage::Idle);
        assert_eq!(PipelineStage::FetchingRelevantPages.to_string(), "fetching relevant pages");
    }

    #[tokio::test]
    async fn test_ask_splits_reasoning() {
        let provider = MockProvider::new().with_response("<think>hmm</think>Chatbots.");
        let reply = ask(&provider, "deepseek-r1:1.5b", "Uses of GenAI?").await.unwrap();
        assert_eq!(reply.thinking.as_deref(), Some("hmm"));
        assert_eq!(reply.answer, "Chatbots.");

        let request = &provider.requests()[0];
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.user_prompt(), Some("Uses of GenAI?"));
    }
}
