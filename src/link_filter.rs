//! Asks the model which links of a page belong in a company brochure.

use crate::llm::{parse_json_content, ChatRequest, LlmProvider};
use crate::prompts::{link_filter_user_prompt, LINK_FILTER_SYSTEM_PROMPT};
use crate::{BrochureError, Page};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// One link the model picked, labeled with a free-text type such as "about page".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevantLink {
    #[serde(rename = "type")]
    pub link_type: String,
    /// Meant to be absolute, but models do not always comply.
    pub url: String,
}

/// Typed result of the filter call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterOutcome {
    /// The reply had a `links` list (possibly empty).
    Present(Vec<RelevantLink>),
    /// The reply was valid JSON without a `links` list.
    Absent,
}

impl FilterOutcome {
    pub fn links(&self) -> &[RelevantLink] {
        match self {
            FilterOutcome::Present(links) => links,
            FilterOutcome::Absent => &[],
        }
    }
}

pub struct LinkRelevanceFilter {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl LinkRelevanceFilter {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// One JSON-mode call, no retry.
    #[instrument(level = "debug", skip_all, fields(url = %page.url, link_count = page.links.len()))]
    pub async fn filter_links(&self, page: &Page) -> Result<FilterOutcome, BrochureError> {
        info!("Filtering relevant links of the landing page");

        let user_prompt = link_filter_user_prompt(page);
        debug!(prompt = %user_prompt, "Link filter prompt");

        let request = ChatRequest::new(&self.model, LINK_FILTER_SYSTEM_PROMPT, user_prompt)
            .with_json_mode(true);
        let response = self.provider.complete(request).await?;

        let outcome = parse_filter_response(&response.content)?;
        match &outcome {
            FilterOutcome::Present(links) => info!(count = links.len(), "Model selected links"),
            FilterOutcome::Absent => info!("Model reply had no links list"),
        }
        Ok(outcome)
    }
}

/// Converts the raw model reply into a [`FilterOutcome`].
///
/// Invalid JSON, or a `links` value that is not a list of `{type, url}` string
/// objects, is a [`BrochureError::MalformedModelResponse`]. A missing or null
/// `links` key is [`FilterOutcome::Absent`].
pub fn parse_filter_response(content: &str) -> Result<FilterOutcome, BrochureError> {
    let value = parse_json_content(content)?;

    let links = match value {
        Value::Object(mut map) => map.remove("links"),
        _ => None,
    };

    match links {
        None | Some(Value::Null) => Ok(FilterOutcome::Absent),
        Some(links) => serde_json::from_value::<Vec<RelevantLink>>(links)
            .map(FilterOutcome::Present)
            .map_err(|e| {
                BrochureError::MalformedModelResponse(format!("unexpected 'links' shape: {e}"))
            }),
    }
}
