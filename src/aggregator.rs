//! Landing page plus every relevant linked page, concatenated into one document.

use crate::link_filter::{FilterOutcome, LinkRelevanceFilter, RelevantLink};
use crate::utils::resolve_link;
use crate::{BrochureError, Fetcher, Page};
use tracing::{info, instrument, warn};

pub const LANDING_PAGE_LABEL: &str = "Landing page";

/// What to do when one of the relevant links cannot be fetched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LinkFailurePolicy {
    /// The first failure aborts the whole aggregation.
    #[default]
    Abort,
    /// Record the failure and carry on with the remaining links.
    Skip,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section {
    pub label: String,
    pub url: String,
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedLink {
    pub link: RelevantLink,
    pub reason: String,
}

/// Text of the landing page followed by each relevant page in filter order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregatedDocument {
    sections: Vec<Section>,
    skipped: Vec<SkippedLink>,
}

impl AggregatedDocument {
    pub fn new(landing: &Page) -> Self {
        Self {
            sections: vec![Section {
                label: LANDING_PAGE_LABEL.to_string(),
                url: landing.url.clone(),
                content: landing.contents(),
            }],
            skipped: Vec::new(),
        }
    }

    pub fn push(&mut self, label: impl Into<String>, page: &Page) {
        self.sections.push(Section {
            label: label.into(),
            url: page.url.clone(),
            content: page.contents(),
        });
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Links dropped under [`LinkFailurePolicy::Skip`].
    pub fn skipped(&self) -> &[SkippedLink] {
        &self.skipped
    }

    /// The landing section reads `"Landing page:\n..."`, every later section is
    /// preceded by a blank line and its label.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (index, section) in self.sections.iter().enumerate() {
            if index == 0 {
                out.push_str(&format!("{}:\n", section.label));
            } else {
                out.push_str(&format!("\n\n{}\n", section.label));
            }
            out.push_str(&section.content);
        }
        out
    }
}

pub struct ContentAggregator {
    fetcher: Fetcher,
    filter: LinkRelevanceFilter,
    policy: LinkFailurePolicy,
}

impl ContentAggregator {
    pub fn new(fetcher: Fetcher, filter: LinkRelevanceFilter) -> Self {
        Self {
            fetcher,
            filter,
            policy: LinkFailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: LinkFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Runs all three steps: landing page, link filter, relevant pages.
    #[instrument(level = "debug", skip(self))]
    pub async fn aggregate(&self, url: &str) -> Result<AggregatedDocument, BrochureError> {
        let landing = self.fetch_landing(url).await?;
        let outcome = self.select_links(&landing).await?;
        self.collect(&landing, outcome).await
    }

    pub async fn fetch_landing(&self, url: &str) -> Result<Page, BrochureError> {
        info!(url = %url, "Extracting content from landing page");
        self.fetcher.fetch_page(url).await
    }

    pub async fn select_links(&self, landing: &Page) -> Result<FilterOutcome, BrochureError> {
        self.filter.filter_links(landing).await
    }

    /// Fetches every selected link in order. An [`FilterOutcome::Absent`] result
    /// leaves the document with the landing page only.
    pub async fn collect(
        &self,
        landing: &Page,
        outcome: FilterOutcome,
    ) -> Result<AggregatedDocument, BrochureError> {
        let mut document = AggregatedDocument::new(landing);

        let links = match outcome {
            FilterOutcome::Absent => {
                info!("No relevant links returned, using landing page only");
                return Ok(document);
            }
            FilterOutcome::Present(links) => links,
        };

        info!(count = links.len(), "Extracting additional information from links");

        for link in links {
            info!(link_type = %link.link_type, url = %link.url, "Extracting additional information");

            match self.fetch_relevant(&landing.url, &link).await {
                Ok(page) => document.push(link.link_type.clone(), &page),
                Err(e) => match self.policy {
                    LinkFailurePolicy::Abort => return Err(e),
                    LinkFailurePolicy::Skip => {
                        e.log();
                        warn!(url = %link.url, "Skipping relevant link");
                        document.skipped.push(SkippedLink {
                            link,
                            reason: e.to_string(),
                        });
                    }
                },
            }
        }

        Ok(document)
    }

    async fn fetch_relevant(&self, base: &str, link: &RelevantLink) -> Result<Page, BrochureError> {
        let url = resolve_link(base, &link.url)?;
        self.fetcher.fetch_page(url.as_str()).await
    }
}
