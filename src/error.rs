use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum BrochureError {
    #[error("Failed to parse URL: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Failed to fetch {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Server returned {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Unusable link {url}: {reason}")]
    InvalidLink { url: String, reason: String },

    #[error("Malformed model response: {0}")]
    MalformedModelResponse(String),

    #[error("External service error: {service} - {message}")]
    ExternalService { service: String, message: String },

    #[error("Failed to write {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl BrochureError {
    pub(crate) fn transport(url: &str, err: impl std::fmt::Display) -> Self {
        BrochureError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    pub(crate) fn external(service: &str, err: impl std::fmt::Display) -> Self {
        BrochureError::ExternalService {
            service: service.to_string(),
            message: err.to_string(),
        }
    }

    /// Short variant name, used as the heading of error cards.
    pub fn kind(&self) -> &'static str {
        match self {
            BrochureError::UrlParse(_) => "url parse",
            BrochureError::Transport { .. } => "transport",
            BrochureError::HttpStatus { .. } => "http status",
            BrochureError::InvalidLink { .. } => "invalid link",
            BrochureError::MalformedModelResponse(_) => "malformed model response",
            BrochureError::ExternalService { .. } => "external service",
            BrochureError::Persistence { .. } => "persistence",
            BrochureError::InvalidConfiguration(_) => "configuration",
        }
    }

    /// The URL, file or service the error is about, when it names one.
    pub fn target(&self) -> Option<String> {
        match self {
            BrochureError::Transport { url, .. }
            | BrochureError::HttpStatus { url, .. }
            | BrochureError::InvalidLink { url, .. } => Some(url.clone()),
            BrochureError::ExternalService { service, .. } => Some(service.clone()),
            BrochureError::Persistence { path, .. } => Some(path.display().to_string()),
            BrochureError::UrlParse(_)
            | BrochureError::MalformedModelResponse(_)
            | BrochureError::InvalidConfiguration(_) => None,
        }
    }

    pub fn log(&self) {
        match self {
            BrochureError::UrlParse(e) => {
                warn!(error = %e, "URL parsing failed");
            }
            BrochureError::Transport { url, message } => {
                error!(url = %url, error = %message, "Page fetch failed");
            }
            BrochureError::HttpStatus { url, status } => {
                error!(url = %url, status = status, "Page fetch returned error status");
            }
            BrochureError::InvalidLink { url, reason } => {
                warn!(url = %url, reason = %reason, "Relevant link could not be used");
            }
            BrochureError::MalformedModelResponse(e) => {
                error!(error = %e, "Model response did not have the expected shape");
            }
            BrochureError::ExternalService { service, message } => {
                error!(
                    service = %service,
                    error = %message,
                    "External service error occurred"
                );
            }
            BrochureError::Persistence { path, source } => {
                error!(path = %path.display(), error = %source, "Failed to save output");
            }
            BrochureError::InvalidConfiguration(e) => {
                error!(error = %e, "Invalid configuration");
            }
        }
    }
}
