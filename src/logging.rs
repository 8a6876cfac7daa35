use crate::aggregator::AggregatedDocument;
use crate::utils::truncate_str;
use crate::BrochureError;
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt as subscriber_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

#[derive(Debug)]
pub struct LogConfig {
    pub log_dir: PathBuf,
    pub log_level: String,
    pub console_output: bool,
    pub file_output: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".into(),
            log_level: "info".into(),
            console_output: true,
            file_output: false,
        }
    }
}

fn create_separator(width: usize, ch: char) -> String {
    std::iter::repeat(ch).take(width).collect()
}

/// One line per section of the aggregated document, boxed.
pub fn log_document_card(document: &AggregatedDocument) {
    const CARD_WIDTH: usize = 80;
    const CONTENT_WIDTH: usize = CARD_WIDTH - 4;

    let horizontal_line = create_separator(CARD_WIDTH - 2, '═');
    let mut lines = String::new();
    for section in document.sections() {
        let line = format!(
            "{} ({} chars): {}",
            section.label,
            section.content.chars().count(),
            section.url
        );
        lines.push_str(&format!("  {}\n", truncate_str(&line, CONTENT_WIDTH)));
    }
    for skipped in document.skipped() {
        let line = format!("skipped {}: {}", skipped.link.url, skipped.reason);
        lines.push_str(&format!("  {}\n", truncate_str(&line, CONTENT_WIDTH)));
    }

    info!("\n╔{}╗\n{}╚{}╝", horizontal_line, lines, horizontal_line);
}

/// Boxed summary of a failed run: what kind of failure, what it hit, and the
/// message with its cause chain.
pub fn log_error_card(error: &BrochureError) {
    const CARD_WIDTH: usize = 70;
    const CONTENT_WIDTH: usize = CARD_WIDTH - 8;

    let top_bottom = create_separator(CARD_WIDTH - 2, '═');
    let middle = create_separator(CARD_WIDTH - 2, '─');

    error!(
        "\n╔═{}═╗\n\
         ║ Kind: {:<width$} ║\n\
         ║ Target: {:<target_width$} ║\n\
         ║{}║\n\
         ║ Error: {:<width$} ║\n\
         ╚═{}═╝",
        top_bottom,
        error.kind(),
        truncate_str(&error.target().unwrap_or_else(|| "-".into()), CONTENT_WIDTH - 2),
        middle,
        truncate_str(&error_details(error), CONTENT_WIDTH),
        top_bottom,
        width = CONTENT_WIDTH,
        target_width = CONTENT_WIDTH - 2
    );
}

fn error_details(error: &BrochureError) -> String {
    match std::error::Error::source(error) {
        Some(source) => format!("{error} (caused by: {source})"),
        None => error.to_string(),
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over `config.log_level`.
pub fn setup_logging(config: LogConfig) -> Result<(), BrochureError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let mut layers = Vec::new();

    if config.console_output {
        let console_layer = subscriber_fmt::layer()
            .with_target(true)
            .with_line_number(true)
            .with_writer(std::io::stderr);
        layers.push(console_layer.boxed());
    }

    if config.file_output {
        std::fs::create_dir_all(&config.log_dir).map_err(|source| BrochureError::Persistence {
            path: config.log_dir.clone(),
            source,
        })?;

        let file_appender =
            RollingFileAppender::new(Rotation::DAILY, &config.log_dir, "site-brochure.log");

        let file_layer = subscriber_fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .with_file(true)
            .with_writer(file_appender);

        layers.push(file_layer.boxed());
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .map_err(|e| BrochureError::InvalidConfiguration(format!("Failed to install logger: {e}")))?;

    debug!("Logging system initialized with config: {:?}", config);
    Ok(())
}

pub struct LogLevelGuard {
    _guard: tracing::dispatcher::DefaultGuard,
}

impl LogLevelGuard {
    /// Scoped subscriber for tests and one-off runs.
    pub fn set_level(level: &str) -> Self {
        let filter = EnvFilter::new(level);
        let subscriber = tracing_subscriber::registry()
            .with(subscriber_fmt::layer().with_test_writer())
            .with(filter);

        LogLevelGuard {
            _guard: tracing::subscriber::set_default(subscriber),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Page;

    #[test]
    fn test_cards_render_under_scoped_subscriber() {
        let _guard = LogLevelGuard::set_level("debug");

        let document = AggregatedDocument::new(&Page {
            url: "https://x.com".into(),
            title: "X".into(),
            text: "Hello".into(),
            links: vec![],
        });
        log_document_card(&document);

        let err = BrochureError::HttpStatus {
            url: "https://x.com/about".into(),
            status: 503,
        };
        log_error_card(&err);
        err.log();
    }

    #[test]
    fn test_error_details_include_cause() {
        let err = BrochureError::Persistence {
            path: PathBuf::from("brochure.html"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(error_details(&err).ends_with("(caused by: denied)"));

        let err = BrochureError::MalformedModelResponse("not json".into());
        assert_eq!(error_details(&err), "Malformed model response: not json");
    }

    #[test]
    fn test_separator() {
        assert_eq!(create_separator(3, '─'), "───");
    }
}
