use clap::{Args, Parser, Subcommand, ValueEnum};
use site_brochure::llm_providers::ollama::DEFAULT_OLLAMA_ENDPOINT;
use site_brochure::llm_providers::openai::LOCAL_OPENAI_BASE;
use site_brochure::{
    ask, log_error_card, setup_logging, BrochureError, BrochurePipeline,
    LinkFailurePolicy, LlmBackend, LogConfig, PipelineConfig, StatusPolicy, Summarizer,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "site-brochure", version, about = "Turn a company website into a short brochure")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct CommonArgs {
    /// Model identifier passed to the backend
    #[arg(long, global = true)]
    model: Option<String>,

    /// Inference backend
    #[arg(long, value_enum, global = true)]
    backend: Option<BackendArg>,

    /// API key for the openai backend
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Base URL override for the local or openai backend, or the Ollama endpoint.
    /// Without --backend it applies to the configured backend
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Also write logs to a daily file under this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Local,
    Ollama,
    Openai,
}

#[derive(Subcommand)]
enum Command {
    /// Build an HTML brochure from a company website
    Brochure {
        /// Company name used in the prompt
        #[arg(long)]
        company: Option<String>,
        /// Landing page URL
        #[arg(long)]
        url: Option<String>,
        /// Where to write the brochure
        #[arg(long)]
        output: Option<PathBuf>,
        /// Character budget of the brochure prompt
        #[arg(long)]
        max_prompt_chars: Option<usize>,
        /// Keep going when a relevant link cannot be fetched
        #[arg(long)]
        skip_failed_links: bool,
        /// Parse pages even when the server answers with an error status
        #[arg(long)]
        accept_error_status: bool,
        /// Do not request JSON mode for the brochure call
        #[arg(long)]
        no_json_mode: bool,
    },
    /// Write a markdown summary of a single page
    Summarize {
        url: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Ask the model a single question
    Ask { question: String },
}

fn apply_common(config: &mut PipelineConfig, common: &CommonArgs) -> Result<(), BrochureError> {
    if let Some(model) = &common.model {
        config.model = model.clone();
    }

    if let Some(backend) = common.backend {
        config.backend = match backend {
            BackendArg::Local => LlmBackend::Local {
                api_base: common
                    .api_base
                    .clone()
                    .unwrap_or_else(|| LOCAL_OPENAI_BASE.to_string()),
            },
            BackendArg::Ollama => LlmBackend::Ollama {
                endpoint: common
                    .api_base
                    .clone()
                    .unwrap_or_else(|| DEFAULT_OLLAMA_ENDPOINT.to_string()),
            },
            BackendArg::Openai => LlmBackend::OpenAi {
                api_key: common.api_key.clone().ok_or_else(|| {
                    BrochureError::InvalidConfiguration(
                        "--api-key or OPENAI_API_KEY is required for the openai backend".into(),
                    )
                })?,
                api_base: common.api_base.clone(),
            },
        };
    } else if let Some(base) = &common.api_base {
        match &mut config.backend {
            LlmBackend::Local { api_base } => *api_base = base.clone(),
            LlmBackend::Ollama { endpoint } => *endpoint = base.clone(),
            LlmBackend::OpenAi { api_base, .. } => *api_base = Some(base.clone()),
        }
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<(), BrochureError> {
    let mut config = PipelineConfig::from_env()?;
    apply_common(&mut config, &cli.common)?;

    match cli.command {
        Command::Brochure {
            company,
            url,
            output,
            max_prompt_chars,
            skip_failed_links,
            accept_error_status,
            no_json_mode,
        } => {
            if let Some(company) = company {
                config.company_name = company;
            }
            if let Some(url) = url {
                config.url = url;
            }
            if let Some(output) = output {
                config.output_path = output;
            }
            if let Some(max) = max_prompt_chars {
                config.max_prompt_chars = max;
            }
            if skip_failed_links {
                config.link_failure_policy = LinkFailurePolicy::Skip;
            }
            if accept_error_status {
                config.status_policy = StatusPolicy::Accept;
            }
            if no_json_mode {
                config.brochure_json_mode = false;
            }
            config.validate()?;

            let brochure = BrochurePipeline::from_config(config)
                .run()
                .await
                .map_err(|e| {
                    log_error_card(&e);
                    e
                })?;
            println!("Brochure completed! Saved to {}", brochure.path.display());
        }
        Command::Summarize { url, output } => {
            config.url = url;
            if let Some(output) = output {
                config.summary_path = output;
            }
            config.validate()?;

            let summary = Summarizer::new(config.fetcher(), config.provider(), &config.model)
                .with_max_prompt_chars(config.max_prompt_chars)
                .with_output_path(config.summary_path.clone())
                .summarize(&config.url)
                .await
                .map_err(|e| {
                    log_error_card(&e);
                    e
                })?;
            println!("{}", summary.markdown);
        }
        Command::Ask { question } => {
            let provider = config.provider();
            let reply = ask(provider.as_ref(), &config.model, &question).await?;
            if let Some(thinking) = reply.thinking {
                println!("Thinking process:\n{thinking}\n");
                println!("Final message:\n{}", reply.answer);
            } else {
                println!("Response:\n{}", reply.answer);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = LogConfig {
        file_output: cli.common.log_dir.is_some(),
        log_dir: cli.common.log_dir.clone().unwrap_or_else(|| "logs".into()),
        ..Default::default()
    };
    if let Err(e) = setup_logging(log_config) {
        eprintln!("{e}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn common(backend: Option<BackendArg>, api_base: Option<&str>) -> CommonArgs {
        CommonArgs {
            model: None,
            backend,
            api_key: None,
            api_base: api_base.map(String::from),
            log_dir: None,
        }
    }

    #[test]
    fn test_api_base_without_backend_overrides_configured_backend() {
        let mut config = PipelineConfig::default();
        apply_common(&mut config, &common(None, Some("http://gpu-box:11434/v1"))).unwrap();
        assert_eq!(
            config.backend,
            LlmBackend::Local {
                api_base: "http://gpu-box:11434/v1".into()
            }
        );

        let mut config = PipelineConfig {
            backend: LlmBackend::Ollama {
                endpoint: DEFAULT_OLLAMA_ENDPOINT.into(),
            },
            ..Default::default()
        };
        apply_common(&mut config, &common(None, Some("http://gpu-box:11434"))).unwrap();
        assert_eq!(
            config.backend,
            LlmBackend::Ollama {
                endpoint: "http://gpu-box:11434".into()
            }
        );
    }

    #[test]
    fn test_backend_flag_uses_api_base_or_default() {
        let mut config = PipelineConfig::default();
        apply_common(&mut config, &common(Some(BackendArg::Ollama), None)).unwrap();
        assert_eq!(
            config.backend,
            LlmBackend::Ollama {
                endpoint: DEFAULT_OLLAMA_ENDPOINT.into()
            }
        );

        let mut config = PipelineConfig::default();
        let err = apply_common(&mut config, &common(Some(BackendArg::Openai), None)).unwrap_err();
        assert!(matches!(err, BrochureError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_cli_parses_brochure_flags() {
        let cli = Cli::try_parse_from([
            "site-brochure",
            "brochure",
            "--company",
            "X Corp",
            "--skip-failed-links",
            "--api-base",
            "http://gpu-box:11434/v1",
        ])
        .unwrap();
        assert_eq!(cli.common.api_base.as_deref(), Some("http://gpu-box:11434/v1"));
        match cli.command {
            Command::Brochure {
                company,
                skip_failed_links,
                ..
            } => {
                assert_eq!(company.as_deref(), Some("X Corp"));
                assert!(skip_failed_links);
            }
            _ => panic!("Expected brochure subcommand"),
        }
    }
}
