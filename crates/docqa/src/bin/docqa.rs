//! docqa command-line front-end
//!
//! Run with: cargo run -p docqa --features cli --bin docqa -- --question "..."

use clap::Parser;
use console::style;
use docqa::{
    AskRequest, CancellationToken, DocQaConfig, DocumentSource, Outcome, Pipeline,
    SubmissionStrategy,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "docqa",
    version,
    about = "Ask a question about a document using Google Gemini"
)]
struct Cli {
    /// Document to ask about (defaults to the configured document)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// The question
    #[arg(short, long)]
    question: String,

    /// Gemini API key
    #[arg(short = 'k', long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// How the document reaches the model (inline or handle)
    #[arg(short, long)]
    strategy: Option<SubmissionStrategy>,

    /// TOML configuration file
    #[arg(short, long, env = "DOCQA_CONFIG")]
    config: Option<PathBuf>,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "docqa=debug" } else { "docqa=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = DocQaConfig::load(cli.config.as_deref())?;
    let pipeline = Pipeline::from_config(&config)?;

    let source = match cli.file {
        Some(path) => DocumentSource::Path {
            path,
            mime_type: None,
        },
        None => match config.document.default_path.clone() {
            Some(path) => DocumentSource::Path {
                path,
                mime_type: config.document.default_mime_type.clone(),
            },
            None => anyhow::bail!("No --file given and no default document configured"),
        },
    };

    let mut request = AskRequest::new(source, cli.question);
    if let Some(key) = cli.api_key {
        request = request.with_credential(key);
    }
    if let Some(strategy) = cli.strategy {
        request = request.with_strategy(strategy);
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg} [{elapsed}]")?,
    );
    spinner.enable_steady_tick(Duration::from_millis(80));

    let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel();
    let progress = spinner.clone();
    let reporter = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            progress.set_message(event.stage.label());
        }
    });

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let outcome = pipeline.run(request, Some(events_tx), cancel).await;
    let _ = reporter.await;
    spinner.finish_and_clear();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        match &outcome {
            Outcome::Done { answer } => {
                println!("{}", answer);
                if !answer.is_found() {
                    eprintln!("{}", style("[the model returned no candidates]").dim());
                }
            }
            Outcome::Failed { stage, error } => {
                eprintln!(
                    "{} {} at {}: {}",
                    style("error:").red().bold(),
                    error.kind(),
                    style(stage).yellow(),
                    error
                );
            }
        }
    }

    Ok(if outcome.is_done() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
