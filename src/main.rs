//! # kbview CLI Application
//!
//! Command-line front end for querying a knowledge-base retrieval service.
//!
//! ## Subcommands
//!
//! - `browse`: interactive terminal view (type a query, read the hits)
//! - `retrieve`: run one query and print the hits
//! - `files`: list the files of a knowledge base
//!
//! Connection settings come from flags or the `KBVIEW_BASE_URL`,
//! `KBVIEW_TOKEN` and `KBVIEW_LANG` environment variables.

mod telemetry;
mod tui;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use kbview::config::{BASE_URL_ENV, ClientConfig, DEFAULT_BASE_URL, TOKEN_ENV};
use kbview::i18n::{Catalog, LANG_ENV, Locale, Translator, keys};
use kbview::knowledge::{KnowledgeBaseApi, KnowledgeBaseClient};
use kbview::render::{StderrNotifier, print_cards, write_files};
use kbview::view::RetrieveView;
use std::sync::Arc;
use std::time::Duration;
use telemetry::OtelGuard;
use termcolor::{ColorChoice, StandardStream};
use tracing::instrument;

#[derive(Parser)]
#[command(author, version, about = "Query knowledge-base retrieval endpoints from the terminal", long_about = None)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Export traces over OTLP (configured via OTEL_EXPORTER_OTLP_* variables)
    #[arg(long, global = true)]
    otel: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Debug)]
struct ConnectionArgs {
    /// Base URL of the knowledge-base service
    #[arg(long, global = true, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Bearer token for the service
    #[arg(long, global = true, env = TOKEN_ENV, hide_env_values = true)]
    token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value = "120")]
    timeout: u64,

    /// UI language (en-US, zh-Hans, ja-JP)
    #[arg(long, global = true, env = LANG_ENV)]
    lang: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the interactive retrieval view for a knowledge base
    Browse(BrowseArgs),

    /// Run a single retrieval query and print the results
    Retrieve(RetrieveArgs),

    /// List the files of a knowledge base
    Files(FilesArgs),
}

#[derive(Args, Debug)]
struct BrowseArgs {
    /// Knowledge base id
    #[arg(required = true)]
    kb_id: String,
}

#[derive(Args, Debug)]
struct RetrieveArgs {
    /// Knowledge base id
    #[arg(required = true)]
    kb_id: String,

    /// Query text
    #[arg(required = true)]
    query: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Args, Debug)]
struct FilesArgs {
    /// Knowledge base id
    #[arg(required = true)]
    kb_id: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl ConnectionArgs {
    fn client(&self) -> anyhow::Result<KnowledgeBaseClient> {
        let config = ClientConfig::builder()
            .base_url(self.base_url.clone())
            .token(self.token.clone())
            .timeout_secs(self.timeout)
            .build()?;
        Ok(KnowledgeBaseClient::new(config)?)
    }

    fn catalog(&self) -> anyhow::Result<Catalog> {
        match &self.lang {
            Some(lang) => Ok(Catalog::new(lang.parse::<Locale>()?)),
            None => Ok(Catalog::from_env()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The TUI owns the terminal, so it logs to a file instead of stderr
    let _otel: OtelGuard = if matches!(cli.command, Some(Commands::Browse(_))) {
        telemetry::setup_file_logging(&std::env::current_dir()?, cli.otel)?
    } else {
        telemetry::init_tracing_subscriber(cli.otel)?
    };

    match cli.command {
        Some(Commands::Browse(args)) => {
            browse_command(&cli.connection, args).await?;
        }
        Some(Commands::Retrieve(args)) => {
            retrieve_command(&cli.connection, args).await?;
        }
        Some(Commands::Files(args)) => {
            files_command(&cli.connection, args).await?;
        }
        None => {
            // If no command is provided, show help
            let _ = Cli::parse_from(["kbview", "--help"]);
        }
    }

    Ok(())
}

async fn browse_command(connection: &ConnectionArgs, args: BrowseArgs) -> anyhow::Result<()> {
    let api: Arc<dyn KnowledgeBaseApi> = Arc::new(connection.client()?);
    let catalog = connection.catalog()?;
    tui::run(args.kb_id, api, catalog).await?;
    Ok(())
}

fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

#[instrument(skip(connection))]
async fn retrieve_command(connection: &ConnectionArgs, args: RetrieveArgs) -> anyhow::Result<()> {
    let client = connection.client()?;
    let catalog = connection.catalog()?;
    let mut view = RetrieveView::new(args.kb_id);

    // File names are best effort; a failed listing leaves raw ids in the output
    view.load_files_with(&client).await;

    view.set_query(args.query);
    if !view.can_submit() {
        anyhow::bail!("query must not be empty");
    }

    let progress = spinner(catalog.translate(keys::LOADING));
    let mut notifier = StderrNotifier::new();
    view.retrieve_with(&client, &catalog, &mut notifier).await;
    progress.finish_and_clear();

    // Keep a failed retrieval distinguishable from an empty one
    if notifier.raised() > 0 {
        anyhow::bail!("retrieval from knowledge base {} failed", view.kb_id());
    }

    let cards = view.cards();
    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&cards)?);
        }
        OutputFormat::Text => {
            print_cards(&cards, &catalog)?;
        }
    }

    Ok(())
}

#[instrument(skip(connection))]
async fn files_command(connection: &ConnectionArgs, args: FilesArgs) -> anyhow::Result<()> {
    let client = connection.client()?;
    let files = client
        .list_files(&args.kb_id)
        .await
        .with_context(|| format!("failed to list files of knowledge base {}", args.kb_id))?;

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&files)?);
        }
        OutputFormat::Text => {
            let mut stdout = StandardStream::stdout(ColorChoice::Auto);
            write_files(&mut stdout, &files)?;
        }
    }

    Ok(())
}
