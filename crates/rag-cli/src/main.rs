//! RAG CLI - Command-line interface for windowed retrieval.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use ulid::Ulid;

use rag_core::{
    EmbedderHandle, LimitMode, RagConfig, RagError, Result, RetrievalOptions, RetrievalQuery,
    RetrievalResult, Retriever,
};
use rag_retrieval::WindowRetriever;
use rag_store::MemoryStore;

/// RAG - Retrieve ranked documents and generator context from a corpus
#[derive(Parser)]
#[command(name = "rag")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (default: <config dir>/rag-retrieval/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Retrieve documents and context for a query
    Retrieve(RetrieveArgs),

    /// Show the retriever's tunable options
    Options,
}

#[derive(Args)]
struct RetrieveArgs {
    /// Query text
    query: String,

    /// JSON corpus file to search
    #[arg(long)]
    corpus: PathBuf,

    /// Query embedding, comma separated
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    vector: Vec<f32>,

    /// Limit mode (autocut or fixed)
    #[arg(long)]
    limit_mode: Option<LimitMode>,

    /// Autocut sensitivity or fixed result count
    #[arg(long, allow_negative_numbers = true)]
    limit: Option<i64>,

    /// Neighbouring chunks per side of a relevant chunk (0-10)
    #[arg(long, allow_negative_numbers = true)]
    window: Option<i64>,

    /// Relevance threshold in percent for window expansion (0-100)
    #[arg(long, allow_negative_numbers = true)]
    threshold: Option<i64>,

    /// Concurrent per-document store requests
    #[arg(long)]
    concurrency: Option<usize>,

    /// Only documents with this label (repeatable)
    #[arg(long = "label")]
    labels: Vec<String>,

    /// Only this document (repeatable)
    #[arg(long = "document")]
    documents: Vec<Ulid>,

    /// Name of the embedder that produced the vector
    #[arg(long, default_value = "unspecified")]
    embedder: String,

    /// Abort if retrieval takes longer than this
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Print the full result as JSON instead of the context
    #[arg(long)]
    json: bool,
}

impl RetrieveArgs {
    /// Override configured options with the flags given on the command line.
    fn apply(&self, options: &mut RetrievalOptions) {
        if let Some(limit_mode) = self.limit_mode {
            options.limit_mode = limit_mode;
        }
        if let Some(limit) = self.limit {
            options.limit = limit;
        }
        if let Some(window) = self.window {
            options.chunk_window = window;
        }
        if let Some(threshold) = self.threshold {
            options.threshold = threshold;
        }
        if let Some(concurrency) = self.concurrency {
            options.fetch_concurrency = concurrency;
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => RagConfig::load(path)?,
        None => RagConfig::load_default()?,
    };

    match cli.command {
        Commands::Retrieve(args) => retrieve(args, config.retrieval).await?,
        Commands::Options => show_options(config.retrieval)?,
    }

    Ok(())
}

async fn retrieve(args: RetrieveArgs, mut options: RetrievalOptions) -> Result<()> {
    args.apply(&mut options);
    let config = options.validate();

    let store = MemoryStore::load(&args.corpus)?;

    let mut query = RetrievalQuery::new(args.query, args.vector);
    if !args.labels.is_empty() {
        query = query.with_labels(args.labels);
    }
    if !args.documents.is_empty() {
        query = query.with_document_filter(args.documents);
    }

    let retriever = WindowRetriever::with_defaults(options);
    let embedder = EmbedderHandle::new(args.embedder);

    let call = retriever.retrieve(&query, &config, &store, &embedder);
    let result = with_timeout(call, args.timeout_ms).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", result.context);
    }

    Ok(())
}

/// Await a retrieval call, dropping it if it runs past `timeout_ms`.
async fn with_timeout<F>(call: F, timeout_ms: Option<u64>) -> Result<RetrievalResult>
where
    F: Future<Output = Result<RetrievalResult>>,
{
    match timeout_ms {
        Some(millis) => tokio::time::timeout(Duration::from_millis(millis), call)
            .await
            .map_err(|_| RagError::Timeout { millis })?,
        None => call.await,
    }
}

fn show_options(options: RetrievalOptions) -> Result<()> {
    let retriever = WindowRetriever::with_defaults(options);

    println!("{}: {}", retriever.name(), retriever.description());
    println!("{}", serde_json::to_string_pretty(&retriever.options())?);

    Ok(())
}
