//! Studio Site CLI
//!
//! Commands: validate, render
//! Diagnostics go to stderr
//! Returns non-zero on validation failure

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use url::Url;

use studiosite_core::{
    validate, ContentLoader, Document, FileFetcher, HomePage, SchemaMetadata, SiteConfig, SiteError,
};

#[derive(Parser)]
#[command(name = "studiosite-cli", version = studiosite_core::ENGINE_VERSION)]
#[command(about = "Studio Site CLI - content validation and render preview")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log filter (e.g. warn, info, studiosite_core=debug)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the content document against the schema rules
    Validate {
        /// Content document
        #[arg(long, default_value = "assets/data/site-content.json")]
        content: PathBuf,

        /// Schema metadata file
        #[arg(long, default_value = "assets/data/site-content.schema.json")]
        schema: PathBuf,

        /// Also print the validation result as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Render the homepage with the current content and print the HTML
    Render {
        /// Directory the content URL is resolved against
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Site configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Address the page is served from
        #[arg(long, default_value = "https://hutech.studio/")]
        page_url: String,
    },
}

fn read_json(path: &Path) -> Result<serde_json::Value, SiteError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn run_validate(content: &Path, schema: &Path, json: bool) -> ExitCode {
    let content_value = match read_json(content) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Invalid JSON in {}: {}", content.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let schema_value = match read_json(schema) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Invalid JSON in {}: {}", schema.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = SchemaMetadata::check(&schema_value) {
        eprintln!("{}. Ensure {} is present and valid.", e, schema.display());
        return ExitCode::FAILURE;
    }

    let result = validate(&content_value);

    if json {
        match serde_json::to_string_pretty(&result) {
            Ok(out) => println!("{}", out),
            Err(e) => eprintln!("Failed to serialize result: {}", e),
        }
    }

    if let Err(e) = result.ensure_valid() {
        eprintln!("Content validation failed:");
        for line in result.numbered() {
            eprintln!("{}", line);
        }
        tracing::debug!(error = %e, "validation gate closed");
        return ExitCode::FAILURE;
    }

    if !json {
        println!("Content validation passed.");
    }
    ExitCode::SUCCESS
}

async fn run_render(root: PathBuf, config: Option<PathBuf>, page_url: &str) -> ExitCode {
    let config = match config {
        Some(path) => match SiteConfig::from_file(&path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => SiteConfig::default(),
    };

    let page_url = match Url::parse(page_url) {
        Ok(u) => u,
        Err(e) => {
            eprintln!("{}", SiteError::MalformedUrl(format!("{}: {}", page_url, e)));
            return ExitCode::FAILURE;
        }
    };

    let loader = ContentLoader::new(FileFetcher::new(root), config.content_url.clone());
    let mut page = HomePage::new(Document::home_skeleton(), config, page_url, None, 800.0);
    page.start(&loader, "").await;

    println!("{}", page.dom().to_html());
    ExitCode::SUCCESS
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Validate { content, schema, json } => run_validate(&content, &schema, json),
        Commands::Render { root, config, page_url } => run_render(root, config, &page_url).await,
    }
}
