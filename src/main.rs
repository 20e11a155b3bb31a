//! AgroAssist - CLI entry point
//!
//! Thin front door around the pipeline: load config, wire the services,
//! run one question, print the answer. The HTTP and webhook surfaces live
//! outside this crate and consume the same `Pipeline::run` entry point.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use agroassist::config::Settings;
use agroassist::embedding::dense::BedrockEmbeddingClient;
use agroassist::embedding::HybridQueryEmbedder;
use agroassist::generation::{GenerationParams, LlmService};
use agroassist::pipeline::Pipeline;
use agroassist::retrieval::QdrantRetriever;

/// AgroAssist - agronomy questions answered from your own knowledge base
#[derive(Parser, Debug)]
#[command(name = "agroassist")]
#[command(version)]
#[command(about = "Hybrid-retrieval RAG assistant for agronomy questions", long_about = None)]
struct Args {
    /// The question to answer
    #[arg(value_name = "QUESTION")]
    question: String,

    /// Configuration file path (defaults to ~/.agroassist/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Metadata filters as JSON, e.g. '{"crop": "soja"}'
    #[arg(short, long)]
    filters: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agroassist=info".into()),
        )
        .init();

    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    let filters = args
        .filters
        .as_deref()
        .map(serde_json::from_str::<serde_json::Map<String, serde_json::Value>>)
        .transpose()
        .context("--filters must be a JSON object")?;

    let embedder = Arc::new(HybridQueryEmbedder::new(
        Arc::new(BedrockEmbeddingClient::new(&settings)?),
        &settings,
    ));
    let retriever = Arc::new(QdrantRetriever::new(&settings)?);
    let generator = Arc::new(LlmService::new(&settings)?);

    let pipeline = Pipeline::new(
        embedder,
        retriever,
        generator,
        GenerationParams::from_settings(&settings),
        settings.retrieval_limit,
    );

    let state = pipeline.run(args.question, filters).await;

    match state.response {
        Some(response) => println!("{}", response),
        None => println!("Desculpe, não foi possível gerar uma resposta."),
    }

    Ok(())
}
