//! Command-line front end for the RFP pipeline
//!
//! Run with: cargo run -p rfp-rag --features cli -- <command>

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rfp_rag::config::RagConfig;
use rfp_rag::types::{ConversationMessage, Document};
use rfp_rag::{ConversationalAgent, DocumentPipeline};

#[derive(Parser, Debug)]
#[command(name = "rfp-rag", version)]
#[command(about = "Index RFP documents, extract structured analyses and chat about them")]
struct Cli {
    /// TOML configuration file (overrides RFP_RAG_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chunk, embed and index text documents
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Find the chunks most similar to a query
    Search {
        query: String,
        #[arg(short = 'k', long, default_value_t = 5)]
        top_k: usize,
    },
    /// Run the specialist agents and write the knowledge base
    Analyze {
        file: PathBuf,
        /// Output path (defaults to agents.knowledge_path)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Ask questions about a knowledge base
    Chat {
        /// Knowledge base (defaults to agents.knowledge_path)
        #[arg(long)]
        knowledge: Option<PathBuf>,
    },
    /// Show vector index statistics
    Stats,
    /// Remove every entry from the vector index
    Clear,
}

fn spinner(message: &str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<RagConfig> {
    let config = match path {
        Some(path) => {
            let mut config = RagConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?;
            config.apply_env_overrides();
            config.validate()?;
            config
        }
        None => RagConfig::load()?,
    };

    tracing::info!("Configuration loaded");
    tracing::info!("  - LLM: {:?} {}", config.llm.backend, config.llm.generate_model);
    tracing::info!(
        "  - Embeddings: {:?} {} ({} dims)",
        config.embeddings.backend,
        config.embeddings.model,
        config.embeddings.dimensions
    );
    tracing::info!("  - Index: {}", config.vector_index.storage_path.display());
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rfp_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Ingest { files } => {
            let pipeline = DocumentPipeline::from_config(config)?;
            for file in files {
                let document = Document::from_file(&file)?;
                let pb = spinner(&format!("Embedding {}", document.source_name()))?;
                let result = pipeline.ingest(&document).await;
                pb.finish_and_clear();
                let report = result?;
                println!(
                    "✓ {}: {} chunks indexed in {}ms (index now holds {})",
                    report.filename, report.chunks, report.duration_ms, report.index_size
                );
            }
        }

        Command::Search { query, top_k } => {
            let pipeline = DocumentPipeline::from_config(config)?;
            let hits = pipeline.search(&query, top_k).await?;
            if hits.is_empty() {
                println!("No indexed chunks.");
            }
            for (rank, hit) in hits.iter().enumerate() {
                println!(
                    "\n{}. Score: {:.3}  [{} #{}]",
                    rank + 1,
                    hit.score,
                    hit.entry.metadata.filename.as_deref().unwrap_or("unknown"),
                    hit.entry
                        .metadata
                        .chunk_index
                        .map_or_else(|| "-".to_string(), |i| i.to_string())
                );
                println!("   {}", hit.entry.text);
            }
        }

        Command::Analyze { file, out } => {
            let out = out.unwrap_or_else(|| config.agents.knowledge_path.clone());
            let pipeline = DocumentPipeline::from_config(config)?;
            let document = Document::from_file(&file)?;

            let pb = spinner(&format!("Analysing {}", document.source_name()))?;
            let result = pipeline.analyze(&document).await;
            pb.finish_and_clear();
            let analysis = result?;

            for result in analysis.report.results() {
                let mark = if result.is_success() { "✓" } else { "✗" };
                println!("{} {}", mark, result.agent_name);
            }
            analysis.knowledge.write_to(&out)?;
            println!("\nResults saved to {}", out.display());
        }

        Command::Chat { knowledge } => {
            let knowledge_path = knowledge.unwrap_or_else(|| config.agents.knowledge_path.clone());
            let llm = rfp_rag::providers::build_llm(&config)?;
            let mut agent =
                ConversationalAgent::from_config(llm, &config.conversation, &knowledge_path)?;

            println!(
                "Loaded {} sections from {}. Type 'exit' to quit.",
                agent.knowledge().len(),
                knowledge_path.display()
            );

            let mut history: Vec<ConversationMessage> = Vec::new();
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            let mut stdout = tokio::io::stdout();

            loop {
                stdout.write_all(b"\nYou: ").await?;
                stdout.flush().await?;

                let Some(line) = lines.next_line().await? else {
                    break;
                };
                let question = line.trim();
                if question.is_empty() {
                    continue;
                }
                if matches!(question, "exit" | "quit") {
                    break;
                }

                let pb = spinner("Thinking")?;
                let result = agent.chat(question, &history).await;
                pb.finish_and_clear();

                match result {
                    Ok(reply) => {
                        println!("\nAssistant: {}", reply.answer);
                        if reply.truncated {
                            println!("(stopped after {} tool rounds)", reply.rounds);
                        }
                        history = reply.transcript;
                    }
                    Err(e) => eprintln!("\nError: {}", e),
                }
            }
        }

        Command::Stats => {
            let pipeline = DocumentPipeline::from_config(config)?;
            println!("{}", serde_json::to_string_pretty(&pipeline.index().stats())?);
        }

        Command::Clear => {
            let pipeline = DocumentPipeline::from_config(config)?;
            pipeline.clear_index().await?;
            println!("Vector index cleared.");
        }
    }

    Ok(())
}
