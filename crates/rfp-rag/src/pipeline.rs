//! End-to-end document pipeline: chunk, embed, index, search and analyse

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::agents::{
    AgentCatalog, AnalysisScope, ExtractionOrchestrator, KnowledgeDocument, OrchestrationReport,
};
use crate::config::RagConfig;
use crate::embeddings::embed_in_batches;
use crate::error::{Error, Result};
use crate::ingestion::TextChunker;
use crate::providers::{self, EmbeddingProvider, LlmProvider};
use crate::retrieval::{IndexEntry, IndexMetadata, ScoredEntry, VectorIndex};
use crate::types::Document;

/// Summary of one ingestion
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub document_id: Uuid,
    pub filename: String,
    pub chunks: usize,
    /// Index size after ingestion
    pub index_size: usize,
    pub duration_ms: u64,
}

/// Result of running the specialist agents on a document
#[derive(Debug, Clone)]
pub struct Analysis {
    pub report: OrchestrationReport,
    pub knowledge: KnowledgeDocument,
}

/// Wires the chunker, embedder, vector index and agents together
pub struct DocumentPipeline {
    config: RagConfig,
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    index: Arc<VectorIndex>,
    catalog: AgentCatalog,
}

impl DocumentPipeline {
    /// Build from explicit collaborators
    pub fn new(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        index: VectorIndex,
    ) -> Result<Self> {
        config.validate()?;
        let chunker = TextChunker::new(config.chunking.policy()?)?;

        let catalog = match &config.agents.prompts_dir {
            Some(dir) => AgentCatalog::builtin().with_prompts_dir(dir)?,
            None => AgentCatalog::builtin(),
        };
        // Fail on unknown agent names now rather than mid-analysis
        catalog.select(&config.agents.order)?;

        if let Some(dimension) = index.dimension() {
            if dimension != embedder.dimensions() {
                return Err(Error::DimensionMismatch {
                    expected: dimension,
                    actual: embedder.dimensions(),
                });
            }
        }

        Ok(Self {
            config,
            chunker,
            embedder,
            llm,
            index: Arc::new(index),
            catalog,
        })
    }

    /// Build providers and open the index named by `config`
    pub fn from_config(config: RagConfig) -> Result<Self> {
        let embedder = providers::build_embedder(&config)?;
        let llm = providers::build_llm(&config)?;
        let index = VectorIndex::open(&config.vector_index.storage_path)?;
        Self::new(config, embedder, llm, index)
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn llm(&self) -> Arc<dyn LlmProvider> {
        Arc::clone(&self.llm)
    }

    pub fn catalog(&self) -> &AgentCatalog {
        &self.catalog
    }

    /// Chunk, embed and append a document to the index
    pub async fn ingest(&self, document: &Document) -> Result<IngestReport> {
        let started = Instant::now();
        let filename = document.source_name().to_string();

        let chunks = self.chunker.chunk(document.text());
        tracing::info!("Ingesting {}: {} chunks", filename, chunks.len());

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embed_in_batches(
            self.embedder.as_ref(),
            &texts,
            self.config.embeddings.batch_size,
            self.config.embeddings.parallelism(),
        )
        .await?;

        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| {
                let mut metadata = IndexMetadata::for_chunk(filename.clone(), chunk.index);
                metadata
                    .extra
                    .insert("document_id".to_string(), document.id.to_string().into());
                IndexEntry {
                    text: chunk.text,
                    vector,
                    metadata,
                }
            })
            .collect();
        let added = entries.len();

        let index = Arc::clone(&self.index);
        let index_size = tokio::task::spawn_blocking(move || {
            index.extend(entries)?;
            Ok::<_, Error>(index.len())
        })
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

        let duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!("Indexed {} chunks from {} in {}ms", added, filename, duration_ms);

        Ok(IngestReport {
            document_id: document.id,
            filename,
            chunks: added,
            index_size,
            duration_ms,
        })
    }

    /// Most similar chunks for `query`
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<ScoredEntry>> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }
        let vector = self.embedder.embed(query).await?;

        let index = Arc::clone(&self.index);
        tokio::task::spawn_blocking(move || index.search(&vector, top_k))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }

    /// Run the configured agents over the document
    pub async fn analyze(&self, document: &Document) -> Result<Analysis> {
        let text = match self.config.agents.scope {
            AnalysisScope::FirstChunk => self
                .chunker
                .chunk(document.text())
                .into_iter()
                .next()
                .map(|chunk| chunk.text),
            AnalysisScope::FullText => Some(document.text().trim().to_string()).filter(|t| !t.is_empty()),
        }
        .ok_or_else(|| {
            Error::InvalidInput(format!("document {} has no text to analyse", document.source_name()))
        })?;

        let specs = self.catalog.select(&self.config.agents.order)?;
        let agents = ExtractionOrchestrator::agents_for(specs, Arc::clone(&self.llm));
        tracing::info!(
            "Analysing {} ({:?}, {} chars) with {} agents",
            document.source_name(),
            self.config.agents.scope,
            text.len(),
            agents.len()
        );

        let report = ExtractionOrchestrator::new()
            .with_parallelism(self.config.agents.parallelism)
            .run(&text, &agents)
            .await;
        let knowledge = KnowledgeDocument::from_results(&report);

        Ok(Analysis { report, knowledge })
    }

    /// Remove every indexed chunk
    pub async fn clear_index(&self) -> Result<()> {
        let index = Arc::clone(&self.index);
        tokio::task::spawn_blocking(move || index.clear())
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentStatus;
    use crate::config::EmbeddingBackend;
    use crate::embeddings::HashingEmbedder;
    use crate::providers::mock::ScriptedLlm;
    use tempfile::TempDir;

    const RFP: &str = "The city requests a new permit portal. The budget is fixed at 500,000 dollars. \
        Citizens currently submit paper forms and wait weeks for approval. \
        The vendor must integrate with the existing payment gateway.";

    fn config(dir: &TempDir) -> RagConfig {
        let mut config = RagConfig::default();
        config.embeddings.backend = EmbeddingBackend::Hashing;
        config.embeddings.dimensions = 128;
        config.embeddings.batch_size = 2;
        config.chunking.max_tokens = 10;
        config.vector_index.storage_path = dir.path().join("index.json");
        config.agents.order = vec!["challenges".to_string(), "constraints".to_string()];
        config
    }

    fn pipeline(config: RagConfig, llm: Arc<ScriptedLlm>) -> DocumentPipeline {
        let embedder = Arc::new(HashingEmbedder::new(config.embeddings.dimensions).unwrap());
        let index = VectorIndex::open(&config.vector_index.storage_path).unwrap();
        DocumentPipeline::new(config, embedder, llm, index).unwrap()
    }

    #[tokio::test]
    async fn test_ingest_and_search() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(config(&dir), Arc::new(ScriptedLlm::new()));
        let document = Document::new(RFP, Some("permits.txt".to_string()));

        let report = pipeline.ingest(&document).await.unwrap();
        assert_eq!(report.chunks, 4);
        assert_eq!(report.index_size, 4);

        let hits = pipeline.search("payment gateway integration", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].entry.text.contains("payment gateway"));
        assert_eq!(hits[0].entry.metadata.filename.as_deref(), Some("permits.txt"));
        assert_eq!(hits[0].entry.metadata.chunk_index, Some(3));

        // Persisted and reloadable
        assert_eq!(VectorIndex::open(dir.path().join("index.json")).unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_search_empty_index() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(config(&dir), Arc::new(ScriptedLlm::new()));
        assert!(pipeline.search("anything", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_analyze_first_chunk() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(ScriptedLlm::new().on_generate(|prompt| {
            if prompt.contains("constraints stated") {
                Err(Error::llm("HTTP 500"))
            } else {
                Ok("- Paper forms".to_string())
            }
        }));
        let pipeline = pipeline(config(&dir), llm.clone());
        let document = Document::new(RFP, None);

        let analysis = pipeline.analyze(&document).await.unwrap();
        assert_eq!(analysis.report.len(), 2);
        assert!(analysis.report.get("challenges").unwrap().is_success());
        assert!(matches!(
            analysis.report.get("constraints").unwrap().status,
            AgentStatus::Failed { .. }
        ));

        // Only the first 10-word chunk reaches the agents
        let prompts = llm.prompts();
        assert!(prompts[0].ends_with("The city requests a new permit portal. The budget is\n"));
        assert!(analysis.knowledge.as_str().starts_with("## CHALLENGES\n- Paper forms\n\n## CONSTRAINTS\n"));
    }

    #[tokio::test]
    async fn test_analyze_empty_document() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(config(&dir), Arc::new(ScriptedLlm::new()));
        assert!(matches!(
            pipeline.analyze(&Document::new("   ", None)).await,
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_unknown_agent_rejected_at_build() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir);
        config.agents.order = vec!["pricing".to_string()];
        let embedder = Arc::new(HashingEmbedder::new(128).unwrap());
        let result = DocumentPipeline::new(config, embedder, Arc::new(ScriptedLlm::new()), VectorIndex::in_memory());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_clear_index() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(config(&dir), Arc::new(ScriptedLlm::new()));
        pipeline.ingest(&Document::new(RFP, None)).await.unwrap();
        pipeline.clear_index().await.unwrap();
        assert!(pipeline.index().is_empty());
    }
}
