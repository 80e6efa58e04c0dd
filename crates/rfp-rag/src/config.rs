//! Configuration for the document pipeline and agents

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::agents::AnalysisScope;
use crate::error::{Error, Result};
use crate::ingestion::ChunkPolicy;

/// Environment variable naming a TOML config file
pub const CONFIG_ENV: &str = "RFP_RAG_CONFIG";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Embedding configuration
    #[serde(default)]
    pub embeddings: EmbeddingConfig,
    /// Language-model configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Vector index configuration
    #[serde(default)]
    pub vector_index: VectorIndexConfig,
    /// Specialist agent configuration
    #[serde(default)]
    pub agents: AgentsConfig,
    /// Conversational agent configuration
    #[serde(default)]
    pub conversation: ConversationConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        let config: RagConfig = toml::from_str(&raw)?;
        Ok(config)
    }

    /// Load from `RFP_RAG_CONFIG` when set (defaults otherwise), apply
    /// `RFP_RAG_*` overrides and validate.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => {
                tracing::info!("Loading configuration from {}", PathBuf::from(&path).display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("RFP_RAG_LLM_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("RFP_RAG_LLM_MODEL") {
            self.llm.generate_model = model;
        }
        if let Ok(model) = std::env::var("RFP_RAG_EMBED_MODEL") {
            self.llm.embed_model = model.clone();
            self.embeddings.model = model;
        }
        if let Ok(key) = std::env::var("RFP_RAG_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Ok(path) = std::env::var("RFP_RAG_INDEX_PATH") {
            self.vector_index.storage_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("RFP_RAG_MEMORY_PATH") {
            self.conversation.memory_path = PathBuf::from(path);
        }
    }

    /// Reject configurations that cannot work
    pub fn validate(&self) -> Result<()> {
        self.chunking.policy()?;

        if self.embeddings.dimensions == 0 {
            return Err(Error::config("embeddings.dimensions must be greater than 0"));
        }
        if self.embeddings.batch_size == 0 {
            return Err(Error::config("embeddings.batch_size must be greater than 0"));
        }
        if self.conversation.max_tool_rounds == 0 {
            return Err(Error::config("conversation.max_tool_rounds must be greater than 0"));
        }
        if self.llm.backend == LlmBackend::OpenAi
            && self.llm.api_key.as_deref().map_or(true, str::is_empty)
        {
            return Err(Error::config("llm.api_key is required for the openai backend"));
        }
        Ok(())
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Policy name: fixed, overlapping, sentence or paragraph
    pub policy: String,
    /// Words per chunk for the fixed policy
    pub max_tokens: usize,
    /// Window size for the overlapping policy
    pub chunk_size: usize,
    /// Shared words between consecutive windows
    pub overlap: usize,
    /// Word budget for sentence and paragraph packing
    pub max_words: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            policy: "fixed".to_string(),
            max_tokens: 500,
            chunk_size: 700,
            overlap: 100,
            max_words: 700,
        }
    }
}

impl ChunkingConfig {
    /// Resolve the configured policy
    pub fn policy(&self) -> Result<ChunkPolicy> {
        let policy = match self.policy.to_lowercase().as_str() {
            "fixed" => ChunkPolicy::Fixed {
                max_tokens: self.max_tokens,
            },
            "overlapping" | "overlap" => ChunkPolicy::Overlapping {
                chunk_size: self.chunk_size,
                overlap: self.overlap,
            },
            "sentence" | "sentences" => ChunkPolicy::Sentence {
                max_words: self.max_words,
            },
            "paragraph" | "paragraphs" => ChunkPolicy::Paragraph {
                max_words: self.max_words,
            },
            other => {
                return Err(Error::config(format!("Unknown chunking policy '{}'", other)));
            }
        };
        policy.validate()?;
        Ok(policy)
    }
}

/// Which embedding implementation to use
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Ollama embeddings endpoint
    #[default]
    Ollama,
    /// Offline feature-hashing embedder
    Hashing,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding implementation
    #[serde(default)]
    pub backend: EmbeddingBackend,
    /// Model name
    pub model: String,
    /// Ollama URL for embeddings (defaults to `llm.base_url` on the ollama backend)
    #[serde(default)]
    pub base_url: Option<String>,
    /// Embedding dimensions (768 for nomic-embed-text and all-mpnet-base-v2)
    pub dimensions: usize,
    /// Texts per embedding batch
    pub batch_size: usize,
    /// Batches in flight at once (defaults to CPU count, max 4)
    pub parallel_batches: Option<usize>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Ollama,
            model: "nomic-embed-text".to_string(),
            base_url: None,
            dimensions: 768,
            batch_size: 32,
            parallel_batches: None,
        }
    }
}

impl EmbeddingConfig {
    /// Effective number of concurrent batches
    pub fn parallelism(&self) -> usize {
        self.parallel_batches
            .unwrap_or_else(|| num_cpus::get().min(4))
            .max(1)
    }
}

/// Which chat/generation backend to use
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Local Ollama server
    #[default]
    Ollama,
    /// OpenAI-compatible chat completions (OpenAI, Azure OpenAI)
    #[serde(rename = "openai")]
    OpenAi,
}

/// Language-model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider backend
    #[serde(default)]
    pub backend: LlmBackend,
    /// Base URL (Ollama root, or OpenAI/Azure deployment URL)
    pub base_url: String,
    /// API key (OpenAI backend only)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Azure API version query parameter, when talking to Azure OpenAI
    #[serde(default)]
    pub api_version: Option<String>,
    /// Embedding model name
    pub embed_model: String,
    /// Generation model name
    pub generate_model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Maximum tokens in a completion
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
    /// First backoff delay in milliseconds (doubles per retry)
    pub retry_base_delay_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::Ollama,
            base_url: "http://localhost:11434".to_string(),
            api_key: None,
            api_version: None,
            embed_model: "nomic-embed-text".to_string(),
            generate_model: "llama3.1:8b".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            timeout_secs: 120,
            max_retries: 3,
            retry_base_delay_ms: 1000,
        }
    }
}

/// Vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorIndexConfig {
    /// JSON file holding the persisted index
    pub storage_path: PathBuf,
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            storage_path: data_dir().join("embeddings").join("index.json"),
        }
    }
}

/// Specialist agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentsConfig {
    /// Directory with `<agent>.txt` prompt overrides
    #[serde(default)]
    pub prompts_dir: Option<PathBuf>,
    /// Agents to run, in order (empty = full catalog order)
    #[serde(default)]
    pub order: Vec<String>,
    /// Agents running concurrently (results still stored in order)
    pub parallelism: usize,
    /// What text the agents see
    #[serde(default)]
    pub scope: AnalysisScope,
    /// Where the assembled knowledge document is written
    pub knowledge_path: PathBuf,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            prompts_dir: None,
            order: Vec::new(),
            parallelism: 1,
            scope: AnalysisScope::FirstChunk,
            knowledge_path: PathBuf::from("kb.md"),
        }
    }
}

/// Conversational agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Persistent memory log
    pub memory_path: PathBuf,
    /// Maximum model calls that may request tools before the loop stops
    pub max_tool_rounds: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            memory_path: data_dir().join("memory").join("memory.md"),
            max_tool_rounds: 8,
        }
    }
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rfp-rag")
}
