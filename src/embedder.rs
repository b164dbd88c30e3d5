//! Text-embedding model interface and the fastembed-backed implementation.
//!
//! The catalogue engine only depends on the `Embedder` trait; tests inject
//! a deterministic double, production wires in `FastembedEmbedder`.

use fastembed::{InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::{mpsc, Mutex};
use std::time::Duration;

/// Default download timeout for model files (5 minutes)
const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Maps a string to a fixed-length vector. Deterministic for identical
/// input; the model identity is fixed at process start.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError>;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EmbedderError {
    #[error("model initialization failed: {0}")]
    InitFailed(String),

    #[error("embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("model download timed out after {0} seconds")]
    DownloadTimeout(u64),

    #[error("invalid model name: {0}")]
    InvalidModel(String),
}

/// Wrapper around fastembed's TextEmbedding model.
/// Uses a Mutex because fastembed's embed() requires &mut self.
pub struct FastembedEmbedder {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimensions: usize,
}

impl FastembedEmbedder {
    /// Create a new embedder with the given model name.
    ///
    /// The model is downloaded on first use if not cached; downloads are
    /// cached in the `models/` subdirectory of `cache_dir`. Initialization
    /// gives up after `download_timeout` (default 5 minutes) so a hung
    /// download cannot block startup forever.
    pub fn new(
        model_name: &str,
        cache_dir: PathBuf,
        download_timeout: Option<Duration>,
    ) -> Result<Self, EmbedderError> {
        let model_enum = Self::parse_model_name(model_name)?;
        let timeout = download_timeout.unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT);

        let models_dir = cache_dir.join("models");
        std::fs::create_dir_all(&models_dir).map_err(|e| {
            EmbedderError::InitFailed(format!("failed to create models directory: {}", e))
        })?;

        let options = InitOptions::new(model_enum)
            .with_cache_dir(models_dir)
            .with_show_download_progress(true);

        let mut model = run_with_timeout(timeout, move || TextEmbedding::try_new(options))
            .ok_or(EmbedderError::DownloadTimeout(timeout.as_secs()))?
            .map_err(|e| EmbedderError::InitFailed(e.to_string()))?;

        let dimensions = Self::probe_dimensions(&mut model)?;

        Ok(Self {
            model: Mutex::new(model),
            model_name: model_name.to_string(),
            dimensions,
        })
    }

    pub fn name(&self) -> &str {
        &self.model_name
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn parse_model_name(name: &str) -> Result<fastembed::EmbeddingModel, EmbedderError> {
        match name.to_lowercase().as_str() {
            "all-minilm-l6-v2" | "allminiml6v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
            "all-minilm-l6-v2-q" | "allminiml6v2q" => {
                Ok(fastembed::EmbeddingModel::AllMiniLML6V2Q)
            }
            "bge-small-en-v1.5" | "bgesmallenv15" => {
                Ok(fastembed::EmbeddingModel::BGESmallENV15)
            }
            "bge-small-en-v1.5-q" | "bgesmallenv15q" => {
                Ok(fastembed::EmbeddingModel::BGESmallENV15Q)
            }
            "bge-base-en-v1.5" | "bgebaseenv15" => Ok(fastembed::EmbeddingModel::BGEBaseENV15),
            "bge-base-en-v1.5-q" | "bgebaseenv15q" => {
                Ok(fastembed::EmbeddingModel::BGEBaseENV15Q)
            }
            _ => Err(EmbedderError::InvalidModel(format!(
                "unknown model: {}. Supported models: all-MiniLM-L6-v2, bge-small-en-v1.5, bge-base-en-v1.5 (add -q suffix for quantized)",
                name
            ))),
        }
    }

    /// Probe the model to determine embedding dimensions.
    fn probe_dimensions(model: &mut TextEmbedding) -> Result<usize, EmbedderError> {
        let test_embeddings = model
            .embed(vec!["test"], None)
            .map_err(|e| EmbedderError::InitFailed(format!("failed to probe dimensions: {}", e)))?;

        test_embeddings
            .first()
            .map(|v| v.len())
            .ok_or_else(|| EmbedderError::InitFailed("model returned no embedding".to_string()))
    }
}

/// Run `task` on a worker thread and wait for its result at most `timeout`.
/// A wait that expires abandons the worker thread.
fn run_with_timeout<T: Send + 'static>(
    timeout: Duration,
    task: impl FnOnce() -> T + Send + 'static,
) -> Option<T> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let _ = tx.send(task());
    });
    rx.recv_timeout(timeout).ok()
}

impl Embedder for FastembedEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let mut model = self.model.lock().map_err(|e| {
            EmbedderError::EmbeddingFailed(format!("failed to acquire model lock: {}", e))
        })?;

        let embeddings = model
            .embed(vec![text], None)
            .map_err(|e| EmbedderError::EmbeddingFailed(e.to_string()))?;

        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbedderError::EmbeddingFailed("no embedding returned".to_string()))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut model = self.model.lock().map_err(|e| {
            EmbedderError::EmbeddingFailed(format!("failed to acquire model lock: {}", e))
        })?;

        model
            .embed(texts.to_vec(), None)
            .map_err(|e| EmbedderError::EmbeddingFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_with_timeout_returns_fast_results() {
        assert_eq!(run_with_timeout(Duration::from_secs(5), || 42), Some(42));
    }

    #[test]
    fn test_run_with_timeout_gives_up_on_slow_work() {
        let result = run_with_timeout(Duration::from_millis(20), || {
            std::thread::sleep(Duration::from_secs(2));
            42
        });
        assert_eq!(result, None);
    }

    #[test]
    fn test_invalid_model_name() {
        let temp_dir = std::env::temp_dir().join("plumbot-embed-invalid");
        let result = FastembedEmbedder::new("nonexistent-model", temp_dir, None);
        assert!(matches!(result, Err(EmbedderError::InvalidModel(_))));
    }

    // Integration tests require model download - run with --ignored
    #[test]
    #[ignore = "requires model download"]
    fn test_embedding_generation() {
        let temp_dir = std::env::temp_dir().join("plumbot-embed-test");
        let embedder = FastembedEmbedder::new("all-MiniLM-L6-v2", temp_dir.clone(), None).unwrap();

        assert_eq!(embedder.dimensions(), 384);

        let embedding = embedder.embed("110 mm elbow").unwrap();
        assert_eq!(embedding.len(), 384);

        let batch = embedder
            .embed_batch(&["bend".to_string(), "solvent".to_string()])
            .unwrap();
        assert_eq!(batch.len(), 2);

        let _ = std::fs::remove_dir_all(&temp_dir);
    }
}
