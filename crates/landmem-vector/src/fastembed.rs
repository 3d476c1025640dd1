//! FastEmbed embedding provider.
//!
//! Runs a local ONNX sentence-embedding model through the `fastembed` crate.
//! The model is not `Sync`, so it lives behind `Arc<Mutex<>>` and every call
//! runs on the blocking pool via `tokio::task::spawn_blocking`.
//!
//! # Feature Gate
//!
//! This module requires the `embed-fastembed` feature.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use landmem_core::{Error, Result};

use crate::embedding::EmbeddingProvider;

/// Map a model name to a fastembed `EmbeddingModel`.
fn resolve_model(name: &str) -> Result<fastembed::EmbeddingModel> {
    match name.to_ascii_lowercase().as_str() {
        "bge-small-en-v1.5" | "bgesmallenv15" => Ok(fastembed::EmbeddingModel::BGESmallENV15),
        "all-minilm-l6-v2" | "allminilml6v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
        "bge-base-en-v1.5" | "bgebaseenv15" => Ok(fastembed::EmbeddingModel::BGEBaseENV15),
        _ => Err(Error::config(format!(
            "Unknown embedding model: '{name}'. Supported: bge-small-en-v1.5, all-minilm-l6-v2, bge-base-en-v1.5"
        ))),
    }
}

/// Truncate long inputs in error contexts.
fn preview(text: &str) -> String {
    const MAX: usize = 80;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// FastEmbed-based embedding provider.
pub struct FastEmbedProvider {
    model: Arc<Mutex<fastembed::TextEmbedding>>,
    dimension: usize,
    model_name: String,
}

impl FastEmbedProvider {
    /// Load `model_name`, downloading it into `cache_path` if needed.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown model, and an embedding
    /// error when the model cannot be loaded or probed.
    pub fn new(model_name: &str, cache_path: Option<&str>) -> Result<Self> {
        let model_enum = resolve_model(model_name)?;

        let mut init = fastembed::InitOptions::new(model_enum);
        if let Some(path) = cache_path {
            init = init.with_cache_dir(std::path::PathBuf::from(path));
        }

        let mut text_embedding = fastembed::TextEmbedding::try_new(init).map_err(|e| {
            Error::embedding(model_name, format!("failed to initialize model: {e}"))
        })?;

        let probe = text_embedding
            .embed(vec!["dimension probe"], None)
            .map_err(|e| Error::embedding(model_name, format!("dimension probe failed: {e}")))?;
        let dimension = probe
            .first()
            .map(Vec::len)
            .ok_or_else(|| Error::embedding(model_name, "empty probe embedding"))?;

        log::info!("Loaded fastembed model {model_name} ({dimension} dimensions)");
        Ok(Self {
            model: Arc::new(Mutex::new(text_embedding)),
            dimension,
            model_name: model_name.to_string(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let model = Arc::clone(&self.model);
        let owned = text.to_string();

        let result = tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|e| format!("model mutex poisoned: {e}"))?;
            model
                .embed(vec![owned], None)
                .map_err(|e| e.to_string())?
                .into_iter()
                .next()
                .ok_or_else(|| "no embedding returned".to_string())
        })
        .await
        .map_err(|e| Error::embedding(preview(text), format!("embedding task failed: {e}")))?;

        result.map_err(|message| Error::embedding(preview(text), message))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let model = Arc::clone(&self.model);
        let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        let context = format!("batch of {} texts", texts.len());

        let result = tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|e| format!("model mutex poisoned: {e}"))?;
            model.embed(owned, None).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| Error::embedding(&context, format!("embedding task failed: {e}")))?;

        result.map_err(|message| Error::embedding(context, message))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

impl std::fmt::Debug for FastEmbedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedProvider")
            .field("model", &self.model_name)
            .field("dimension", &self.dimension)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
