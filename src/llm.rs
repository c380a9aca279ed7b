//! Abstracción sobre Rig para calcular embeddings de los documentos.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rig::embeddings::EmbeddingModel as _; // <- para .embed_texts
use tracing::{debug, info};

use crate::models::{EmbeddedDocument, LoadedDocument};

/// Textos por petición de embeddings. OpenAI admite como mucho 1024 por llamada.
pub const EMBEDDING_BATCH_SIZE: usize = 1000;

/// Servicio capaz de convertir textos en vectores.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Un vector por texto, en el mismo orden.
    async fn embed_texts(&self, texts: Vec<String>) -> Result<Vec<Vec<f64>>>;

    /// Máximo de textos que acepta `embed_texts` en una sola llamada.
    fn batch_size(&self) -> usize {
        EMBEDDING_BATCH_SIZE
    }
}

/// Embeddings vía la API de OpenAI.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    api_key: String,
    model: String,
}

impl OpenAiEmbedder {
    /// Falla sin tocar la red si la credencial no está disponible.
    pub fn new(api_key: Option<&str>, model: &str) -> Result<Self> {
        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| anyhow!("Falta OPENAI_API_KEY en el entorno"))?;

        let model = if model.is_empty() {
            rig::providers::openai::TEXT_EMBEDDING_3_SMALL
        } else {
            model
        };

        Ok(Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed_texts(&self, texts: Vec<String>) -> Result<Vec<Vec<f64>>> {
        use rig::providers::openai;
        // Trait para client.embedding_model(...)
        use rig::client::EmbeddingsClient as _;

        let client = openai::Client::new(&self.api_key);
        let embedding_model = client.embedding_model(&self.model);
        let embeddings = embedding_model.embed_texts(texts).await?;
        Ok(embeddings.into_iter().map(|e| e.vec).collect())
    }
}

/// Calcula los embeddings de todos los documentos, en lotes de `batch_size()`.
pub async fn embed_documents(
    embedder: &dyn Embedder,
    documents: &[LoadedDocument],
) -> Result<Vec<EmbeddedDocument>> {
    if documents.is_empty() {
        return Ok(Vec::new());
    }

    let batch_size = embedder.batch_size().max(1);
    let mut vectors = Vec::with_capacity(documents.len());
    for (batch_idx, batch) in documents.chunks(batch_size).enumerate() {
        let texts: Vec<String> = batch.iter().map(|d| d.text.clone()).collect();
        debug!("Lote de embeddings {} ({} textos)", batch_idx, texts.len());
        vectors.extend(embedder.embed_texts(texts).await?);
    }

    if vectors.len() != documents.len() {
        return Err(anyhow!(
            "Número de embeddings ({}) distinto al número de documentos ({})",
            vectors.len(),
            documents.len()
        ));
    }
    info!("{} embeddings calculados", vectors.len());

    Ok(documents
        .iter()
        .zip(vectors)
        .map(|(doc, vector)| EmbeddedDocument {
            text: doc.text.clone(),
            source: doc.source.clone(),
            vector,
        })
        .collect())
}
