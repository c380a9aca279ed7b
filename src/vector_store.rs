//! Vector stores donde se indexan los documentos de nodos.
//!
//! API pública:
//!   - trait `VectorStore` (`ensure_collection`, `add_documents`)
//!   - `QdrantStore` (por defecto) y `neo4j_client::Neo4jStore`
//!   - `create_vector_store(&AppConfig)`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use qdrant_client::{
    config::QdrantConfig,
    qdrant::{
        CreateCollectionBuilder, Distance, PointId, PointStruct, UpsertPointsBuilder,
        VectorParamsBuilder,
    },
    Payload, Qdrant,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    config::{AppConfig, VectorStoreProvider},
    models::EmbeddedDocument,
    neo4j_client::Neo4jStore,
};

/// Puntos por petición de upsert a Qdrant.
pub const UPSERT_BATCH_SIZE: usize = 64;

/// Destino de los pares (vector, texto).
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Crea la colección si no existe.
    async fn ensure_collection(&self, name: &str, ndims: usize) -> Result<()>;

    /// Inserta un registro por documento. No deduplica: cada llamada añade
    /// entradas nuevas aunque el texto ya estuviera indexado.
    async fn add_documents(&self, name: &str, documents: &[EmbeddedDocument]) -> Result<usize>;
}

/// Construye el vector store indicado en la configuración.
pub async fn create_vector_store(cfg: &AppConfig) -> Result<Box<dyn VectorStore>> {
    match cfg.vector_store {
        VectorStoreProvider::Qdrant => Ok(Box::new(QdrantStore::from_config(cfg)?)),
        VectorStoreProvider::Neo4j => Ok(Box::new(Neo4jStore::connect_from_config(cfg).await?)),
    }
}

/// Vector store respaldado por Qdrant.
pub struct QdrantStore {
    client: Qdrant,
}

impl QdrantStore {
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let mut client_config = QdrantConfig::from_url(&cfg.qdrant_url);
        client_config.api_key = cfg.qdrant_api_key.clone();

        let client = Qdrant::new(client_config)
            .with_context(|| format!("No se pudo crear el cliente Qdrant para {}", cfg.qdrant_url))?;
        info!("Cliente Qdrant listo para {}", cfg.qdrant_url);
        Ok(Self { client })
    }

    async fn collection_exists(&self, name: &str) -> Result<bool> {
        let collections = self
            .client
            .list_collections()
            .await
            .context("No se pudieron listar las colecciones de Qdrant")?;
        Ok(collections.collections.iter().any(|c| c.name == name))
    }
}

/// Payload con la forma `{page_content, metadata: {source}}`.
fn document_payload(doc: &EmbeddedDocument) -> serde_json::Map<String, serde_json::Value> {
    let mut payload = serde_json::Map::new();
    payload.insert("page_content".to_string(), json!(doc.text));
    payload.insert("metadata".to_string(), json!({ "source": doc.source }));
    payload
}

fn document_to_point(doc: &EmbeddedDocument) -> PointStruct {
    let id = PointId::from(Uuid::new_v4().to_string());
    let vector: Vec<f32> = doc.vector.iter().map(|v| *v as f32).collect();
    PointStruct::new(id, vector, Payload::from(document_payload(doc)))
}

fn point_batches(documents: &[EmbeddedDocument]) -> Vec<Vec<PointStruct>> {
    documents
        .chunks(UPSERT_BATCH_SIZE)
        .map(|chunk| chunk.iter().map(document_to_point).collect())
        .collect()
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn ensure_collection(&self, name: &str, ndims: usize) -> Result<()> {
        if self.collection_exists(name).await? {
            info!("Colección '{name}' ya existe.");
            return Ok(());
        }

        let create_collection = CreateCollectionBuilder::new(name)
            .vectors_config(VectorParamsBuilder::new(ndims as u64, Distance::Cosine));
        self.client
            .create_collection(create_collection)
            .await
            .with_context(|| format!("No se pudo crear la colección {name}"))?;
        info!("Colección '{name}' creada ({ndims} dimensiones).");
        Ok(())
    }

    async fn add_documents(&self, name: &str, documents: &[EmbeddedDocument]) -> Result<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        for (batch_idx, points) in point_batches(documents).into_iter().enumerate() {
            self.client
                .upsert_points(UpsertPointsBuilder::new(name, points).wait(true))
                .await
                .with_context(|| format!("No se pudo insertar el lote {batch_idx} en {name}"))?;
        }

        info!("{} documentos indexados en '{name}'", documents.len());
        Ok(documents.len())
    }
}
