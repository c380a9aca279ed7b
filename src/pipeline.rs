//! Ingesta completa: nodos → ficheros JSON → documentos → embeddings → vector store.

use std::{io::Write, path::Path};

use anyhow::{anyhow, Result};
use tracing::info;

use crate::{
    documents,
    llm::{self, Embedder},
    models::LoadedDocument,
    node_source::NodeSource,
    vector_store::VectorStore,
};

/// Resumen de los resultados de una ejecución.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestionSummary {
    pub nodes_exported: usize,
    pub documents_loaded: usize,
    pub documents_indexed: usize,
}

impl std::fmt::Display for IngestionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Resumen: {} nodos exportados, {} documentos cargados, {} documentos indexados.",
            self.nodes_exported, self.documents_loaded, self.documents_indexed
        )
    }
}

/// Calcula embeddings y los guarda en una colección.
pub struct Indexer {
    embedder: Box<dyn Embedder>,
    store: Box<dyn VectorStore>,
    collection: String,
}

impl Indexer {
    pub fn new(
        embedder: Box<dyn Embedder>,
        store: Box<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            store,
            collection: collection.into(),
        }
    }

    /// Indexa todo el lote. Sin reintentos: el primer error aborta.
    pub async fn index(&self, documents: &[LoadedDocument]) -> Result<usize> {
        if documents.is_empty() {
            info!("No hay documentos que indexar.");
            return Ok(0);
        }

        let embedded = llm::embed_documents(self.embedder.as_ref(), documents).await?;

        let ndims = embedded[0].vector.len();
        if ndims == 0 || embedded.iter().any(|d| d.vector.len() != ndims) {
            return Err(anyhow!("Los embeddings recibidos no tienen una dimensión homogénea"));
        }

        self.store.ensure_collection(&self.collection, ndims).await?;
        self.store.add_documents(&self.collection, &embedded).await
    }
}

/// Exporta los nodos a `dir` y los vuelve a cargar como documentos.
pub fn prepare_documents(
    source: &dyn NodeSource,
    dir: &Path,
    out: &mut dyn Write,
) -> Result<(IngestionSummary, Vec<LoadedDocument>)> {
    let written = documents::export_nodes(source, dir, out)?;
    let loaded = documents::load_documents(dir)?;

    let summary = IngestionSummary {
        nodes_exported: written.len(),
        documents_loaded: loaded.len(),
        documents_indexed: 0,
    };
    Ok((summary, loaded))
}
