//! Neo4j como vector store alternativo: cada colección es una etiqueta de
//! nodo con su propio índice vectorial sobre `embedding`.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use neo4rs::{query, Graph};
use tracing::info;
use url::Url;

use crate::{config::AppConfig, models::EmbeddedDocument, vector_store::VectorStore};

pub struct Neo4jStore {
    graph: Graph,
}

impl Neo4jStore {
    pub async fn connect_from_config(cfg: &AppConfig) -> Result<Self> {
        let addr = bolt_address(&cfg.neo4j_uri)?;

        info!("Conectando a Neo4j en {addr}...");
        let graph = Graph::new(&addr, &cfg.neo4j_user, &cfg.neo4j_password).await?;
        info!("Conexión a Neo4j OK");
        Ok(Self { graph })
    }
}

fn bolt_address(uri: &str) -> Result<String> {
    let url = Url::parse(uri)?;
    let host = url.host_str().unwrap_or("localhost");
    let port = url.port().unwrap_or(7687);
    Ok(format!("{host}:{port}"))
}

/// El nombre de la colección se interpola en Cypher como etiqueta.
fn collection_label(name: &str) -> Result<&str> {
    let valid = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(name)
    } else {
        Err(anyhow!("Nombre de colección no válido para Neo4j: '{name}'"))
    }
}

fn index_name(label: &str) -> String {
    format!("{label}_embedding")
}

#[async_trait]
impl VectorStore for Neo4jStore {
    async fn ensure_collection(&self, name: &str, ndims: usize) -> Result<()> {
        let label = collection_label(name)?;
        let index_name = index_name(label);

        let mut cursor = self
            .graph
            .execute(
                query("SHOW VECTOR INDEXES YIELD name WHERE name = $name RETURN name")
                    .param("name", index_name.clone()),
            )
            .await?;

        if cursor.next().await?.is_some() {
            info!("Índice vectorial '{index_name}' ya existe.");
            return Ok(());
        }

        let cypher = format!(
            "\
CREATE VECTOR INDEX {index_name} IF NOT EXISTS
FOR (d:`{label}`)
ON (d.embedding)
OPTIONS {{
  indexConfig: {{
    `vector.dimensions`: {ndims},
    `vector.similarity_function`: 'cosine'
  }}
}}"
        );

        self.graph.run(query(&cypher)).await?;
        info!("Índice vectorial '{index_name}' creado.");
        Ok(())
    }

    async fn add_documents(&self, name: &str, documents: &[EmbeddedDocument]) -> Result<usize> {
        let label = collection_label(name)?;
        if documents.is_empty() {
            return Ok(0);
        }

        // CREATE y no MERGE: re-ejecutar duplica entradas, igual que en Qdrant.
        let cypher = format!(
            "CREATE (d:`{label}` {{id: randomUUID()}})
             SET d.text = $text, d.source = $source, d.embedding = $embedding"
        );

        let tx = self.graph.start_txn().await?;
        for doc in documents {
            tx.run(
                query(&cypher)
                    .param("text", doc.text.clone())
                    .param("source", doc.source.clone())
                    .param("embedding", doc.vector.clone()),
            )
            .await?;
        }
        tx.commit().await?;

        info!("{} documentos indexados en ':{label}'", documents.len());
        Ok(documents.len())
    }
}
