// Módulos de la aplicación
mod config;
mod documents;
mod llm;
mod models;
mod neo4j_client;
mod node_source;
mod pipeline;
mod vector_store;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    llm::OpenAiEmbedder,
    node_source::{CommandNodeSource, NodeSource, YamlFileNodeSource},
    pipeline::Indexer,
};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Cargar .env e inicializar logging
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 2. Cargar configuración
    let cfg = config::AppConfig::from_env()?;

    // 3. Exportar nodos a JSON y cargarlos como documentos
    let source: Box<dyn NodeSource> = match &cfg.nodes_file {
        Some(path) => Box::new(YamlFileNodeSource::new(path)),
        None => Box::new(CommandNodeSource::new(&cfg.nodes_command)?),
    };
    let (mut summary, documents) = pipeline::prepare_documents(source.as_ref(), &cfg.documents_dir, &mut std::io::stdout())?;

    // 4. Embeddings + vector store. La credencial se comprueba aquí, antes de cualquier llamada.
    let embedder = OpenAiEmbedder::new(cfg.openai_api_key.as_deref(), &cfg.llm_embedding_model)?;
    let store = vector_store::create_vector_store(&cfg).await?;
    let indexer = Indexer::new(Box::new(embedder), store, cfg.collection_name.clone());

    summary.documents_indexed = indexer.index(&documents).await?;

    info!("✅ {summary}");
    Ok(())
}
