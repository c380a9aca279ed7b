//! Carga y gestión de configuración de la aplicación (origen de nodos,
//! directorio de documentos, embeddings y vector store).

use std::{env, path::PathBuf};
use anyhow::{anyhow, Result};

/// Backend donde se indexan los documentos.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VectorStoreProvider {
    Qdrant,
    Neo4j,
}

impl VectorStoreProvider {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "qdrant" => Ok(Self::Qdrant),
            "neo4j" => Ok(Self::Neo4j),
            other => Err(anyhow!("Vector store no soportado: {other}")),
        }
    }
}

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub documents_dir: PathBuf,
    pub nodes_command: Vec<String>,
    pub nodes_file: Option<PathBuf>,
    pub collection_name: String,

    pub vector_store: VectorStoreProvider,
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,

    pub llm_embedding_model: String,
    /// La credencial no se valida aquí: se comprueba al construir el embedder.
    pub openai_api_key: Option<String>,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que `from_env`, pero leyendo de una función arbitraria.
    /// Los valores vacíos se tratan como ausentes.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let documents_dir = PathBuf::from(get("DOCUMENTS_DIR").unwrap_or_else(|| "documents".to_string()));

        let nodes_command: Vec<String> = get("NODES_COMMAND")
            .unwrap_or_else(|| "tctl get nodes".to_string())
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if nodes_command.is_empty() {
            return Err(anyhow!("NODES_COMMAND no puede estar vacío"));
        }

        let nodes_file = get("NODES_FILE").map(PathBuf::from);
        let collection_name = get("COLLECTION_NAME").unwrap_or_else(|| "nodes".to_string());

        let vector_store_str = get("VECTOR_STORE").unwrap_or_else(|| "qdrant".to_string());
        let vector_store = VectorStoreProvider::from_str(&vector_store_str)?;

        let qdrant_url = get("QDRANT_URL").unwrap_or_else(|| "http://localhost:6334".to_string());
        let qdrant_api_key = get("QDRANT_API_KEY");

        let neo4j_uri = get("NEO4J_URI").unwrap_or_else(|| "neo4j://localhost:7687".to_string());
        let neo4j_user = get("NEO4J_USER").unwrap_or_else(|| "neo4j".to_string());
        let neo4j_password = get("NEO4J_PASSWORD").unwrap_or_default();

        let llm_embedding_model = get("LLM_EMBEDDING_MODEL")
            .unwrap_or_else(|| "text-embedding-3-small".to_string());
        let openai_api_key = get("OPENAI_API_KEY");

        Ok(Self {
            documents_dir,
            nodes_command,
            nodes_file,
            collection_name,
            vector_store,
            qdrant_url,
            qdrant_api_key,
            neo4j_uri,
            neo4j_user,
            neo4j_password,
            llm_embedding_model,
            openai_api_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_match_the_tctl_workflow() {
        let cfg = config_with(&[]).unwrap();
        assert_eq!(cfg.documents_dir, PathBuf::from("documents"));
        assert_eq!(cfg.nodes_command, vec!["tctl", "get", "nodes"]);
        assert_eq!(cfg.collection_name, "nodes");
        assert_eq!(cfg.vector_store, VectorStoreProvider::Qdrant);
        assert!(cfg.nodes_file.is_none());
        assert!(cfg.openai_api_key.is_none());
    }

    #[test]
    fn missing_credential_does_not_fail_loading() {
        let cfg = config_with(&[("OPENAI_API_KEY", "   ")]).unwrap();
        assert!(cfg.openai_api_key.is_none());
    }

    #[test]
    fn overrides_are_honoured() {
        let cfg = config_with(&[
            ("DOCUMENTS_DIR", "/tmp/out"),
            ("NODES_COMMAND", "tctl --config=/etc/teleport.yaml get nodes"),
            ("VECTOR_STORE", "Neo4j"),
            ("COLLECTION_NAME", "inventory"),
            ("OPENAI_API_KEY", "sk-test"),
        ])
        .unwrap();
        assert_eq!(cfg.documents_dir, PathBuf::from("/tmp/out"));
        assert_eq!(cfg.nodes_command.len(), 4);
        assert_eq!(cfg.vector_store, VectorStoreProvider::Neo4j);
        assert_eq!(cfg.collection_name, "inventory");
        assert_eq!(cfg.openai_api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn unknown_vector_store_is_rejected() {
        let err = config_with(&[("VECTOR_STORE", "pinecone")]).unwrap_err();
        assert!(err.to_string().contains("pinecone"));
    }
}
