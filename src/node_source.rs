//! Origen de los nodos del clúster: la salida YAML multi-documento de
//! `tctl get nodes`, o un volcado de esa salida guardado en disco.

use std::{
    fs,
    path::PathBuf,
    process::{Command, Stdio},
};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::models::NodeRecord;

/// Capacidad de obtener el inventario completo de nodos.
pub trait NodeSource {
    fn fetch_nodes(&self) -> Result<Vec<NodeRecord>>;
}

/// Ejecuta un comando externo y parsea su stdout. stderr se descarta.
#[derive(Debug, Clone)]
pub struct CommandNodeSource {
    program: String,
    args: Vec<String>,
}

impl CommandNodeSource {
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| anyhow!("Comando de listado de nodos vacío"))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl NodeSource for CommandNodeSource {
    fn fetch_nodes(&self) -> Result<Vec<NodeRecord>> {
        info!("Ejecutando '{}'...", self.display());
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .with_context(|| format!("No se pudo ejecutar '{}'", self.display()))?;

        if !output.status.success() {
            return Err(anyhow!(
                "'{}' terminó con error ({})",
                self.display(),
                output.status
            ));
        }

        debug!("'{}' devolvió {} bytes", self.display(), output.stdout.len());
        parse_node_stream(&output.stdout)
    }
}

/// Lee un volcado YAML de `tctl get nodes` guardado previamente.
#[derive(Debug, Clone)]
pub struct YamlFileNodeSource {
    path: PathBuf,
}

impl YamlFileNodeSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl NodeSource for YamlFileNodeSource {
    fn fetch_nodes(&self) -> Result<Vec<NodeRecord>> {
        info!("Leyendo nodos de {}", self.path.display());
        let raw = fs::read(&self.path)
            .with_context(|| format!("No se pudo leer {}", self.path.display()))?;
        parse_node_stream(&raw)
    }
}

/// Parsea un flujo YAML multi-documento en registros de nodo.
/// Los documentos vacíos (separadores `---` sueltos) se ignoran.
pub fn parse_node_stream(raw: &[u8]) -> Result<Vec<NodeRecord>> {
    let mut nodes = Vec::new();
    for (index, document) in serde_yaml::Deserializer::from_slice(raw).enumerate() {
        let value = Value::deserialize(document)
            .with_context(|| format!("YAML inválido en el documento {}", index + 1))?;
        if value.is_null() {
            continue;
        }
        let node = NodeRecord::from_value(value)
            .with_context(|| format!("Documento {} del listado de nodos", index + 1))?;
        nodes.push(node);
    }
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    const TWO_NODES: &str = "\
kind: node
metadata:
  name: node-a
spec:
  hostname: h1
  rotation:
    current_id: abc
    state: standby
version: v2
---
kind: node
metadata:
  name: node-b
  labels:
    env: prod
spec:
  hostname: h2
version: v2
";

    #[test]
    fn parses_multi_document_stream() {
        let nodes = parse_node_stream(TWO_NODES.as_bytes()).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].name().unwrap(), "node-a");
        assert_eq!(nodes[1].name().unwrap(), "node-b");
        assert_eq!(
            nodes[1].as_value()["metadata"]["labels"],
            json!({"env": "prod"})
        );
    }

    #[test]
    fn skips_empty_documents() {
        let raw = format!("---\n{TWO_NODES}---\n");
        let nodes = parse_node_stream(raw.as_bytes()).unwrap();
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn empty_output_yields_no_nodes() {
        assert!(parse_node_stream(b"").unwrap().is_empty());
    }

    #[test]
    fn scalar_document_is_an_error() {
        assert!(parse_node_stream(b"just a string\n").is_err());
    }

    #[test]
    fn broken_yaml_is_an_error() {
        assert!(parse_node_stream(b"metadata: [unclosed\n").is_err());
    }

    #[test]
    fn yaml_file_source_reads_a_saved_dump() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TWO_NODES.as_bytes()).unwrap();

        let nodes = YamlFileNodeSource::new(file.path()).fetch_nodes().unwrap();
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(CommandNodeSource::new(&[]).is_err());
    }

    #[test]
    fn missing_program_is_an_error() {
        let source =
            CommandNodeSource::new(&["definitely-not-a-real-tctl-binary".to_string()]).unwrap();
        assert!(source.fetch_nodes().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_an_error() {
        let source = CommandNodeSource::new(&["false".to_string()]).unwrap();
        let err = source.fetch_nodes().unwrap_err();
        assert!(err.to_string().contains("false"));
    }

    #[cfg(unix)]
    #[test]
    fn command_stdout_is_parsed() {
        let source = CommandNodeSource::new(&[
            "printf".to_string(),
            "metadata:\\n  name: from-cmd\\nspec: {}\\n".to_string(),
        ])
        .unwrap();
        let nodes = source.fetch_nodes().unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].name().unwrap(), "from-cmd");
    }
}
