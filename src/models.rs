//! Modelos de dominio (nodos del clúster y documentos a indexar).

use std::io;

use anyhow::{anyhow, Result};
use serde::Serialize;
use serde_json::{ser::Formatter, Map, Serializer, Value};

/// Campo volátil de `spec` que nunca se persiste.
pub const ROTATION_FIELD: &str = "rotation";

/// Registro de un nodo tal y como lo emite `tctl get nodes`.
/// Sólo `metadata.name` y `spec` tienen significado; el resto se conserva tal cual.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord(Map<String, Value>);

impl NodeRecord {
    /// Construye un registro a partir de un documento ya parseado.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(anyhow!(
                "El nodo no es un mapa clave-valor: {}",
                other
            )),
        }
    }

    /// Nombre del nodo (`metadata.name`).
    pub fn name(&self) -> Result<&str> {
        self.0
            .get("metadata")
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("Falta 'metadata.name' en el nodo"))
    }

    /// Elimina `spec.rotation`. Si no existe (o `spec` no es un mapa) no hace nada.
    pub fn strip_rotation(&mut self) -> Option<Value> {
        self.0
            .get_mut("spec")
            .and_then(Value::as_object_mut)
            .and_then(|spec| spec.shift_remove(ROTATION_FIELD))
    }

    /// JSON del registro en una línea, con `", "` / `": "` como separadores,
    /// las claves en el orden del YAML y escapando todo lo que no sea ASCII.
    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let mut ser = Serializer::with_formatter(&mut buf, SpacedAsciiFormatter);
        self.0.serialize(&mut ser)?;
        Ok(String::from_utf8(buf)?)
    }

    #[cfg(test)]
    pub fn as_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

/// Formato de una línea con espacio tras `,` y `:`, y `\uXXXX` para no-ASCII.
struct SpacedAsciiFormatter;

impl Formatter for SpacedAsciiFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        for c in fragment.chars() {
            if c.is_ascii() {
                writer.write_all(&[c as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

/// Documento leído del disco: texto en bruto y fichero de origen.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    pub text: String,
    pub source: String,
}

/// Documento con su embedding, listo para el vector store.
#[derive(Debug, Clone)]
pub struct EmbeddedDocument {
    pub text: String,
    pub source: String,
    pub vector: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_rotation_and_keeps_everything_else() {
        let mut node = NodeRecord::from_value(json!({
            "kind": "node",
            "metadata": {"name": "node-a"},
            "spec": {"rotation": {"state": "standby"}, "hostname": "h1"}
        }))
        .unwrap();

        let removed = node.strip_rotation();
        assert_eq!(removed, Some(json!({"state": "standby"})));
        assert_eq!(
            node.as_value(),
            json!({"kind": "node", "metadata": {"name": "node-a"}, "spec": {"hostname": "h1"}})
        );
    }

    #[test]
    fn strip_rotation_is_idempotent() {
        let original = json!({"metadata": {"name": "n"}, "spec": {"hostname": "h"}});
        let mut node = NodeRecord::from_value(original.clone()).unwrap();
        assert!(node.strip_rotation().is_none());
        assert!(node.strip_rotation().is_none());
        assert_eq!(node.as_value(), original);
    }

    #[test]
    fn strip_rotation_without_spec_is_a_noop() {
        let mut node = NodeRecord::from_value(json!({"metadata": {"name": "n"}, "spec": "odd"})).unwrap();
        assert!(node.strip_rotation().is_none());
    }

    #[test]
    fn name_requires_metadata_name() {
        let node = NodeRecord::from_value(json!({"metadata": {}})).unwrap();
        assert!(node.name().is_err());

        let node = NodeRecord::from_value(json!({"metadata": {"name": 7}})).unwrap();
        assert!(node.name().is_err());
    }

    #[test]
    fn json_keeps_key_order_and_spaced_separators() {
        let mut node = NodeRecord::from_value(json!({
            "kind": "node",
            "sub_kind": "openssh",
            "version": "v2",
            "metadata": {"name": "node-a"},
            "spec": {"addr": "10.0.0.1:22", "rotation": {"state": "standby"}, "hostname": "h1"}
        }))
        .unwrap();
        node.strip_rotation();
        assert_eq!(
            node.to_json().unwrap(),
            r#"{"kind": "node", "sub_kind": "openssh", "version": "v2", "metadata": {"name": "node-a"}, "spec": {"addr": "10.0.0.1:22", "hostname": "h1"}}"#
        );
    }

    #[test]
    fn json_escapes_non_ascii_and_spaces_arrays() {
        let node = NodeRecord::from_value(json!({
            "metadata": {"name": "nodo-ñ", "labels": ["a", "b"], "emoji": "🚀"},
            "spec": {"quote": "say \"hi\""}
        }))
        .unwrap();
        assert_eq!(
            node.to_json().unwrap(),
            r#"{"metadata": {"name": "nodo-\u00f1", "labels": ["a", "b"], "emoji": "\ud83d\ude80"}, "spec": {"quote": "say \"hi\""}}"#
        );
    }

    #[test]
    fn non_mapping_documents_are_rejected() {
        assert!(NodeRecord::from_value(json!(["a", "b"])).is_err());
        assert!(NodeRecord::from_value(json!("node")).is_err());
    }
}
