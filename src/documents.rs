//! Persistencia de los nodos como ficheros JSON (uno por nodo) y carga de
//! esos ficheros como documentos de texto.

use std::{
    ffi::OsStr,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::{
    models::{LoadedDocument, NodeRecord},
    node_source::NodeSource,
};

/// Crea el directorio de salida si no existe.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        fs::create_dir_all(dir)
            .with_context(|| format!("No se pudo crear el directorio {}", dir.display()))?;
        info!("Directorio de documentos creado: {}", dir.display());
    }
    Ok(())
}

/// Quita el campo volátil del nodo y lo escribe en `<dir>/<name>.json`,
/// sustituyendo cualquier fichero anterior.
pub fn write_node_document(dir: &Path, node: &mut NodeRecord) -> Result<PathBuf> {
    let name = node.name()?.to_string();
    validate_file_stem(&name)?;

    node.strip_rotation();
    let payload = node.to_json()?;

    let path = dir.join(format!("{name}.json"));
    fs::write(&path, payload)
        .with_context(|| format!("No se pudo escribir {}", path.display()))?;
    Ok(path)
}

/// El nombre del nodo se usa como nombre de fichero; no puede salir del directorio.
fn validate_file_stem(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(anyhow!("Nombre de nodo no válido como fichero: '{name}'"));
    }
    Ok(())
}

/// Obtiene todos los nodos del origen y guarda cada uno en `dir`,
/// escribiendo una línea de confirmación por nodo en `out`.
pub fn export_nodes(
    source: &dyn NodeSource,
    dir: &Path,
    out: &mut dyn Write,
) -> Result<Vec<PathBuf>> {
    ensure_output_dir(dir)?;
    let nodes = source.fetch_nodes()?;
    info!("{} nodos recibidos", nodes.len());

    let mut written = Vec::with_capacity(nodes.len());
    for mut node in nodes {
        let name = node.name()?.to_string();
        writeln!(out, "✅  Guardando nodo {name}")?;
        written.push(write_node_document(dir, &mut node)?);
    }
    Ok(written)
}

/// Carga como texto plano (sin parsear el JSON) cada `*.json` de primer nivel en `dir`.
pub fn load_documents(dir: &Path) -> Result<Vec<LoadedDocument>> {
    if !dir.is_dir() {
        return Err(anyhow!("La ruta no es un directorio: {}", dir.display()));
    }

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = entry?;
        let is_json = entry.path().extension().and_then(OsStr::to_str) == Some("json");
        if entry.file_type().is_file() && is_json {
            paths.push(entry.into_path());
        }
    }
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("No se pudo leer {}", path.display()))?;
        debug!("Cargado {} ({} bytes)", path.display(), text.len());
        documents.push(LoadedDocument {
            text,
            source: path.to_string_lossy().to_string(),
        });
    }
    info!("{} documentos cargados de {}", documents.len(), dir.display());
    Ok(documents)
}
