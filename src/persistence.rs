//! # Persistencia en Archivos
//! src/persistence.rs
//!
//! Dos colaboradores de archivo, independientes de los locks del store:
//!
//! - `AuditLog`: agrega cada POST /data a `peticiones.json` (arreglo JSON,
//!   escrito de forma atómica con archivo temporal + rename).
//! - `latest_results`: lee el `resultados_prueba_*.json` más reciente para
//!   el dashboard de /data.

use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

/// Nombre del archivo de peticiones dentro del directorio de datos
pub const AUDIT_FILE: &str = "peticiones.json";

/// Prefijo de los archivos de resultados del cliente de pruebas
pub const RESULTS_PREFIX: &str = "resultados_prueba_";

/// Entrada del archivo de peticiones
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry<'a> {
    pub id: u64,
    pub timestamp: u64,
    #[serde(rename = "metodo")]
    pub method: &'a str,
    pub path: &'a str,
    pub data: &'a Value,
}

/// Archivo de peticiones POST
pub struct AuditLog {
    path: PathBuf,

    /// Serializa lectura-modificación-escritura entre conexiones
    write_lock: Mutex<()>,
}

impl AuditLog {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(AUDIT_FILE),
            write_lock: Mutex::new(()),
        }
    }

    /// Ruta del archivo
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Agrega una entrada al arreglo del archivo
    ///
    /// Si el archivo existe pero está corrupto, se empieza un arreglo nuevo.
    pub fn append(&self, entry: &AuditEntry<'_>) -> std::io::Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut entries = self.load().unwrap_or_default();
        entries.push(serde_json::to_value(entry)?);

        // Archivo temporal primero (atomic write)
        let temp_path = self.path.with_extension("json.tmp");
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &entries)?;
        writer.flush()?;

        fs::rename(&temp_path, &self.path)
    }

    /// Lee todas las entradas guardadas
    pub fn load(&self) -> Option<Vec<Value>> {
        let file = File::open(&self.path).ok()?;
        serde_json::from_reader(BufReader::new(file)).ok()
    }
}

/// Lee el archivo de resultados modificado más recientemente
///
/// Si el archivo contiene un arreglo se devuelve su último elemento.
/// `None` si no hay archivos o el más reciente no es JSON válido.
pub fn latest_results(data_dir: impl AsRef<Path>) -> Option<Value> {
    let newest = fs::read_dir(data_dir)
        .ok()?
        .filter_map(Result::ok)
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with(RESULTS_PREFIX) && name.ends_with(".json")
        })
        .filter_map(|entry| {
            let modified = entry.metadata().and_then(|m| m.modified()).ok()?;
            Some((modified, entry.path()))
        })
        .max_by_key(|(modified, _): &(SystemTime, PathBuf)| *modified)?
        .1;

    let file = File::open(newest).ok()?;
    let value: Value = serde_json::from_reader(BufReader::new(file)).ok()?;

    match value {
        Value::Array(mut items) => items.pop(),
        other => Some(other),
    }
}
