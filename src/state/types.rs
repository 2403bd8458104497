//! # Tipos de los Recursos Compartidos
//! src/state/types.rs
//!
//! Registros que guarda el store y los snapshots que entrega.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milisegundos desde UNIX epoch
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Una solicitud registrada en el log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecord {
    /// Momento de registro (ms desde epoch)
    pub timestamp: u64,

    /// IP del cliente
    pub ip: String,

    /// Método tal como llegó
    #[serde(rename = "metodo")]
    pub method: String,

    /// Ruta solicitada
    #[serde(rename = "ruta")]
    pub path: String,
}

impl RequestRecord {
    pub fn new(ip: &str, method: &str, path: &str) -> Self {
        Self {
            timestamp: now_millis(),
            ip: ip.to_string(),
            method: method.to_string(),
            path: path.to_string(),
        }
    }
}

/// Dato enviado por un cliente vía POST /data
///
/// Los campos del cliente son opacos; el servidor agrega `id` y
/// `timestamp`, que reemplazan a cualquier campo homónimo enviado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataItem {
    /// Valor del contador al momento de crear el dato
    pub id: u64,

    /// Momento de creación (ms desde epoch)
    pub timestamp: u64,

    /// Campos enviados por el cliente
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl DataItem {
    pub fn new(id: u64, mut fields: Map<String, Value>) -> Self {
        fields.remove("id");
        fields.remove("timestamp");
        Self {
            id,
            timestamp: now_millis(),
            fields,
        }
    }
}

/// Snapshot puntual de los tres contadores del store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(rename = "total_solicitudes")]
    pub total_requests: u64,

    #[serde(rename = "datos_almacenados")]
    pub data_count: usize,

    #[serde(rename = "tamano_cola")]
    pub queue_size: usize,

    /// Textos crudos descartados por cola llena
    #[serde(rename = "descartados_cola")]
    pub dropped: u64,
}
