//! # Errores
//! src/error.rs
//!
//! - `HandlerError`: lo que un handler puede devolver; siempre termina en
//!   una respuesta JSON `{"error", "code"}`.
//! - `ServerError`: fallos al arrancar el servidor.
//! - `LoadTestError`: fallos del cliente de prueba de carga.

use crate::http::{Response, StatusCode};
use std::io;
use thiserror::Error;

/// Error devuelto por un handler
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Error del cliente: cuerpo vacío, JSON inválido, parámetro inválido
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    MethodNotAllowed(String),

    /// Cualquier otro fallo durante el manejo
    #[error("{0}")]
    Internal(String),
}

impl HandlerError {
    /// Código de estado asociado
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::BadRequest(_) => StatusCode::BadRequest,
            HandlerError::NotFound(_) => StatusCode::NotFound,
            HandlerError::MethodNotAllowed(_) => StatusCode::MethodNotAllowed,
            HandlerError::Internal(_) => StatusCode::InternalServerError,
        }
    }

    /// Respuesta JSON de error
    pub fn to_response(&self) -> Response {
        Response::error(self.status(), &self.to_string())
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(e: serde_json::Error) -> Self {
        HandlerError::Internal(format!("Error de serialización: {}", e))
    }
}

/// Error al arrancar o detener el servidor
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuración inválida: {0}")]
    Config(String),

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

/// Error del cliente de prueba de carga
#[derive(Debug, Error)]
pub enum LoadTestError {
    #[error("configuración inválida: {0}")]
    Config(String),

    #[error("no hay resultados para analizar")]
    NoResults,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("json error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}
