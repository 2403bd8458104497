//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! API para construir respuestas y convertirlas a bytes para el socket.
//!
//! ## Formato de una respuesta
//!
//! ```text
//! HTTP/1.1 201 Created\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 52\r\n
//! Server: ConcurrentServer/1.0\r\n
//! Connection: close\r\n
//! \r\n
//! {"mensaje": "Datos almacenados correctamente", "id": 3}
//! ```
//!
//! Toda respuesta cierra la conexión: no hay keep-alive ni pipelining.
//!
//! ## Ejemplo de uso
//!
//! ```
//! use concurrent_server::http::{Response, StatusCode};
//!
//! let response = Response::new(StatusCode::Ok)
//!     .with_content_type("text/plain")
//!     .with_body("hola");
//!
//! let bytes = response.to_bytes();
//! assert!(bytes.ends_with(b"\r\n\r\nhola"));
//! ```

use super::StatusCode;
use serde::Serialize;

/// Versión usada en la status line de todas las respuestas
pub const HTTP_VERSION: &str = "HTTP/1.1";

/// Valor del header `Server`
pub const SERVER_NAME: &str = "ConcurrentServer/1.0";

/// Respuesta HTTP completa
#[derive(Debug, Clone)]
pub struct Response {
    /// Código de estado
    status: StatusCode,

    /// Valor del header Content-Type
    content_type: String,

    /// Cuerpo de la respuesta
    body: Vec<u8>,
}

impl Response {
    /// Crea una respuesta vacía de tipo `text/plain`
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8".to_string(),
            body: Vec::new(),
        }
    }

    /// Cambia el Content-Type
    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = content_type.to_string();
        self
    }

    /// Establece el cuerpo desde un string
    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.as_bytes().to_vec();
        self
    }

    /// Respuesta JSON con el código indicado
    ///
    /// Si la serialización falla (no debería para `serde_json::Value`),
    /// se devuelve un 500 con el error.
    pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(body) => Self::new(status)
                .with_content_type("application/json")
                .with_body(&body),
            Err(e) => Self::error(
                StatusCode::InternalServerError,
                &format!("Error serializando respuesta: {}", e),
            ),
        }
    }

    /// Respuesta HTML 200 OK
    pub fn html(body: &str) -> Self {
        Self::new(StatusCode::Ok)
            .with_content_type("text/html; charset=utf-8")
            .with_body(body)
    }

    /// Respuesta de error JSON
    ///
    /// Formato: `{"error": "mensaje", "code": 404}`
    ///
    /// # Ejemplo
    /// ```
    /// use concurrent_server::http::{Response, StatusCode};
    ///
    /// let response = Response::error(StatusCode::NotFound, "Ruta no encontrada");
    /// let body = String::from_utf8(response.body().to_vec()).unwrap();
    /// assert!(body.contains("\"code\":404"));
    /// ```
    pub fn error(status: StatusCode, message: &str) -> Self {
        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16(),
        });
        Self::new(status)
            .with_content_type("application/json")
            .with_body(&body.to_string())
    }

    /// Convierte la respuesta a bytes listos para el socket
    ///
    /// Orden: status line, Content-Type, Content-Length, Server,
    /// Connection, línea vacía y body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut head = format!("{} {}\r\n", HTTP_VERSION, self.status);
        head.push_str(&format!("Content-Type: {}\r\n", self.content_type));
        head.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        head.push_str(&format!("Server: {}\r\n", SERVER_NAME));
        head.push_str("Connection: close\r\n\r\n");

        let mut result = head.into_bytes();
        result.extend_from_slice(&self.body);
        result
    }

    /// Código de estado de la respuesta
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Content-Type de la respuesta
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Cuerpo de la respuesta
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
