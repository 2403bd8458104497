//! # Parsing de Requests
//! src/http/request.rs
//!
//! Parser tolerante para la única lectura de cada conexión.
//!
//! ## Formato esperado
//!
//! ```text
//! POST /data HTTP/1.1\r\n
//! Host: localhost:8000\r\n
//! Content-Type: application/json\r\n
//! \r\n
//! {"valor": 1}
//! ```
//!
//! ## Reglas
//!
//! 1. **Request Line**: se divide por espacios en exactamente tres tokens
//!    `METHOD PATH VERSION`. Si no hay exactamente tres, se asume
//!    `GET / HTTP/1.1` en vez de fallar. El path se usa tal cual llega,
//!    query string incluida.
//! 2. **Headers**: no se interpretan.
//! 3. **Body**: todo lo que sigue al primer `\r\n\r\n`.
//!
//! El parser nunca falla: el texto crudo se conserva tal cual para la cola
//! de ingesta.

const DEFAULT_METHOD: &str = "GET";
const DEFAULT_PATH: &str = "/";
const DEFAULT_VERSION: &str = "HTTP/1.1";

/// Métodos HTTP
///
/// Solo GET y POST tienen rutas; cualquier otro token se conserva en
/// `Other` para poder responder 405.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    GET,
    POST,
    Other(String),
}

impl Method {
    fn from_token(s: &str) -> Self {
        match s {
            "GET" => Method::GET,
            "POST" => Method::POST,
            other => Method::Other(other.to_string()),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::Other(token) => token,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request parseado desde una única lectura del socket
#[derive(Debug, Clone)]
pub struct Request {
    /// Método HTTP
    method: Method,

    /// Path tal como vino en la request line (ej: "/sleep/3")
    path: String,

    /// Versión HTTP tal como vino en la request line
    version: String,

    /// Body (lo que sigue a la línea en blanco)
    body: String,

    /// Texto completo recibido, sin espacios al inicio/fin
    raw: String,
}

impl Request {
    /// Parsea un request desde bytes
    ///
    /// Nunca falla. Bytes que no son UTF-8 se reemplazan y una request line
    /// inválida produce `GET / HTTP/1.1`.
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use concurrent_server::http::{Method, Request};
    ///
    /// let request = Request::parse(b"GET /sleep/2 HTTP/1.1\r\n\r\n");
    /// assert_eq!(request.method(), &Method::GET);
    /// assert_eq!(request.path(), "/sleep/2");
    ///
    /// let garbage = Request::parse(b"garbage");
    /// assert_eq!(garbage.path(), "/");
    /// ```
    pub fn parse(buffer: &[u8]) -> Self {
        let raw = String::from_utf8_lossy(buffer).trim().to_string();

        let (head, body) = match raw.split_once("\r\n\r\n") {
            Some((head, body)) => (head, body.to_string()),
            None => (raw.as_str(), String::new()),
        };

        let request_line = head.split("\r\n").next().unwrap_or_default();
        let (method, path, version) = Self::parse_request_line(request_line);

        Request {
            method,
            path,
            version,
            body,
            raw,
        }
    }

    /// Indica si una lectura no contiene nada procesable
    ///
    /// Una conexión que cierra sin enviar datos (o solo espacios) se
    /// termina sin responder.
    pub fn is_blank(buffer: &[u8]) -> bool {
        buffer.iter().all(|b| b.is_ascii_whitespace())
    }

    /// Parsea la request line
    ///
    /// Formato: `METHOD PATH VERSION`. Cualquier otro número de tokens
    /// produce los valores por defecto.
    fn parse_request_line(line: &str) -> (Method, String, String) {
        let parts: Vec<&str> = line.split_whitespace().collect();

        match parts.as_slice() {
            [method, path, version] => (
                Method::from_token(method),
                path.to_string(),
                version.to_string(),
            ),
            _ => (
                Method::from_token(DEFAULT_METHOD),
                DEFAULT_PATH.to_string(),
                DEFAULT_VERSION.to_string(),
            ),
        }
    }

    // === Accesores ===

    /// Método HTTP del request
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path del request, query string incluida
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Versión HTTP
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Body como texto, `None` si está ausente o vacío
    pub fn body_text(&self) -> Option<&str> {
        let body = self.body.trim();
        if body.is_empty() {
            None
        } else {
            Some(body)
        }
    }

    /// Texto completo recibido
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_get() {
        let request = Request::parse(b"GET / HTTP/1.1\r\n\r\n");

        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.path(), "/");
        assert_eq!(request.version(), "HTTP/1.1");
        assert!(request.body_text().is_none());
    }

    #[test]
    fn test_query_string_is_part_of_path() {
        let request = Request::parse(b"GET /data?x=1 HTTP/1.0\r\n\r\n");

        assert_eq!(request.path(), "/data?x=1");
        assert_eq!(request.version(), "HTTP/1.0");
    }

    #[test]
    fn test_parse_post_body() {
        let raw = b"POST /data HTTP/1.1\r\nContent-Type: application/json\r\n\r\n{\"valor\": 1}";
        let request = Request::parse(raw);

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.body_text(), Some("{\"valor\": 1}"));
    }

    #[test]
    fn test_post_without_body_is_reported() {
        let request = Request::parse(b"POST /data HTTP/1.1\r\nContent-Length: 0\r\n\r\n");
        assert!(request.body_text().is_none());
    }

    #[test]
    fn test_too_few_tokens_defaults() {
        let request = Request::parse(b"GET\r\n\r\n");

        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.path(), "/");
        assert_eq!(request.version(), "HTTP/1.1");
    }

    #[test]
    fn test_too_many_tokens_defaults() {
        let request = Request::parse(b"POST /data HTTP/1.1 extra\r\n\r\n");

        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.path(), "/");
    }

    #[test]
    fn test_binary_garbage_defaults() {
        let request = Request::parse(b"\x00\x01\x02\x03garbage");

        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.path(), "/");
    }

    #[test]
    fn test_unknown_method_is_kept() {
        let request = Request::parse(b"DELETE /data HTTP/1.1\r\n\r\n");

        assert_eq!(request.method(), &Method::Other("DELETE".to_string()));
        assert_eq!(request.method().as_str(), "DELETE");
    }

    #[test]
    fn test_raw_text_is_preserved() {
        let raw = b"  GET /status HTTP/1.1\r\nHost: x\r\n\r\n  ";
        let request = Request::parse(raw);
        assert_eq!(request.raw(), "GET /status HTTP/1.1\r\nHost: x");
    }

    #[test]
    fn test_is_blank() {
        assert!(Request::is_blank(b""));
        assert!(Request::is_blank(b"  \r\n "));
        assert!(!Request::is_blank(b"GET / HTTP/1.1"));
    }
}
