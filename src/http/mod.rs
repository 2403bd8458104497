//! # Módulo HTTP
//!
//! Framer mínimo sobre TCP. No implementa HTTP/1.1 completo:
//!
//! - Una sola lectura de tamaño fijo por conexión (sin reensamblado)
//! - Sin chunked transfer encoding
//! - Sin conexiones persistentes: toda respuesta lleva `Connection: close`
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path?query=value HTTP/1.1\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! [body]
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 13\r\n
//! Server: ConcurrentServer/1.0\r\n
//! Connection: close\r\n
//! \r\n
//! {"ok": true}
//! ```

pub mod request;   // Parsing de requests
pub mod response;  // Construcción de responses
pub mod status;    // Códigos de estado

pub use request::{Method, Request};
pub use response::Response;
pub use status::StatusCode;
