//! # Módulo del Servidor
//! src/server/mod.rs
//!
//! - `tcp`: accept loop y manejo de cada conexión (un thread por conexión)
//! - `admission`: semáforo de conexiones y contador para el shutdown
//! - `drain`: thread consumidor de la cola de ingesta

pub mod admission;
pub mod drain;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use admission::{AdmissionController, ConnectionTracker};
pub use drain::{DrainConfig, DrainWorker};
pub use tcp::{Server, ServerHandle};
