//! # Concurrent Server
//! src/lib.rs
//!
//! Servidor HTTP concurrente sobre sockets TCP, construido desde cero para
//! mostrar los problemas clásicos de concurrencia: control de admisión con
//! un semáforo, recursos compartidos protegidos por locks, y un
//! productor-consumidor con cola acotada.
//!
//! ## Arquitectura
//!
//! - `http`: parsing tolerante de requests y serialización de responses
//! - `server`: accept loop, admisión, drain worker y shutdown
//! - `router`: tabla de rutas (método, path) → handler
//! - `handlers`: páginas HTML y endpoints JSON
//! - `state`: contador, log de solicitudes, datos y cola de ingesta
//! - `persistence`: archivo de peticiones y resultados de pruebas
//! - `loadtest`: cliente de prueba de carga (binario `client`)
//! - `config`: CLI + variables de entorno
//! - `error`: errores de handlers y de arranque
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use concurrent_server::config::Config;
//! use concurrent_server::server::Server;
//!
//! let config = Config::default();
//! let handle = Server::bind(config).unwrap().start().unwrap();
//! println!("escuchando en {}", handle.local_addr());
//! handle.shutdown();
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod loadtest;
pub mod persistence;
pub mod router;
pub mod server;
pub mod state;
