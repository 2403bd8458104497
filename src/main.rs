//! # Concurrent Server - Entry Point
//! src/main.rs
//!
//! Parsea la configuración, inicializa logging y atiende hasta recibir
//! Ctrl-C (o SIGTERM); entonces hace el shutdown ordenado.

use concurrent_server::config::Config;
use concurrent_server::server::Server;
use std::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() {
    let config = Config::new();

    // RUST_LOG tiene prioridad sobre --debug
    let default_level = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_thread_names(true)
        .init();

    config.print_summary();

    let server = match Server::bind(config) {
        Ok(server) => server,
        Err(e) => {
            error!("Error al iniciar servidor: {}", e);
            std::process::exit(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    let installed = ctrlc::set_handler(move || {
        info!("Señal de parada recibida");
        // Falla solo si el servidor ya terminó
        let _ = shutdown_tx.send(());
    });
    if let Err(e) = installed {
        error!("No se pudo instalar el manejador de señales: {}", e);
        std::process::exit(1);
    }

    match server.run(shutdown_rx) {
        Ok(true) => {}
        Ok(false) => warn!("Shutdown con conexiones aún en curso"),
        Err(e) => {
            error!("Error fatal: {}", e);
            std::process::exit(1);
        }
    }
}
