//! # Cliente de prueba de carga - Entry Point
//! src/bin/client.rs

use concurrent_server::loadtest::{self, LoadTestConfig};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    let config = LoadTestConfig::new();

    let default_level = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match loadtest::run(&config) {
        Ok((analysis, path)) => println!("\n{}", loadtest::summary(&analysis, &path)),
        Err(e) => {
            error!("Prueba fallida: {}", e);
            std::process::exit(1);
        }
    }
}
