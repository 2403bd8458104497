//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor con soporte para argumentos CLI y variables
//! de entorno. Todos los límites y retardos que usan el store, el control
//! de admisión y el drain worker se fijan aquí al construirlos.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./concurrent_server --port 8000 \
//!   --max-connections 20 \
//!   --queue-capacity 50 \
//!   --enqueue-timeout-ms 2000
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8000 HTTP_HOST=0.0.0.0 ./concurrent_server
//! ```

use clap::Parser;

/// Configuración del servidor
#[derive(Debug, Clone, Parser)]
#[command(name = "concurrent_server")]
#[command(about = "Servidor HTTP concurrente con control de admisión y cola de ingesta")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8000", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    /// Directorio del archivo de peticiones y de los resultados de pruebas
    #[arg(long, default_value = "./data", env = "DATA_DIR")]
    pub data_dir: String,

    /// Activa logging detallado (nivel debug)
    #[arg(long)]
    pub debug: bool,

    // === Admisión ===

    /// Máximo de conexiones procesándose a la vez
    #[arg(long = "max-connections", default_value = "20", env = "MAX_CONNECTIONS")]
    pub max_connections: usize,

    /// Tamaño del buffer de la única lectura por conexión
    #[arg(long = "read-buffer", default_value = "1024", env = "READ_BUFFER_SIZE")]
    pub read_buffer_size: usize,

    /// Timeout de lectura/escritura del socket en milisegundos
    #[arg(long = "io-timeout-ms", default_value = "30000", env = "IO_TIMEOUT_MS")]
    pub io_timeout_ms: u64,

    // === Recursos compartidos ===

    /// Máximo de solicitudes guardadas en el log
    #[arg(long = "max-log-size", default_value = "1000", env = "MAX_LOG_SIZE")]
    pub max_log_size: usize,

    /// Máximo de datos almacenados
    #[arg(long = "max-data-size", default_value = "100", env = "MAX_DATA_SIZE")]
    pub max_data_size: usize,

    /// Capacidad de la cola de ingesta
    #[arg(long = "queue-capacity", default_value = "50", env = "QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    /// Espera máxima para encolar en milisegundos
    #[arg(long = "enqueue-timeout-ms", default_value = "2000", env = "ENQUEUE_TIMEOUT_MS")]
    pub enqueue_timeout_ms: u64,

    // === Drain worker ===

    /// Intervalo de espera del drain worker cuando la cola está vacía
    #[arg(long = "drain-poll-ms", default_value = "1000", env = "DRAIN_POLL_MS")]
    pub drain_poll_ms: u64,

    /// Trabajo simulado por cada elemento procesado
    #[arg(long = "drain-work-ms", default_value = "100", env = "DRAIN_WORK_MS")]
    pub drain_work_ms: u64,

    // === Handlers ===

    /// Máximo de segundos que puede dormir /sleep/{n}
    #[arg(long = "max-sleep-secs", default_value = "10", env = "MAX_SLEEP_SECS")]
    pub max_sleep_secs: u64,

    // === Shutdown ===

    /// Espera máxima por conexiones en curso al detener el servidor
    #[arg(long = "shutdown-timeout-ms", default_value = "15000", env = "SHUTDOWN_TIMEOUT_MS")]
    pub shutdown_timeout_ms: u64,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use concurrent_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8000");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), String> {
        if self.max_connections == 0 {
            return Err("Max connections must be >= 1".to_string());
        }
        if self.read_buffer_size < 16 {
            return Err("Read buffer size must be >= 16 bytes".to_string());
        }
        if self.max_log_size == 0 {
            return Err("Max log size must be >= 1".to_string());
        }
        if self.max_data_size == 0 {
            return Err("Max data size must be >= 1".to_string());
        }
        if self.queue_capacity == 0 {
            return Err("Queue capacity must be >= 1".to_string());
        }
        if self.drain_poll_ms == 0 {
            return Err("Drain poll interval must be > 0".to_string());
        }

        Ok(())
    }

    /// Registra un resumen de la configuración
    pub fn print_summary(&self) {
        tracing::info!(
            address = %self.address(),
            data_dir = %self.data_dir,
            "Configuración de red"
        );
        tracing::info!(
            max_connections = self.max_connections,
            read_buffer_size = self.read_buffer_size,
            io_timeout_ms = self.io_timeout_ms,
            "Control de admisión"
        );
        tracing::info!(
            max_log_size = self.max_log_size,
            max_data_size = self.max_data_size,
            queue_capacity = self.queue_capacity,
            enqueue_timeout_ms = self.enqueue_timeout_ms,
            "Recursos compartidos"
        );
        tracing::info!(
            drain_poll_ms = self.drain_poll_ms,
            drain_work_ms = self.drain_work_ms,
            max_sleep_secs = self.max_sleep_secs,
            shutdown_timeout_ms = self.shutdown_timeout_ms,
            "Drain worker y handlers"
        );
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8000,
            host: "127.0.0.1".to_string(),
            data_dir: "./data".to_string(),
            debug: false,
            max_connections: 20,
            read_buffer_size: 1024,
            io_timeout_ms: 30_000,
            max_log_size: 1000,
            max_data_size: 100,
            queue_capacity: 50,
            enqueue_timeout_ms: 2_000,
            drain_poll_ms: 1_000,
            drain_work_ms: 100,
            max_sleep_secs: 10,
            shutdown_timeout_ms: 15_000,
        }
    }
}
