//! # Handlers
//!
//! Un handler recibe el request ya parseado y el estado de la aplicación,
//! y retorna una respuesta o un `HandlerError` que el router convierte en
//! JSON `{"error", "code"}`.
//!
//! - **pages**: `/`, `/index`, `/status`, `/api/status`
//! - **data**: `GET/POST /data`, `/api/data`
//! - **requests**: `/solicitudes`, `/api/solicitudes`
//! - **sleep**: `/sleep/{n}`
//!
//! Los handlers solo tocan el estado compartido a través de `SharedState`.

pub mod data;
pub mod pages;
pub mod requests;
pub mod sleep;

pub use data::{api_data_handler, data_dashboard_handler, post_data_handler};
pub use pages::{api_status_handler, index_handler, status_page_handler};
pub use requests::{api_requests_handler, requests_page_handler};
pub use sleep::sleep_handler;

use crate::persistence::AuditLog;
use crate::server::admission::{AdmissionController, ConnectionTracker};
use crate::state::SharedState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Parámetros de los handlers fijados al construir el servidor
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// Tope de `n` en /sleep/{n}
    pub max_sleep_secs: u64,

    /// Duración de una "unidad" de /sleep (1s en producción)
    pub sleep_unit: Duration,

    /// Directorio de peticiones.json y resultados_prueba_*.json
    pub data_dir: PathBuf,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            max_sleep_secs: 10,
            sleep_unit: Duration::from_secs(1),
            data_dir: PathBuf::from("./data"),
        }
    }
}

impl HandlerConfig {
    /// Crea una configuración desde el Config principal
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            max_sleep_secs: config.max_sleep_secs,
            sleep_unit: Duration::from_secs(1),
            data_dir: PathBuf::from(&config.data_dir),
        }
    }
}

/// Estado de la aplicación compartido por todas las conexiones
pub struct AppState {
    pub store: Arc<SharedState>,
    pub admission: Arc<AdmissionController>,
    pub connections: Arc<ConnectionTracker>,
    pub audit: AuditLog,
    pub config: HandlerConfig,
    pub local_addr: Option<SocketAddr>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<SharedState>, max_connections: usize, config: HandlerConfig) -> Self {
        Self {
            store,
            admission: Arc::new(AdmissionController::new(max_connections)),
            connections: Arc::new(ConnectionTracker::new()),
            audit: AuditLog::new(&config.data_dir),
            config,
            local_addr: None,
            started_at: Instant::now(),
        }
    }

    /// Dirección en la que escucha el servidor (para /status)
    pub fn with_local_addr(mut self, addr: SocketAddr) -> Self {
        self.local_addr = Some(addr);
        self
    }
}

/// Escapa texto para insertarlo en HTML
pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Envuelve un contenido en la plantilla HTML común
pub(crate) fn html_page(title: &str, content: &str, json_endpoint: Option<&str>) -> String {
    let json_link = json_endpoint
        .map(|endpoint| format!(r#"<a class="json-link" href="{0}">Ver JSON ({0})</a>"#, endpoint))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>
        body {{ font-family: sans-serif; background: #ecf0f1; margin: 0; }}
        header {{ background: #2c3e50; color: white; padding: 20px; text-align: center; }}
        .container {{ max-width: 900px; margin: 30px auto; padding: 20px; background: white; border-radius: 10px; }}
        table {{ border-collapse: collapse; width: 100%; }}
        td, th {{ border-bottom: 1px solid #ddd; padding: 6px; text-align: left; }}
        nav a {{ margin-right: 15px; color: #2980b9; text-decoration: none; }}
        .json-link {{ color: #27ae60; }}
    </style>
</head>
<body>
    <header><h1>Servidor HTTP Concurrente</h1></header>
    <div class="container">
        <h2>{title}</h2>
        {content}
        <nav>
            <a href="/">Inicio</a>
            <a href="/status">Estado</a>
            <a href="/data">Datos</a>
            <a href="/solicitudes">Solicitudes</a>
            {json_link}
        </nav>
    </div>
</body>
</html>"#,
        title = escape_html(title),
        content = content,
        json_link = json_link,
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::state::StoreConfig;

    /// Estado de prueba con /sleep acelerado y directorio temporal
    pub fn app_state(data_dir: &std::path::Path) -> AppState {
        let config = HandlerConfig {
            max_sleep_secs: 10,
            sleep_unit: Duration::from_millis(10),
            data_dir: data_dir.to_path_buf(),
        };
        AppState::new(Arc::new(SharedState::new(StoreConfig::default())), 4, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_html_page_includes_json_link() {
        let page = html_page("Estado", "<p>ok</p>", Some("/api/status"));
        assert!(page.contains("<title>Estado</title>"));
        assert!(page.contains("<p>ok</p>"));
        assert!(page.contains(r#"href="/api/status""#));
    }
}
