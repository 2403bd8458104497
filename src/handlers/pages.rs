//! # Páginas informativas y estado
//! src/handlers/pages.rs
//!
//! - `/`, `/index`: página de bienvenida con la lista de endpoints
//! - `/status`: estado en HTML
//! - `/api/status`: estado en JSON (estadísticas + entorno)

use super::{escape_html, html_page, AppState};
use crate::error::HandlerError;
use crate::http::{Request, Response, StatusCode};
use crate::state::types::now_millis;
use serde_json::{json, Value};
use std::thread;

/// Endpoints listados en la página de inicio
const ENDPOINTS: &[(&str, &str)] = &[
    ("/", "Información del servidor"),
    ("/status", "Estado y estadísticas del servidor"),
    ("/data", "Acceso a datos (GET/POST)"),
    ("/sleep/{segundos}", "Simula carga con espera"),
    ("/solicitudes", "Solicitudes recibidas por el servidor"),
    ("/api/status", "Status en formato JSON"),
    ("/api/data", "Datos en formato JSON"),
    ("/api/solicitudes", "Lista de solicitudes realizadas"),
];

/// Handler para `/` y `/index`
pub fn index_handler(_req: &Request, _app: &AppState) -> Result<Response, HandlerError> {
    let items: String = ENDPOINTS
        .iter()
        .map(|(path, description)| {
            format!(
                "<tr><td><code>{}</code></td><td>{}</td></tr>",
                escape_html(path),
                escape_html(description)
            )
        })
        .collect();

    let content = format!(
        "<p>Bienvenido. Endpoints disponibles:</p><table>{}</table><p>Generado: {}</p>",
        items,
        now_millis()
    );

    Ok(Response::html(&html_page("Servidor HTTP Concurrente", &content, None)))
}

/// Información de entorno del proceso y del servidor
///
/// Sin métricas de CPU/memoria: solo lo que expone la biblioteca estándar
/// y el estado de admisión.
pub fn environment_info(app: &AppState) -> Value {
    let current = thread::current();
    let cpus = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);

    json!({
        "sistema": {
            "sistema_operativo": std::env::consts::OS,
            "arquitectura": std::env::consts::ARCH,
            "cpus": cpus,
            "timestamp": now_millis(),
        },
        "threads": {
            "thread_actual": current.name().unwrap_or("sin-nombre"),
            "conexiones_activas": app.connections.active(),
            "permisos_en_uso": app.admission.in_use(),
            "permisos_totales": app.admission.capacity(),
            "proceso_pid": std::process::id(),
        },
        "servidor": {
            "direccion": app.local_addr.map(|addr| addr.to_string()),
            "uptime_segundos": app.started_at.elapsed().as_secs(),
        },
    })
}

/// Contenido completo de estado
fn status_content(app: &AppState) -> Value {
    let mut content = environment_info(app);
    content["servidor_nombre"] = json!("Servidor HTTP Concurrente");
    content["estado"] = json!("activo");
    content["estadisticas"] = serde_json::to_value(app.store.stats()).unwrap_or(Value::Null);
    content
}

/// Handler para `/api/status`
pub fn api_status_handler(_req: &Request, app: &AppState) -> Result<Response, HandlerError> {
    Ok(Response::json(StatusCode::Ok, &status_content(app)))
}

/// Handler para `/status`
pub fn status_page_handler(_req: &Request, app: &AppState) -> Result<Response, HandlerError> {
    let content = status_content(app);

    let mut sections = String::new();
    for section in ["estadisticas", "sistema", "threads", "servidor"] {
        let Some(fields) = content[section].as_object() else {
            continue;
        };
        let rows: String = fields
            .iter()
            .map(|(key, value)| {
                let shown = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                format!("<tr><th>{}</th><td>{}</td></tr>", escape_html(key), escape_html(&shown))
            })
            .collect();
        sections.push_str(&format!("<h3>{}</h3><table>{}</table>", section, rows));
    }

    Ok(Response::html(&html_page(
        "Estado Detallado del Servidor",
        &sections,
        Some("/api/status"),
    )))
}
