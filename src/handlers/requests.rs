//! # Log de solicitudes
//! src/handlers/requests.rs

use super::{escape_html, html_page, AppState};
use crate::error::HandlerError;
use crate::http::{Request, Response, StatusCode};
use crate::state::RequestRecord;
use serde_json::json;
use std::collections::BTreeMap;

/// Conteo de solicitudes por método
fn count_by_method(records: &[RequestRecord]) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.method.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Handler para `GET /api/solicitudes`
///
/// # Ejemplo de response
/// ```json
/// {"total_solicitudes": 2, "solicitudes": [{"timestamp": 0, "ip": "127.0.0.1", "metodo": "GET", "ruta": "/"}]}
/// ```
pub fn api_requests_handler(_req: &Request, app: &AppState) -> Result<Response, HandlerError> {
    let records = app.store.snapshot_requests();
    Ok(Response::json(
        StatusCode::Ok,
        &json!({
            "total_solicitudes": records.len(),
            "solicitudes": records,
        }),
    ))
}

/// Handler para `GET /solicitudes`
pub fn requests_page_handler(_req: &Request, app: &AppState) -> Result<Response, HandlerError> {
    let records = app.store.snapshot_requests();

    let summary: String = count_by_method(&records)
        .iter()
        .map(|(method, count)| format!("<tr><th>{}</th><td>{}</td></tr>", escape_html(method), count))
        .collect();

    // Más recientes primero
    let rows: String = records
        .iter()
        .rev()
        .map(|record| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                record.timestamp,
                escape_html(&record.ip),
                escape_html(&record.method),
                escape_html(&record.path)
            )
        })
        .collect();

    let content = format!(
        "<p>Total de solicitudes registradas: {total}</p>\
         <h3>Por método</h3><table>{summary}</table>\
         <h3>Detalle</h3>\
         <table><tr><th>timestamp</th><th>ip</th><th>método</th><th>ruta</th></tr>{rows}</table>",
        total = records.len(),
        summary = summary,
        rows = rows,
    );

    Ok(Response::html(&html_page(
        "Solicitudes Recibidas",
        &content,
        Some("/api/solicitudes"),
    )))
}
