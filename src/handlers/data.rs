//! # Datos
//! src/handlers/data.rs
//!
//! - `POST /data`: guarda un objeto JSON y responde 201 con su id
//! - `GET /api/data`: snapshot JSON de los datos guardados
//! - `GET /data`: dashboard HTML de datos + último archivo de resultados

use super::{escape_html, html_page, AppState};
use crate::error::HandlerError;
use crate::http::{Request, Response, StatusCode};
use crate::persistence::{self, AuditEntry};
use crate::state::types::now_millis;
use serde_json::{json, Value};
use tracing::{error, info};

/// Handler para `POST /data`
///
/// # Ejemplo de response
/// ```json
/// {"mensaje": "Datos almacenados correctamente", "id": 3}
/// ```
pub fn post_data_handler(req: &Request, app: &AppState) -> Result<Response, HandlerError> {
    let body = req
        .body_text()
        .ok_or_else(|| HandlerError::BadRequest("Cuerpo de solicitud vacío".to_string()))?;

    let parsed: Value = serde_json::from_str(body)
        .map_err(|_| HandlerError::BadRequest("JSON inválido".to_string()))?;

    let Value::Object(fields) = parsed else {
        return Err(HandlerError::BadRequest(
            "El cuerpo debe ser un objeto JSON".to_string(),
        ));
    };

    let item = app.store.store_data(fields);
    info!(id = item.id, "Dato almacenado");

    // El archivo de auditoría no afecta la respuesta al cliente
    let stored = serde_json::to_value(&item)?;
    let entry = AuditEntry {
        id: item.id,
        timestamp: item.timestamp,
        method: "POST",
        path: "/data",
        data: &stored,
    };
    if let Err(e) = app.audit.append(&entry) {
        error!(path = %app.audit.path().display(), "Error guardando petición en archivo: {}", e);
    }

    Ok(Response::json(
        StatusCode::Created,
        &json!({
            "mensaje": "Datos almacenados correctamente",
            "id": item.id,
        }),
    ))
}

/// Handler para `GET /api/data`
pub fn api_data_handler(_req: &Request, app: &AppState) -> Result<Response, HandlerError> {
    let data = app.store.snapshot_data();
    let body = json!({
        "total": data.len(),
        "datos": data,
        "timestamp": now_millis(),
    });
    Ok(Response::json(StatusCode::Ok, &body))
}

/// Handler para `GET /data`
///
/// Lee el archivo de resultados sin tocar los locks del store.
pub fn data_dashboard_handler(_req: &Request, app: &AppState) -> Result<Response, HandlerError> {
    let data = app.store.snapshot_data();
    let results = persistence::latest_results(&app.config.data_dir).unwrap_or_else(|| json!({}));

    let rows: String = data
        .iter()
        .map(|item| {
            let fields = Value::Object(item.fields.clone()).to_string();
            format!(
                "<tr><td>{}</td><td>{}</td><td><code>{}</code></td></tr>",
                item.id,
                item.timestamp,
                escape_html(&fields)
            )
        })
        .collect();

    let analysis = &results["analisis"];
    let summary = |key: &str| {
        analysis[key]
            .as_object()
            .map(|fields| {
                fields
                    .iter()
                    .map(|(k, v)| format!("<tr><th>{}</th><td>{}</td></tr>", escape_html(k), escape_html(&v.to_string())))
                    .collect::<String>()
            })
            .unwrap_or_default()
    };

    let content = format!(
        "<h3>Datos almacenados ({total})</h3>\
         <table><tr><th>id</th><th>timestamp</th><th>datos</th></tr>{rows}</table>\
         <h3>Tiempos de la última prueba</h3><table>{tiempos}</table>\
         <h3>Códigos de respuesta</h3><table>{codigos}</table>",
        total = data.len(),
        rows = rows,
        tiempos = summary("tiempos"),
        codigos = summary("codigos_respuesta"),
    );

    Ok(Response::html(&html_page("Datos Almacenados", &content, Some("/api/data"))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::app_state;

    fn post(body: &str) -> Request {
        Request::parse(format!("POST /data HTTP/1.1\r\nContent-Type: application/json\r\n\r\n{}", body).as_bytes())
    }

    fn body_json(response: &Response) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[test]
    fn test_post_data_created() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_state(dir.path());

        let response = post_data_handler(&post(r#"{"valor":1}"#), &app).unwrap();
        let value = body_json(&response);

        assert_eq!(response.status(), StatusCode::Created);
        assert!(value["mensaje"].is_string());
        assert_eq!(value["id"], app.store.counter());
        assert_eq!(app.store.snapshot_data()[0].fields["valor"], 1);
    }

    #[test]
    fn test_post_data_writes_audit_file() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_state(dir.path());

        post_data_handler(&post(r#"{"valor":1}"#), &app).unwrap();
        post_data_handler(&post(r#"{"valor":2}"#), &app).unwrap();

        let entries = app.audit.load().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1]["data"]["valor"], 2);
        assert_eq!(entries[1]["path"], "/data");
    }

    #[test]
    fn test_post_data_empty_body() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_state(dir.path());

        let err = post_data_handler(&post(""), &app).unwrap_err();
        assert_eq!(err.status(), StatusCode::BadRequest);
        assert!(app.store.snapshot_data().is_empty());
    }

    #[test]
    fn test_post_data_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_state(dir.path());

        let err = post_data_handler(&post("{valor: 1"), &app).unwrap_err();
        assert_eq!(err.status(), StatusCode::BadRequest);
        assert_eq!(err.to_string(), "JSON inválido");
    }

    #[test]
    fn test_post_data_non_object() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_state(dir.path());

        let err = post_data_handler(&post("[1, 2, 3]"), &app).unwrap_err();
        assert_eq!(err.status(), StatusCode::BadRequest);
    }

    #[test]
    fn test_api_data_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_state(dir.path());
        post_data_handler(&post(r#"{"nombre":"a"}"#), &app).unwrap();

        let request = Request::parse(b"GET /api/data HTTP/1.1\r\n\r\n");
        let value = body_json(&api_data_handler(&request, &app).unwrap());

        assert_eq!(value["total"], 1);
        assert_eq!(value["datos"][0]["nombre"], "a");
    }

    #[test]
    fn test_dashboard_shows_results_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("resultados_prueba_1.json"),
            r#"{"analisis": {"tiempos": {"promedio_ms": 12}, "codigos_respuesta": {"200": 5}}}"#,
        )
        .unwrap();
        let app = app_state(dir.path());
        post_data_handler(&post(r#"{"valor":<1>}"#), &app).unwrap_err();
        post_data_handler(&post(r#"{"valor":"<b>"}"#), &app).unwrap();

        let request = Request::parse(b"GET /data HTTP/1.1\r\n\r\n");
        let response = data_dashboard_handler(&request, &app).unwrap();
        let body = String::from_utf8(response.body().to_vec()).unwrap();

        assert!(body.contains("promedio_ms"));
        assert!(body.contains("Datos almacenados (1)"));
        assert!(body.contains("&lt;b&gt;"));
        assert!(!body.contains("\"<b>\""));
    }

    #[test]
    fn test_dashboard_without_results_file() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_state(dir.path());

        let request = Request::parse(b"GET /data HTTP/1.1\r\n\r\n");
        let response = data_dashboard_handler(&request, &app).unwrap();
        assert_eq!(response.status(), StatusCode::Ok);
    }
}
