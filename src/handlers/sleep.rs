//! # Carga simulada
//! src/handlers/sleep.rs
//!
//! `GET /sleep/{n}` bloquea el thread de la conexión `n` unidades de
//! tiempo (segundos en producción), con `n` acotado a `[0, max_sleep_secs]`.
//! El permiso de admisión se mantiene durante toda la espera.

use super::AppState;
use crate::error::HandlerError;
use crate::http::{Request, Response, StatusCode};
use crate::state::types::now_millis;
use serde_json::json;
use std::thread;
use tracing::debug;

const SLEEP_PREFIX: &str = "/sleep/";

/// Extrae `n` del path, ya acotado a `[0, max]`
///
/// Acepta un signo opcional seguido de dígitos. Un negativo vale 0 y un
/// valor que no cabe en `u64` vale `max`; cualquier otra cosa es 400.
fn parse_seconds(path: &str, max: u64) -> Result<u64, HandlerError> {
    let invalid = || HandlerError::BadRequest("Parámetro inválido".to_string());

    let segment = path.strip_prefix(SLEEP_PREFIX).ok_or_else(invalid)?;
    let (negative, digits) = match segment.as_bytes().first() {
        Some(b'-') => (true, &segment[1..]),
        Some(b'+') => (false, &segment[1..]),
        _ => (false, segment),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if negative {
        return Ok(0);
    }

    Ok(digits.parse::<u64>().map_or(max, |n| n.min(max)))
}

/// Handler para `GET /sleep/{n}`
///
/// # Ejemplo de response
/// ```json
/// {"mensaje": "El servidor esperó 3 segundos", "thread": "conn-7", "timestamp": 1700000000000}
/// ```
pub fn sleep_handler(req: &Request, app: &AppState) -> Result<Response, HandlerError> {
    let seconds = parse_seconds(req.path(), app.config.max_sleep_secs)?;

    debug!(path = req.path(), seconds, "Simulando carga");

    let unit = app.config.sleep_unit;
    thread::sleep(unit.saturating_mul(u32::try_from(seconds).unwrap_or(u32::MAX)));

    let current = thread::current();
    Ok(Response::json(
        StatusCode::Ok,
        &json!({
            "mensaje": format!("El servidor esperó {} segundos", seconds),
            "thread": current.name().unwrap_or("sin-nombre"),
            "timestamp": now_millis(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::app_state;
    use serde_json::Value;
    use std::time::{Duration, Instant};

    fn sleep(path: &str) -> Result<Response, HandlerError> {
        let dir = tempfile::tempdir().unwrap();
        let app = app_state(dir.path());
        sleep_handler(&Request::parse(format!("GET {} HTTP/1.1\r\n\r\n", path).as_bytes()), &app)
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds("/sleep/3", 10).unwrap(), 3);
        assert_eq!(parse_seconds("/sleep/0", 10).unwrap(), 0);
        assert_eq!(parse_seconds("/sleep/+4", 10).unwrap(), 4);
        assert_eq!(parse_seconds("/sleep/15", 10).unwrap(), 10);
        assert!(parse_seconds("/sleep/", 10).is_err());
        assert!(parse_seconds("/sleep/abc", 10).is_err());
        assert!(parse_seconds("/sleep/-", 10).is_err());
        assert!(parse_seconds("/sleep/1.5", 10).is_err());
        assert!(parse_seconds("/sleep/3?x=1", 10).is_err());
    }

    #[test]
    fn test_parse_seconds_out_of_range_is_clamped() {
        assert_eq!(parse_seconds("/sleep/-1", 10).unwrap(), 0);
        assert_eq!(parse_seconds("/sleep/-99999999999999999999999", 10).unwrap(), 0);
        assert_eq!(parse_seconds("/sleep/99999999999999999999999", 10).unwrap(), 10);
        assert_eq!(parse_seconds("/sleep/18446744073709551615", 10).unwrap(), 10);
    }

    #[test]
    fn test_sleep_negative_returns_immediately() {
        let start = Instant::now();
        let response = sleep("/sleep/-1").unwrap();

        let value: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(value["mensaje"], "El servidor esperó 0 segundos");
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_sleep_overflow_is_clamped() {
        let response = sleep("/sleep/99999999999999999999999").unwrap();

        let value: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(value["mensaje"], "El servidor esperó 10 segundos");
    }

    #[test]
    fn test_sleep_reports_seconds() {
        let response = sleep("/sleep/2").unwrap();
        let value: Value = serde_json::from_slice(response.body()).unwrap();

        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(value["mensaje"], "El servidor esperó 2 segundos");
        assert!(value["thread"].is_string());
    }

    #[test]
    fn test_sleep_is_clamped() {
        // unidad de prueba = 10ms, tope = 10
        let start = Instant::now();
        let response = sleep("/sleep/15").unwrap();
        let elapsed = start.elapsed();

        let value: Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(value["mensaje"], "El servidor esperó 10 segundos");
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_millis(150 * 10));
    }

    #[test]
    fn test_sleep_invalid_parameter() {
        let err = sleep("/sleep/abc").unwrap_err();
        assert_eq!(err.status(), StatusCode::BadRequest);
        assert_eq!(err.to_string(), "Parámetro inválido");
    }
}
