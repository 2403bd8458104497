//! # Cliente de Prueba de Carga
//! src/loadtest.rs
//!
//! Lanza `solicitudes` peticiones contra el servidor con `concurrencia`
//! threads, mide cada una y guarda el análisis en
//! `<output>_<timestamp>.json`. El dashboard de `/data` lee el archivo más
//! reciente.
//!
//! Cada petición sale en una sola escritura: el servidor hace una única
//! lectura por conexión.
//!
//! ```bash
//! ./client --port 8000 --solicitudes 100 --concurrencia 10 --tipo mixed
//! ```

use crate::error::LoadTestError;
use crate::state::types::now_millis;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Tipo de prueba
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TestMode {
    /// GET alternando /status, /data y /
    Get,
    /// GET /sleep/{1..5}
    Sleep,
    /// POST /data con un objeto por petición
    Post,
    /// Mezcla de las anteriores
    Mixed,
}

/// Configuración del cliente
#[derive(Debug, Clone, Parser)]
#[command(name = "client")]
#[command(about = "Cliente de prueba de carga para el servidor HTTP concurrente")]
#[command(version = "0.1.0")]
pub struct LoadTestConfig {
    /// Host del servidor
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// Puerto del servidor
    #[arg(short, long, default_value = "8000")]
    pub port: u16,

    /// Número total de solicitudes
    #[arg(long = "solicitudes", default_value = "100")]
    pub requests: usize,

    /// Solicitudes simultáneas
    #[arg(long = "concurrencia", default_value = "10")]
    pub concurrency: usize,

    /// Tipo de prueba
    #[arg(long = "tipo", value_enum, default_value = "mixed")]
    pub mode: TestMode,

    /// Prefijo del archivo de resultados
    #[arg(long, default_value = "./data/resultados_prueba")]
    pub output: String,

    /// Timeout por solicitud en milisegundos
    #[arg(long = "timeout-ms", default_value = "30000")]
    pub timeout_ms: u64,

    /// Activa logging detallado (nivel debug)
    #[arg(long)]
    pub debug: bool,
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8000,
            requests: 100,
            concurrency: 10,
            mode: TestMode::Mixed,
            output: "./data/resultados_prueba".to_string(),
            timeout_ms: 30000,
            debug: false,
        }
    }
}

impl LoadTestConfig {
    /// Parsea argumentos CLI
    pub fn new() -> Self {
        LoadTestConfig::parse()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.requests == 0 {
            return Err("Requests must be >= 1".to_string());
        }
        if self.concurrency == 0 {
            return Err("Concurrency must be >= 1".to_string());
        }
        if self.timeout_ms == 0 {
            return Err("Timeout must be > 0".to_string());
        }
        Ok(())
    }
}

/// Petición a enviar
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRequest {
    pub method: &'static str,
    pub path: String,
    pub body: Option<String>,
}

impl PlannedRequest {
    fn get(path: impl Into<String>) -> Self {
        Self { method: "GET", path: path.into(), body: None }
    }

    fn post_data(index: usize) -> Self {
        let body = json!({
            "valor": index,
            "nombre": format!("Test {}", index),
            "timestamp_cliente": now_millis(),
        });
        Self { method: "POST", path: "/data".to_string(), body: Some(body.to_string()) }
    }

    /// Bytes exactos que se escriben en el socket
    pub fn to_bytes(&self, host: &str) -> Vec<u8> {
        let body = self.body.as_deref().unwrap_or("");
        let mut head = format!("{} {} HTTP/1.1\r\nHost: {}\r\n", self.method, self.path, host);
        if self.body.is_some() {
            head.push_str("Content-Type: application/json\r\n");
        }
        head.push_str(&format!("Content-Length: {}\r\nConnection: close\r\n\r\n", body.len()));

        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(body.as_bytes());
        bytes
    }
}

/// Petición número `index` de una prueba del tipo `mode`
pub fn plan_request(mode: TestMode, index: usize) -> PlannedRequest {
    match mode {
        TestMode::Get => match index % 3 {
            0 => PlannedRequest::get("/status"),
            1 => PlannedRequest::get("/data"),
            _ => PlannedRequest::get("/"),
        },
        TestMode::Sleep => PlannedRequest::get(format!("/sleep/{}", index % 5 + 1)),
        TestMode::Post => PlannedRequest::post_data(index),
        TestMode::Mixed => match index % 4 {
            0 => PlannedRequest::get("/status"),
            1 => PlannedRequest::get("/data"),
            2 => PlannedRequest::get(format!("/sleep/{}", index % 3 + 1)),
            _ => PlannedRequest::post_data(index),
        },
    }
}

/// Resultado de una petición
#[derive(Debug, Clone, Serialize)]
pub struct RequestResult {
    pub id: usize,
    pub url: String,
    #[serde(rename = "metodo")]
    pub method: String,
    pub status_code: u16,
    #[serde(rename = "tiempo_segundos")]
    pub elapsed_secs: f64,
    #[serde(rename = "exito")]
    pub success: bool,
}

/// Tiempos en segundos
#[derive(Debug, Clone, Serialize)]
pub struct Timings {
    #[serde(rename = "promedio")]
    pub mean: f64,
    #[serde(rename = "minimo")]
    pub min: f64,
    #[serde(rename = "maximo")]
    pub max: f64,
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

/// Resumen de una prueba
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    #[serde(rename = "total_solicitudes")]
    pub total: usize,
    #[serde(rename = "solicitudes_exitosas")]
    pub successful: usize,
    #[serde(rename = "tasa_exito")]
    pub success_rate: f64,
    #[serde(rename = "tiempos")]
    pub timings: Timings,
    #[serde(rename = "codigos_respuesta")]
    pub status_codes: BTreeMap<u16, usize>,
}

#[derive(Serialize)]
struct Report<'a> {
    timestamp: u64,
    #[serde(rename = "analisis")]
    analysis: &'a Analysis,
    #[serde(rename = "resultados_detallados")]
    results: &'a [RequestResult],
}

/// Código de la línea de estado ("HTTP/1.1 201 Created" → 201)
fn parse_status(response: &[u8]) -> Option<u16> {
    let line_end = response.iter().position(|&b| b == b'\n').unwrap_or(response.len());
    let line = std::str::from_utf8(&response[..line_end]).ok()?;
    let mut parts = line.split_whitespace();
    parts.next().filter(|version| version.starts_with("HTTP/"))?;
    parts.next()?.parse().ok()
}

/// Conecta al primer destino que responda
fn connect(addrs: &[SocketAddr], timeout: Duration) -> io::Result<TcpStream> {
    let mut last_error = io::Error::new(io::ErrorKind::NotFound, "sin direcciones");
    for addr in addrs {
        match TcpStream::connect_timeout(addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = e,
        }
    }
    Err(last_error)
}

/// Envía una petición y retorna el código de estado
///
/// Timeout → 408, sin conexión → 503, cualquier otro fallo → 500.
pub fn send_request(addrs: &[SocketAddr], host: &str, request: &PlannedRequest, timeout: Duration) -> u16 {
    let mut stream = match connect(addrs, timeout) {
        Ok(stream) => stream,
        Err(e) if is_timeout(&e) => return 408,
        Err(e) => {
            error!(path = %request.path, "Error de conexión: {}", e);
            return 503;
        }
    };

    match exchange(&mut stream, &request.to_bytes(host), timeout) {
        Ok(response) => parse_status(&response).unwrap_or(500),
        Err(e) if is_timeout(&e) => {
            warn!(path = %request.path, "Solicitud agotó el tiempo de espera");
            408
        }
        Err(e) => {
            error!(path = %request.path, "Error en solicitud: {}", e);
            500
        }
    }
}

/// Escribe la petición completa y lee hasta que el servidor cierre
fn exchange(stream: &mut TcpStream, request: &[u8], timeout: Duration) -> io::Result<Vec<u8>> {
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;
    stream.write_all(request)?;
    stream.flush()?;

    let mut response = Vec::new();
    stream.read_to_end(&mut response)?;
    Ok(response)
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

/// Ejecuta la prueba y retorna los resultados ordenados por id
pub fn run_load_test(config: &LoadTestConfig) -> Result<Vec<RequestResult>, LoadTestError> {
    config.validate().map_err(LoadTestError::Config)?;

    let addrs: Vec<SocketAddr> = (config.host.as_str(), config.port).to_socket_addrs()?.collect();
    let timeout = Duration::from_millis(config.timeout_ms);
    let planned: Vec<PlannedRequest> = (0..config.requests).map(|i| plan_request(config.mode, i)).collect();

    info!(
        requests = config.requests,
        concurrency = config.concurrency,
        mode = ?config.mode,
        "Iniciando prueba"
    );

    let next = AtomicUsize::new(0);
    let completed = AtomicUsize::new(0);
    let results = Mutex::new(Vec::with_capacity(planned.len()));
    let start = Instant::now();

    thread::scope(|scope| {
        for _ in 0..config.concurrency.min(planned.len()) {
            scope.spawn(|| loop {
                let id = next.fetch_add(1, Ordering::Relaxed);
                let Some(request) = planned.get(id) else {
                    break;
                };

                let sent = Instant::now();
                let status = send_request(&addrs, &config.host, request, timeout);
                let result = RequestResult {
                    id,
                    url: format!("http://{}:{}{}", config.host, config.port, request.path),
                    method: request.method.to_string(),
                    status_code: status,
                    elapsed_secs: sent.elapsed().as_secs_f64(),
                    success: (200..300).contains(&status),
                };
                results.lock().unwrap_or_else(PoisonError::into_inner).push(result);

                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                if done == 1 || done % 10 == 0 || done == planned.len() {
                    info!("Completadas {}/{} solicitudes", done, planned.len());
                }
            });
        }
    });

    let mut results = results.into_inner().unwrap_or_else(PoisonError::into_inner);
    results.sort_by_key(|result| result.id);

    info!(elapsed_secs = start.elapsed().as_secs_f64(), "Prueba completada");
    Ok(results)
}

/// Valor en la posición `floor(len * fraction)` de una lista ordenada
fn percentile(sorted: &[f64], fraction: f64) -> f64 {
    let index = ((sorted.len() as f64 * fraction) as usize).min(sorted.len() - 1);
    sorted[index]
}

/// Estadísticas de una prueba; `None` si no hay resultados
pub fn analyze(results: &[RequestResult]) -> Option<Analysis> {
    if results.is_empty() {
        return None;
    }

    let mut times: Vec<f64> = results.iter().map(|r| r.elapsed_secs).collect();
    times.sort_by(f64::total_cmp);

    let mut status_codes = BTreeMap::new();
    for result in results {
        *status_codes.entry(result.status_code).or_insert(0) += 1;
    }

    let successful = results.iter().filter(|r| r.success).count();

    Some(Analysis {
        total: results.len(),
        successful,
        success_rate: successful as f64 / results.len() as f64,
        timings: Timings {
            mean: times.iter().sum::<f64>() / times.len() as f64,
            min: times[0],
            max: times[times.len() - 1],
            p50: times[times.len() / 2],
            p90: percentile(&times, 0.90),
            p95: percentile(&times, 0.95),
            p99: percentile(&times, 0.99),
        },
        status_codes,
    })
}

/// Escribe `<prefix>_<timestamp>.json` y retorna su ruta
pub fn save_results(
    prefix: &str,
    results: &[RequestResult],
    analysis: &Analysis,
) -> Result<PathBuf, LoadTestError> {
    let timestamp = now_millis();
    let path = PathBuf::from(format!("{}_{}.json", prefix, timestamp));

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut writer, &Report { timestamp, analysis, results })?;
    writer.flush()?;

    info!(path = %path.display(), "Resultados guardados");
    Ok(path)
}

/// Ejecuta, analiza y guarda
pub fn run(config: &LoadTestConfig) -> Result<(Analysis, PathBuf), LoadTestError> {
    let results = run_load_test(config)?;
    let analysis = analyze(&results).ok_or(LoadTestError::NoResults)?;
    let path = save_results(&config.output, &results, &analysis)?;
    Ok((analysis, path))
}

/// Resumen legible para la terminal
pub fn summary(analysis: &Analysis, path: &Path) -> String {
    let mut text = format!(
        "RESUMEN DE LA PRUEBA:\n\
         Total solicitudes: {}\n\
         Tasa de éxito: {:.1}%\n\
         Tiempo promedio: {:.1}ms\n\
         Percentil 95: {:.1}ms\n\
         \nCódigos de respuesta:\n",
        analysis.total,
        analysis.success_rate * 100.0,
        analysis.timings.mean * 1000.0,
        analysis.timings.p95 * 1000.0,
    );
    for (code, count) in &analysis.status_codes {
        text.push_str(&format!(
            "  {}: {} ({:.1}%)\n",
            code,
            count,
            *count as f64 / analysis.total as f64 * 100.0
        ));
    }
    text.push_str(&format!("\nResultados en {}\n", path.display()));
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn result(id: usize, status_code: u16, elapsed_secs: f64) -> RequestResult {
        RequestResult {
            id,
            url: "http://localhost:8000/".to_string(),
            method: "GET".to_string(),
            status_code,
            elapsed_secs,
            success: (200..300).contains(&status_code),
        }
    }

    /// Servidor de una sola conexión que responde `reply`
    fn one_shot_server(reply: &'static [u8]) -> (SocketAddr, thread::JoinHandle<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = vec![0u8; 1024];
            let n = stream.read(&mut buf).unwrap();
            stream.write_all(reply).unwrap();
            buf.truncate(n);
            buf
        });
        (addr, handle)
    }

    #[test]
    fn test_plan_get_cycles_endpoints() {
        let paths: Vec<_> = (0..4).map(|i| plan_request(TestMode::Get, i).path).collect();
        assert_eq!(paths, vec!["/status", "/data", "/", "/status"]);
    }

    #[test]
    fn test_plan_sleep_between_one_and_five() {
        assert_eq!(plan_request(TestMode::Sleep, 0).path, "/sleep/1");
        assert_eq!(plan_request(TestMode::Sleep, 4).path, "/sleep/5");
        assert_eq!(plan_request(TestMode::Sleep, 5).path, "/sleep/1");
    }

    #[test]
    fn test_plan_mixed() {
        let planned: Vec<_> = (0..4).map(|i| plan_request(TestMode::Mixed, i)).collect();

        assert_eq!(planned[0], PlannedRequest::get("/status"));
        assert_eq!(planned[1], PlannedRequest::get("/data"));
        assert_eq!(planned[2].path, "/sleep/3");
        assert_eq!(planned[3].method, "POST");

        let body: serde_json::Value = serde_json::from_str(planned[3].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["valor"], 3);
        assert_eq!(body["nombre"], "Test 3");
    }

    #[test]
    fn test_post_request_bytes() {
        let request = plan_request(TestMode::Post, 7);
        let text = String::from_utf8(request.to_bytes("localhost")).unwrap();
        let body = request.body.as_deref().unwrap();

        assert!(text.starts_with("POST /data HTTP/1.1\r\n"));
        assert!(text.contains(&format!("Content-Length: {}\r\n", body.len())));
        assert!(text.ends_with(&format!("\r\n\r\n{}", body)));
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status(b"HTTP/1.1 201 Created\r\n\r\n"), Some(201));
        assert_eq!(parse_status(b"HTTP/1.1 404 Not Found"), Some(404));
        assert_eq!(parse_status(b""), None);
        assert_eq!(parse_status(b"hola mundo"), None);
    }

    #[test]
    fn test_send_request_reads_status() {
        let (addr, server) = one_shot_server(b"HTTP/1.1 201 Created\r\nContent-Length: 0\r\n\r\n");

        let status = send_request(&[addr], "localhost", &plan_request(TestMode::Post, 1), Duration::from_secs(5));
        let received = String::from_utf8(server.join().unwrap()).unwrap();

        assert_eq!(status, 201);
        assert!(received.starts_with("POST /data HTTP/1.1\r\n"));
        assert!(received.contains("\"valor\":1"));
    }

    #[test]
    fn test_send_request_connection_refused_is_503() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };

        let status = send_request(&[addr], "localhost", &PlannedRequest::get("/"), Duration::from_secs(1));
        assert_eq!(status, 503);
    }

    #[test]
    fn test_send_request_timeout_is_408() {
        // Acepta en el backlog pero nunca responde
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let status = send_request(&[addr], "localhost", &PlannedRequest::get("/"), Duration::from_millis(100));
        assert_eq!(status, 408);
        drop(listener);
    }

    #[test]
    fn test_send_request_garbage_reply_is_500() {
        let (addr, server) = one_shot_server(b"no es http");

        let status = send_request(&[addr], "localhost", &PlannedRequest::get("/"), Duration::from_secs(5));
        server.join().unwrap();
        assert_eq!(status, 500);
    }

    #[test]
    fn test_analyze_percentiles() {
        let results: Vec<_> = (0..10).map(|i| result(i, 200, (10 - i) as f64)).collect();
        let analysis = analyze(&results).unwrap();

        assert_eq!(analysis.total, 10);
        assert_eq!(analysis.timings.min, 1.0);
        assert_eq!(analysis.timings.max, 10.0);
        assert_eq!(analysis.timings.mean, 5.5);
        // índices len/2 = 5 y floor(10 * 0.9) = 9
        assert_eq!(analysis.timings.p50, 6.0);
        assert_eq!(analysis.timings.p90, 10.0);
        assert_eq!(analysis.timings.p99, 10.0);
    }

    #[test]
    fn test_analyze_success_rate_and_codes() {
        let results = vec![result(0, 200, 0.5), result(1, 201, 0.5), result(2, 503, 0.5), result(3, 200, 0.5)];
        let analysis = analyze(&results).unwrap();

        assert_eq!(analysis.successful, 3);
        assert_eq!(analysis.success_rate, 0.75);
        assert_eq!(analysis.status_codes[&200], 2);
        assert_eq!(analysis.status_codes[&503], 1);

        let value = serde_json::to_value(&analysis).unwrap();
        assert_eq!(value["codigos_respuesta"]["200"], 2);
        assert_eq!(value["tiempos"]["promedio"], 0.5);
    }

    #[test]
    fn test_analyze_empty() {
        assert!(analyze(&[]).is_none());
    }

    #[test]
    fn test_save_results_is_read_back_as_latest() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("nuevo").join("resultados_prueba");
        let results = vec![result(0, 200, 0.25)];
        let analysis = analyze(&results).unwrap();

        let path = save_results(&prefix.to_string_lossy(), &results, &analysis).unwrap();
        assert!(path.exists());

        let latest = crate::persistence::latest_results(dir.path().join("nuevo")).unwrap();
        assert_eq!(latest["analisis"]["total_solicitudes"], 1);
        assert_eq!(latest["resultados_detallados"][0]["exito"], true);
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = LoadTestConfig { concurrency: 0, ..LoadTestConfig::default() };
        assert!(config.validate().is_err());
        assert!(matches!(run_load_test(&config), Err(LoadTestError::Config(_))));
    }

    #[test]
    fn test_summary_lists_codes() {
        let analysis = analyze(&[result(0, 200, 0.5), result(1, 404, 0.5)]).unwrap();
        let text = summary(&analysis, Path::new("salida.json"));

        assert!(text.contains("Total solicitudes: 2"));
        assert!(text.contains("Tasa de éxito: 50.0%"));
        assert!(text.contains("  404: 1 (50.0%)"));
    }
}
