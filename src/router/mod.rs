//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Mapea (método, path) a handlers.
//!
//! ```text
//! Request → Router → Handler → Response
//! ```
//!
//! Si ninguna ruta coincide: GET responde 404; cualquier otro método
//! responde 405.

use crate::error::HandlerError;
use crate::handlers::{self, AppState};
use crate::http::{Method, Request, Response};

/// Tipo de función handler
pub type Handler = fn(&Request, &AppState) -> Result<Response, HandlerError>;

/// Forma en que una ruta compara el path
#[derive(Debug, Clone)]
enum PathMatcher {
    /// Path exacto ("/api/data")
    Exact(String),

    /// Prefijo ("/sleep/"); el resto lo interpreta el handler
    Prefix(String),
}

impl PathMatcher {
    fn matches(&self, path: &str) -> bool {
        match self {
            PathMatcher::Exact(exact) => exact == path,
            PathMatcher::Prefix(prefix) => path.starts_with(prefix.as_str()),
        }
    }
}

/// Router que mapea (método, path) a handlers
pub struct Router {
    routes: Vec<(Method, PathMatcher, Handler)>,
}

impl Router {
    /// Crea un router vacío
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Router con la tabla de rutas del servidor
    pub fn with_default_routes() -> Self {
        let mut router = Router::new();

        router.register(Method::GET, "/", handlers::index_handler);
        router.register(Method::GET, "/index", handlers::index_handler);
        router.register(Method::GET, "/status", handlers::status_page_handler);
        router.register(Method::GET, "/api/status", handlers::api_status_handler);
        router.register(Method::GET, "/data", handlers::data_dashboard_handler);
        router.register(Method::POST, "/data", handlers::post_data_handler);
        router.register(Method::GET, "/api/data", handlers::api_data_handler);
        router.register(Method::GET, "/solicitudes", handlers::requests_page_handler);
        router.register(Method::GET, "/api/solicitudes", handlers::api_requests_handler);
        router.register_prefix(Method::GET, "/sleep/", handlers::sleep_handler);

        router
    }

    /// Registra una ruta exacta
    pub fn register(&mut self, method: Method, path: &str, handler: Handler) {
        self.routes.push((method, PathMatcher::Exact(path.to_string()), handler));
    }

    /// Registra una ruta por prefijo
    pub fn register_prefix(&mut self, method: Method, prefix: &str, handler: Handler) {
        self.routes.push((method, PathMatcher::Prefix(prefix.to_string()), handler));
    }

    /// Encuentra y ejecuta el handler apropiado
    ///
    /// Los errores del handler se convierten en respuestas JSON.
    pub fn route(&self, request: &Request, app: &AppState) -> Response {
        let path = request.path();

        let handler = self
            .routes
            .iter()
            .find(|(method, matcher, _)| method == request.method() && matcher.matches(path))
            .map(|(_, _, handler)| *handler);

        let result = match handler {
            Some(handler) => handler(request, app),
            None if request.method() == &Method::GET => {
                Err(HandlerError::NotFound("Ruta no encontrada".to_string()))
            }
            None => Err(HandlerError::MethodNotAllowed("Método no permitido".to_string())),
        };

        result.unwrap_or_else(|e| e.to_response())
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::app_state;
    use crate::http::StatusCode;

    fn ok_handler(_req: &Request, _app: &AppState) -> Result<Response, HandlerError> {
        Ok(Response::new(StatusCode::Ok).with_body("ok"))
    }

    fn failing_handler(_req: &Request, _app: &AppState) -> Result<Response, HandlerError> {
        Err(HandlerError::BadRequest("Parámetro inválido".to_string()))
    }

    fn route(router: &Router, raw: &[u8]) -> Response {
        let dir = tempfile::tempdir().unwrap();
        let app = app_state(dir.path());
        router.route(&Request::parse(raw), &app)
    }

    #[test]
    fn test_route_found() {
        let mut router = Router::new();
        router.register(Method::GET, "/test", ok_handler);

        assert_eq!(route(&router, b"GET /test HTTP/1.1\r\n\r\n").status(), StatusCode::Ok);
    }

    #[test]
    fn test_get_unknown_is_404() {
        let router = Router::with_default_routes();
        let response = route(&router, b"GET /unknown-path HTTP/1.1\r\n\r\n");

        assert_eq!(response.status(), StatusCode::NotFound);
        let value: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(value["code"], 404);
    }

    #[test]
    fn test_query_string_is_not_stripped() {
        let router = Router::with_default_routes();

        let response = route(&router, b"GET /data?x=1 HTTP/1.1\r\n\r\n");
        assert_eq!(response.status(), StatusCode::NotFound);

        let response = route(&router, b"GET /api/status?full HTTP/1.1\r\n\r\n");
        assert_eq!(response.status(), StatusCode::NotFound);
    }

    #[test]
    fn test_other_methods_are_405() {
        let router = Router::with_default_routes();

        for raw in [
            &b"DELETE /data HTTP/1.1\r\n\r\n"[..],
            &b"PUT / HTTP/1.1\r\n\r\n"[..],
            &b"POST /status HTTP/1.1\r\n\r\n"[..],
        ] {
            assert_eq!(route(&router, raw).status(), StatusCode::MethodNotAllowed);
        }
    }

    #[test]
    fn test_prefix_route() {
        let mut router = Router::new();
        router.register_prefix(Method::GET, "/sleep/", ok_handler);

        assert_eq!(route(&router, b"GET /sleep/3 HTTP/1.1\r\n\r\n").status(), StatusCode::Ok);
        assert_eq!(route(&router, b"GET /sleep HTTP/1.1\r\n\r\n").status(), StatusCode::NotFound);
    }

    #[test]
    fn test_handler_error_becomes_json() {
        let mut router = Router::new();
        router.register(Method::GET, "/fail", failing_handler);

        let response = route(&router, b"GET /fail HTTP/1.1\r\n\r\n");
        assert_eq!(response.status(), StatusCode::BadRequest);
        let value: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(value["error"], "Parámetro inválido");
    }

    #[test]
    fn test_unparsable_request_routes_to_index() {
        let router = Router::with_default_routes();
        let response = route(&router, b"???");

        assert_eq!(response.status(), StatusCode::Ok);
        assert!(response.content_type().starts_with("text/html"));
    }
}
