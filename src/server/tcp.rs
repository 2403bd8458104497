//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Un thread por conexión. Cada conexión:
//!
//! 1. se registra en el `ConnectionTracker` (en el thread que acepta)
//! 2. espera un permiso del `AdmissionController`
//! 3. incrementa el contador global
//! 4. hace **una sola** lectura de hasta `read_buffer_size` bytes
//! 5. encola el texto crudo, registra la solicitud y enruta
//! 6. escribe la respuesta y cierra
//!
//! El drain worker arranca antes de aceptar la primera conexión. Al
//! detener: se corta el accept loop, se detiene el drain worker y se espera
//! (acotado) a las conexiones en curso.

use crate::config::Config;
use crate::error::{HandlerError, ServerError};
use crate::handlers::{AppState, HandlerConfig};
use crate::http::{Request, Response};
use crate::router::Router;
use crate::server::drain::{DrainConfig, DrainWorker};
use crate::state::{SharedState, StoreConfig};
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Cada cuánto revisa el accept loop la bandera de parada
const ACCEPT_POLL: Duration = Duration::from_millis(50);

/// Lo que comparte cada thread de conexión
pub(crate) struct ConnectionContext {
    app: Arc<AppState>,
    router: Router,
    read_buffer_size: usize,
    io_timeout: Option<Duration>,
}

/// Servidor ligado a su dirección, todavía sin aceptar conexiones
pub struct Server {
    listener: TcpListener,
    context: Arc<ConnectionContext>,
    drain_config: DrainConfig,
    shutdown_timeout: Duration,
}

impl Server {
    /// Valida la configuración, hace bind y construye el estado compartido
    pub fn bind(config: Config) -> Result<Self, ServerError> {
        config.validate().map_err(ServerError::Config)?;

        let listener = TcpListener::bind(config.address())?;
        let local_addr = listener.local_addr()?;

        let store = Arc::new(SharedState::new(StoreConfig::from_config(&config)));
        let app = AppState::new(store, config.max_connections, HandlerConfig::from_config(&config))
            .with_local_addr(local_addr);

        Ok(Self {
            listener,
            context: Arc::new(ConnectionContext {
                app: Arc::new(app),
                router: Router::with_default_routes(),
                read_buffer_size: config.read_buffer_size,
                io_timeout: (config.io_timeout_ms > 0)
                    .then(|| Duration::from_millis(config.io_timeout_ms)),
            }),
            drain_config: DrainConfig::from_config(&config),
            shutdown_timeout: Duration::from_millis(config.shutdown_timeout_ms),
        })
    }

    /// Dirección real en la que escucha (útil con puerto 0)
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Estado compartido del servidor
    pub fn app(&self) -> &Arc<AppState> {
        &self.context.app
    }

    /// Arranca el drain worker y el accept loop en threads propios
    pub fn start(self) -> Result<ServerHandle, ServerError> {
        let local_addr = self.listener.local_addr()?;
        self.listener.set_nonblocking(true)?;

        let drain = DrainWorker::start(Arc::clone(&self.context.app.store), self.drain_config)?;

        let stop = Arc::new(AtomicBool::new(false));
        let accept_thread = thread::Builder::new().name("accept-loop".to_string()).spawn({
            let stop = Arc::clone(&stop);
            let context = Arc::clone(&self.context);
            let listener = self.listener;
            move || Self::accept_loop(listener, context, stop)
        })?;

        info!(address = %local_addr, "Servidor escuchando");

        Ok(ServerHandle {
            local_addr,
            stop,
            accept_thread: Some(accept_thread),
            drain: Some(drain),
            context: self.context,
            shutdown_timeout: self.shutdown_timeout,
        })
    }

    /// Arranca y bloquea hasta recibir la señal de parada
    ///
    /// Un emisor descartado también cuenta como señal. Retorna el resultado
    /// de [`ServerHandle::shutdown`].
    pub fn run(self, shutdown: Receiver<()>) -> Result<bool, ServerError> {
        let handle = self.start()?;

        if shutdown.recv().is_err() {
            warn!("Canal de parada cerrado sin señal");
        }

        Ok(handle.shutdown())
    }

    fn accept_loop(listener: TcpListener, context: Arc<ConnectionContext>, stop: Arc<AtomicBool>) {
        let next_id = AtomicU64::new(1);

        while !stop.load(Ordering::Acquire) {
            match listener.accept() {
                Ok((stream, peer)) => {
                    // El ticket se crea aquí: el shutdown ya cuenta esta conexión
                    let ticket = context.app.connections.track();
                    let id = next_id.fetch_add(1, Ordering::Relaxed);
                    debug!(peer = %peer, id, "Nueva conexión");

                    let spawned = thread::Builder::new().name(format!("conn-{}", id)).spawn({
                        let context = Arc::clone(&context);
                        move || {
                            let _ticket = ticket;
                            if let Err(e) = Self::handle_connection(stream, peer, &context) {
                                error!(peer = %peer, "Error en conexión: {}", e);
                            }
                        }
                    });

                    if let Err(e) = spawned {
                        error!("No se pudo crear el thread de la conexión: {}", e);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL);
                }
                Err(e) => {
                    error!("Error al aceptar conexión: {}", e);
                    thread::sleep(ACCEPT_POLL);
                }
            }
        }

        info!("Accept loop detenido");
    }

    pub(crate) fn handle_connection(
        mut stream: TcpStream,
        peer: SocketAddr,
        context: &ConnectionContext,
    ) -> io::Result<()> {
        let app = &context.app;

        // El listener es no bloqueante; el stream aceptado no debe heredarlo
        stream.set_nonblocking(false)?;

        let _permit = app.admission.acquire();
        let start = Instant::now();
        let sequence = app.store.increment_counter();

        stream.set_read_timeout(context.io_timeout)?;
        stream.set_write_timeout(context.io_timeout)?;

        let mut buffer = vec![0u8; context.read_buffer_size];
        let bytes_read = stream.read(&mut buffer)?;
        let raw = &buffer[..bytes_read];

        if Request::is_blank(raw) {
            debug!(peer = %peer, sequence, "Conexión sin datos, se cierra");
            return Ok(());
        }

        let request = Request::parse(raw);
        let ip = peer.ip().to_string();

        // Cola y log son independientes: un fallo al encolar no evita el registro
        app.store.enqueue_raw(request.raw());
        app.store.record_request(&ip, request.method().as_str(), request.path());

        let response = panic::catch_unwind(AssertUnwindSafe(|| context.router.route(&request, app)))
            .unwrap_or_else(|_| {
                error!(path = request.path(), "Panic en handler");
                Self::internal_error()
            });

        stream.write_all(&response.to_bytes())?;
        stream.flush()?;

        info!(
            sequence,
            ip = %ip,
            method = %request.method(),
            path = request.path(),
            version = request.version(),
            status = response.status().as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Solicitud atendida"
        );

        Ok(())
    }

    fn internal_error() -> Response {
        HandlerError::Internal("Error interno del servidor".to_string()).to_response()
    }
}

/// Servidor en marcha
pub struct ServerHandle {
    local_addr: SocketAddr,
    stop: Arc<AtomicBool>,
    accept_thread: Option<JoinHandle<()>>,
    drain: Option<DrainWorker>,
    context: Arc<ConnectionContext>,
    shutdown_timeout: Duration,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Estado compartido del servidor
    pub fn app(&self) -> &Arc<AppState> {
        &self.context.app
    }

    /// Elementos de la cola procesados por el drain worker
    pub fn drained(&self) -> u64 {
        self.drain.as_ref().map(DrainWorker::processed).unwrap_or(0)
    }

    /// Detiene el servidor
    ///
    /// Retorna `false` si quedaron conexiones en curso al agotar
    /// `shutdown_timeout`.
    pub fn shutdown(mut self) -> bool {
        info!("Deteniendo servidor");
        self.stop.store(true, Ordering::Release);
        self.finish()
    }

    fn finish(&mut self) -> bool {
        if let Some(handle) = self.accept_thread.take() {
            if handle.join().is_err() {
                error!("El accept loop terminó con panic");
            }
        }

        if let Some(mut drain) = self.drain.take() {
            drain.stop();
        }

        let idle = self.context.app.connections.wait_idle(self.shutdown_timeout);
        if idle {
            info!("Servidor detenido");
        } else {
            warn!(
                active = self.context.app.connections.active(),
                "Conexiones en curso al agotar el tiempo de shutdown"
            );
        }
        idle
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if self.accept_thread.is_some() {
            self.stop.store(true, Ordering::Release);
            self.finish();
        }
    }
}
