//! # Drain Worker
//! src/server/drain.rs
//!
//! Consumidor único de la cola de ingesta. Corre en su propio thread,
//! independiente de las conexiones:
//!
//! ```text
//! Running ── stop() ──▶ Stopped
//! ```
//!
//! En cada vuelta espera como máximo `poll_interval` por un elemento, de
//! modo que la bandera de parada se revisa aunque la cola esté vacía. Cada
//! elemento se "procesa" durmiendo `work_delay` y luego se descarta.
//!
//! Al detenerse se termina el elemento en curso; lo que quede en la cola se
//! abandona.

use crate::state::SharedState;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};

/// Configuración del drain worker
#[derive(Debug, Clone)]
pub struct DrainConfig {
    /// Espera máxima por elemento antes de revisar la bandera de parada
    pub poll_interval: Duration,

    /// Trabajo simulado por elemento
    pub work_delay: Duration,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            work_delay: Duration::from_millis(100),
        }
    }
}

impl DrainConfig {
    /// Crea una configuración desde el Config principal
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.drain_poll_ms),
            work_delay: Duration::from_millis(config.drain_work_ms),
        }
    }
}

/// Estado del worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainState {
    Running,
    Stopped,
}

/// Handle del thread consumidor
pub struct DrainWorker {
    stop: Arc<AtomicBool>,
    processed: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
    store: Arc<SharedState>,
}

impl DrainWorker {
    /// Lanza el thread consumidor
    pub fn start(store: Arc<SharedState>, config: DrainConfig) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let processed = Arc::new(AtomicU64::new(0));

        let handle = thread::Builder::new().name("drain-worker".to_string()).spawn({
            let store = Arc::clone(&store);
            let stop = Arc::clone(&stop);
            let processed = Arc::clone(&processed);
            move || Self::worker_loop(store, config, stop, processed)
        })?;

        Ok(Self {
            stop,
            processed,
            handle: Some(handle),
            store,
        })
    }

    /// Loop principal del worker
    fn worker_loop(
        store: Arc<SharedState>,
        config: DrainConfig,
        stop: Arc<AtomicBool>,
        processed: Arc<AtomicU64>,
    ) {
        info!("Iniciando drain worker");

        while !stop.load(Ordering::Acquire) {
            let Some(raw) = store.dequeue_raw(config.poll_interval) else {
                continue;
            };

            thread::sleep(config.work_delay);

            let preview: String = raw.chars().take(50).collect();
            debug!(request = %preview, "Procesada solicitud");
            processed.fetch_add(1, Ordering::Relaxed);
        }

        info!("Drain worker detenido");
    }

    /// Estado actual
    pub fn state(&self) -> DrainState {
        match &self.handle {
            Some(handle) if !handle.is_finished() => DrainState::Running,
            _ => DrainState::Stopped,
        }
    }

    /// Elementos procesados hasta ahora
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Señala la parada y espera a que el thread termine
    ///
    /// Retorna cuántos elementos quedaron sin procesar en la cola.
    pub fn stop(&mut self) -> usize {
        self.stop.store(true, Ordering::Release);

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("El drain worker terminó con panic");
            }
        }

        let abandoned = self.store.stats().queue_size;
        if abandoned > 0 {
            info!(abandoned, "Solicitudes abandonadas en la cola al detener");
        }
        abandoned
    }
}

impl Drop for DrainWorker {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.stop();
        }
    }
}
