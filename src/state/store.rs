//! # Store de Recursos Compartidos
//! src/state/store.rs
//!
//! Único dueño del estado mutable que ven los handlers:
//!
//! - Contador de solicitudes y log de solicitudes (un mismo lock)
//! - Colección de datos (lock propio)
//! - Cola de ingesta (sincronización interna)
//!
//! Orden de locks cuando se toman varios: bookkeeping → datos → cola.

use crate::state::queue::BoundedQueue;
use crate::state::types::{DataItem, RequestRecord, Stats};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::warn;

/// Límites del store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Máximo de solicitudes en el log
    pub max_requests: usize,

    /// Máximo de datos almacenados
    pub max_data: usize,

    /// Capacidad de la cola de ingesta
    pub queue_capacity: usize,

    /// Espera máxima para encolar cuando la cola está llena
    pub enqueue_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_requests: 1000,
            max_data: 100,
            queue_capacity: 50,
            enqueue_timeout: Duration::from_secs(2),
        }
    }
}

impl StoreConfig {
    /// Crea una configuración desde el Config principal
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            max_requests: config.max_log_size,
            max_data: config.max_data_size,
            queue_capacity: config.queue_capacity,
            enqueue_timeout: Duration::from_millis(config.enqueue_timeout_ms),
        }
    }
}

/// Contador y log: ambos son "contabilidad de solicitudes"
struct Bookkeeping {
    counter: u64,
    requests: VecDeque<RequestRecord>,
}

/// Store compartido entre todos los handlers
pub struct SharedState {
    config: StoreConfig,
    bookkeeping: Mutex<Bookkeeping>,
    data: Mutex<VecDeque<DataItem>>,
    queue: BoundedQueue<String>,
    dropped: AtomicU64,
}

/// Empuja al final descartando el más antiguo si está lleno
fn push_bounded<T>(items: &mut VecDeque<T>, item: T, max: usize) {
    while items.len() >= max.max(1) {
        items.pop_front();
    }
    items.push_back(item);
}

impl SharedState {
    /// Crea un store vacío
    pub fn new(config: StoreConfig) -> Self {
        Self {
            bookkeeping: Mutex::new(Bookkeeping {
                counter: 0,
                requests: VecDeque::with_capacity(config.max_requests),
            }),
            data: Mutex::new(VecDeque::with_capacity(config.max_data)),
            queue: BoundedQueue::new(config.queue_capacity),
            dropped: AtomicU64::new(0),
            config,
        }
    }

    fn bookkeeping(&self) -> MutexGuard<'_, Bookkeeping> {
        self.bookkeeping.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn data(&self) -> MutexGuard<'_, VecDeque<DataItem>> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Incrementa el contador y retorna el nuevo valor
    pub fn increment_counter(&self) -> u64 {
        let mut books = self.bookkeeping();
        books.counter += 1;
        books.counter
    }

    /// Valor actual del contador
    pub fn counter(&self) -> u64 {
        self.bookkeeping().counter
    }

    /// Registra una solicitud; si el log está lleno se descarta la más antigua
    pub fn record_request(&self, ip: &str, method: &str, path: &str) {
        let record = RequestRecord::new(ip, method, path);
        let mut books = self.bookkeeping();
        push_bounded(&mut books.requests, record, self.config.max_requests);
    }

    /// Copia independiente del log de solicitudes
    pub fn snapshot_requests(&self) -> Vec<RequestRecord> {
        self.bookkeeping().requests.iter().cloned().collect()
    }

    /// Agrega un dato; si la colección está llena se descarta el más antiguo
    pub fn add_data(&self, item: DataItem) -> bool {
        let mut data = self.data();
        push_bounded(&mut data, item, self.config.max_data);
        true
    }

    /// Crea un dato con id = nuevo valor del contador y lo almacena
    ///
    /// El lock de bookkeeping se mantiene hasta insertar, así la colección
    /// queda ordenada por id.
    pub fn store_data(&self, fields: Map<String, Value>) -> DataItem {
        let mut books = self.bookkeeping();
        books.counter += 1;
        let item = DataItem::new(books.counter, fields);

        let mut data = self.data();
        push_bounded(&mut data, item.clone(), self.config.max_data);
        item
    }

    /// Copia independiente de los datos almacenados
    pub fn snapshot_data(&self) -> Vec<DataItem> {
        self.data().iter().cloned().collect()
    }

    /// Intenta encolar texto crudo esperando como máximo `enqueue_timeout`
    ///
    /// Si la cola sigue llena se descarta el texto y se retorna `false`.
    pub fn enqueue_raw(&self, text: &str) -> bool {
        match self.queue.push_timeout(text.to_string(), self.config.enqueue_timeout) {
            Ok(()) => true,
            Err(_) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    capacity = self.queue.capacity(),
                    dropped,
                    "Cola de solicitudes llena, descartando solicitud"
                );
                false
            }
        }
    }

    /// Desencola texto crudo esperando como máximo `timeout`
    pub fn dequeue_raw(&self, timeout: Duration) -> Option<String> {
        self.queue.pop_timeout(timeout)
    }

    /// Snapshot puntual de contador, cantidad de datos y estado de la cola
    pub fn stats(&self) -> Stats {
        let books = self.bookkeeping();
        let data = self.data();
        Stats {
            total_requests: books.counter,
            data_count: data.len(),
            queue_size: self.queue.len(),
            dropped: self.dropped_entries(),
        }
    }

    /// Textos crudos descartados desde el arranque porque la cola seguía llena
    pub fn dropped_entries(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Límites con los que se creó el store
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}
