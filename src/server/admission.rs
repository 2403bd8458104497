//! # Control de Admisión
//! src/server/admission.rs
//!
//! Semáforo acotado que limita cuántas conexiones se procesan a la vez, y
//! un contador de conexiones vivas que el shutdown usa para esperar a que
//! terminen los handlers en curso.
//!
//! ```text
//! accept → track() → acquire() ─── handler ─── drop(permit) → drop(ticket)
//! ```

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Semáforo con `capacity` permisos
///
/// El orden en que se conceden los permisos entre los que esperan es el
/// que dé el `Condvar`; no hay prioridad.
pub struct AdmissionController {
    /// Permisos libres
    available: Mutex<usize>,
    released: Condvar,
    capacity: usize,
}

/// Permiso adquirido; se libera al hacer drop, en cualquier camino de salida
#[must_use = "el permiso se libera en cuanto se descarta"]
pub struct Permit<'a> {
    gate: &'a AdmissionController,
}

impl AdmissionController {
    pub fn new(capacity: usize) -> Self {
        Self {
            available: Mutex::new(capacity),
            released: Condvar::new(),
            capacity,
        }
    }

    /// Bloquea hasta obtener un permiso. Nunca falla.
    pub fn acquire(&self) -> Permit<'_> {
        let guard = lock(&self.available);
        let mut available = self
            .released
            .wait_while(guard, |available| *available == 0)
            .unwrap_or_else(PoisonError::into_inner);
        *available -= 1;
        Permit { gate: self }
    }

    fn release(&self) {
        let mut available = lock(&self.available);
        *available = (*available + 1).min(self.capacity);
        self.released.notify_one();
    }

    /// Permisos libres en este momento
    pub fn available(&self) -> usize {
        *lock(&self.available)
    }

    /// Permisos en uso en este momento
    pub fn in_use(&self) -> usize {
        self.capacity - self.available()
    }

    /// Tamaño del pool de permisos
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}

/// Contador de conexiones vivas (esperando permiso o procesándose)
#[derive(Default)]
pub struct ConnectionTracker {
    active: Mutex<usize>,
    idle: Condvar,
}

/// Marca una conexión como viva mientras exista
///
/// Es dueño de su tracker para poder crearse en el thread que acepta y
/// moverse al thread de la conexión.
#[must_use = "la conexión deja de contarse en cuanto se descarta"]
pub struct ConnectionTicket {
    tracker: Arc<ConnectionTracker>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra una conexión nueva
    pub fn track(self: &Arc<Self>) -> ConnectionTicket {
        *lock(&self.active) += 1;
        ConnectionTicket {
            tracker: Arc::clone(self),
        }
    }

    /// Conexiones vivas en este momento
    pub fn active(&self) -> usize {
        *lock(&self.active)
    }

    /// Espera a que no quede ninguna conexión viva
    ///
    /// Retorna `false` si se agotó `timeout` con conexiones aún en curso.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut active = lock(&self.active);
        while *active > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            active = self
                .idle
                .wait_timeout(active, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }
}

impl Drop for ConnectionTicket {
    fn drop(&mut self) {
        let mut active = lock(&self.tracker.active);
        *active = active.saturating_sub(1);
        if *active == 0 {
            self.tracker.idle.notify_all();
        }
    }
}
