//! # Cola Acotada de Ingesta
//! src/state/queue.rs
//!
//! Cola FIFO thread-safe de capacidad fija. Los productores esperan como
//! máximo un timeout cuando está llena; el consumidor espera como máximo un
//! timeout cuando está vacía, para poder revisar su bandera de parada.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Cola FIFO acotada
pub struct BoundedQueue<T> {
    /// Elementos en orden de llegada
    items: Mutex<VecDeque<T>>,

    /// Notifica a consumidores cuando entra un elemento
    not_empty: Condvar,

    /// Notifica a productores cuando se libera espacio
    not_full: Condvar,

    /// Capacidad máxima
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Crea una cola vacía con capacidad máxima
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Encola esperando como máximo `timeout` a que haya espacio
    ///
    /// Si se agota el tiempo, devuelve el elemento en `Err`.
    pub fn push_timeout(&self, item: T, timeout: Duration) -> Result<(), T> {
        let guard = self.lock();
        let (mut items, _) = self
            .not_full
            .wait_timeout_while(guard, timeout, |items| items.len() >= self.capacity)
            .unwrap_or_else(PoisonError::into_inner);

        if items.len() >= self.capacity {
            return Err(item);
        }

        items.push_back(item);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Desencola esperando como máximo `timeout` a que haya elementos
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let guard = self.lock();
        let (mut items, _) = self
            .not_empty
            .wait_timeout_while(guard, timeout, |items| items.is_empty())
            .unwrap_or_else(PoisonError::into_inner);

        let item = items.pop_front()?;
        self.not_full.notify_one();
        Some(item)
    }

    /// Tamaño actual
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Verifica si está vacía
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Capacidad máxima
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_fifo_order() {
        let queue = BoundedQueue::new(10);
        queue.push_timeout("a", Duration::ZERO).unwrap();
        queue.push_timeout("b", Duration::ZERO).unwrap();

        assert_eq!(queue.pop_timeout(Duration::ZERO), Some("a"));
        assert_eq!(queue.pop_timeout(Duration::ZERO), Some("b"));
        assert_eq!(queue.pop_timeout(Duration::ZERO), None);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_push_times_out_when_full() {
        let queue = BoundedQueue::new(1);
        queue.push_timeout(1, Duration::ZERO).unwrap();
        assert_eq!(queue.len(), queue.capacity());

        let start = Instant::now();
        let result = queue.push_timeout(2, Duration::from_millis(100));
        let elapsed = start.elapsed();

        assert_eq!(result, Err(2));
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_secs(2));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_pop_times_out_when_empty() {
        let queue: BoundedQueue<u32> = BoundedQueue::new(1);

        let start = Instant::now();
        assert_eq!(queue.pop_timeout(Duration::from_millis(50)), None);
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_blocked_producer_wakes_up_on_pop() {
        let queue = Arc::new(BoundedQueue::new(1));
        queue.push_timeout(1, Duration::ZERO).unwrap();

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.push_timeout(2, Duration::from_secs(5)))
        };

        thread::sleep(Duration::from_millis(50));
        assert_eq!(queue.pop_timeout(Duration::ZERO), Some(1));

        assert_eq!(producer.join().unwrap(), Ok(()));
        assert_eq!(queue.pop_timeout(Duration::ZERO), Some(2));
    }

    #[test]
    fn test_blocked_consumer_wakes_up_on_push() {
        let queue: Arc<BoundedQueue<&str>> = Arc::new(BoundedQueue::new(4));

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.pop_timeout(Duration::from_secs(5)))
        };

        thread::sleep(Duration::from_millis(50));
        queue.push_timeout("hola", Duration::ZERO).unwrap();

        assert_eq!(consumer.join().unwrap(), Some("hola"));
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let queue = Arc::new(BoundedQueue::new(5));
        let handles: Vec<_> = (0..20)
            .map(|i| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || queue.push_timeout(i, Duration::from_millis(20)).is_ok())
            })
            .collect();

        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(accepted, 5);
        assert_eq!(queue.len(), 5);
    }
}
