//! # Recursos Compartidos
//!
//! Estado mutable compartido por todas las conexiones. Los handlers solo
//! acceden a él a través de las operaciones de `SharedState`.
//!
//! - `types`: registros y snapshots
//! - `queue`: cola acotada con timeouts
//! - `store`: el store con sus locks

pub mod queue;
pub mod store;
pub mod types;

pub use queue::BoundedQueue;
pub use store::{SharedState, StoreConfig};
pub use types::{DataItem, RequestRecord, Stats};
