//! Connection pool construction and the idempotent bootstrap of the core
//! relations.

mod bootstrap;
mod pool;

pub use bootstrap::ensure_core_tables;
pub use pool::{create_pool, ping};
