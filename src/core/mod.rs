//! Evaluation engine wiring: models, engine façade, caching, output.

pub mod disk_cache;
pub mod engine;
pub mod error;
pub mod output;
pub mod target;
pub mod verdict;
pub mod whitelist;
