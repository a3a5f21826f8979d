//! Persistence: the store seam, its Postgres and in-memory implementations, and the
//! loaders that decide create / update / skip per entry.

pub mod db;
pub mod loaders;
pub mod memory_store;
pub mod pg_store;
pub mod report;
pub mod store;
