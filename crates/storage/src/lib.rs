pub mod database;
pub mod dto;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;

pub use database::Database;
pub use error::{Result, StorageError};
pub use repository::memory::MemoryStore;
