//! Entity storage: the ordered [`Cache`] and the [`EntityManager`] built on it.

mod cache;
mod manager;

pub use cache::Cache;
pub use manager::EntityManager;
