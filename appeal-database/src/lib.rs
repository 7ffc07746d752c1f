pub mod cache;
pub mod database;
pub mod impls;

pub use cache::CacheService;
pub use database::{Database, MIGRATOR};
