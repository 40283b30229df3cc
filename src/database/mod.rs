pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod query_builder;
pub mod repository;
pub mod schema;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repository::{Repository, RepositoryError};
pub use schema::{Resource, ResourceSchema, ResourceStatus};
pub use store::{Criteria, Row, Store};
