pub mod memory;
pub mod postgres;

pub use memory::InMemoryRevocationRegistry;
pub use postgres::PostgresRevocationRegistry;
