//! Infrastructure Layer
//!
//! Store implementations: PostgreSQL for production, in-memory for
//! development and tests.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgRbacRepository;
