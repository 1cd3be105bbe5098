//! SQLite persistence.
//!
//! - `init_db` opens the pool, applies pragmas and the schema
//! - `Repository` implements every store trait over that pool

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::Repository;
