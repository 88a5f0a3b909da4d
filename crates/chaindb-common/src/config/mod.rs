//! Configuration for ChainDB.

mod database;

pub use database::DatabaseConfig;
