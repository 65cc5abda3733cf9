/// Database module for PostgreSQL integration
///
/// This module provides:
/// - A pooled connection handle with embedded migrations
/// - Repository traits for raw samples and daily summaries
/// - Database models and schema
/// - Diesel ORM integration

pub mod connection;
pub mod models;
pub mod repositories;
pub mod schema;

pub use connection::{establish_connection_pool, DatabaseError, DatabasePool};
