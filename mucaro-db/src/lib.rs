//! # Mucaro database layer
//!
//! Connection lifecycle management, schema migration, and validated CRUD
//! operations backing the Mucaro todo application. Route handlers, UI, and
//! the authentication protocol live elsewhere; they consume this crate's
//! operations and error taxonomy.
//!
//! ## Module Organization
//!
//! - `config`: environment-driven connection configuration
//! - `db`: connection pool, lifecycle manager, and migration runner
//! - `schema`: canonical table descriptors and validation rules
//! - `models`: typed CRUD operations per entity
//! - `error`: the crate's error taxonomy
//!
//! ## Example
//!
//! ```no_run
//! use mucaro_db::db::manager::ConnectionManager;
//! use mucaro_db::models::todo::{CreateTodo, Todo};
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = ConnectionManager::from_env()?;
//!     let pool = manager.get().await?; // migrations run here, once
//!
//!     let todo = Todo::create(&pool, CreateTodo {
//!         user_id: Uuid::new_v4(),
//!         title: "Buy milk".to_string(),
//!         description: None,
//!         priority: None,
//!         due_date: None,
//!     })
//!     .await?;
//!     println!("created {}", todo.id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod schema;

/// Current version of the mucaro database layer
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
