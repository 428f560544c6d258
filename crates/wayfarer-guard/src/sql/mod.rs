//! SQL record store.
//!
//! Persists profiles, images and experiences in PostgreSQL or SQLite through
//! SQLx.
//!
//! # Example
//!
//! ```ignore
//! use wayfarer_guard::sql::{SqlStore, SqlStoreConfig};
//!
//! let store = SqlStore::connect(
//!     SqlStoreConfig::new("sqlite:wayfarer.db").init_schema(true),
//! ).await?;
//! ```
//!
//! # Database Schema
//!
//! ```sql
//! CREATE TABLE user_profiles (
//!     id TEXT PRIMARY KEY,
//!     email TEXT,
//!     subscription_tier TEXT NOT NULL DEFAULT 'free',
//!     storage_used_bytes BIGINT NOT NULL DEFAULT 0,
//!     last_clamped_bytes BIGINT NOT NULL DEFAULT 0,
//!     created_at BIGINT NOT NULL,
//!     updated_at BIGINT NOT NULL
//! );
//!
//! CREATE TABLE experiences (id TEXT PRIMARY KEY, owner_id TEXT NOT NULL, title TEXT NOT NULL, created_at BIGINT NOT NULL);
//!
//! CREATE TABLE images (
//!     id TEXT PRIMARY KEY,
//!     owner_id TEXT NOT NULL,
//!     storage_path TEXT NOT NULL UNIQUE,
//!     experience_id TEXT,
//!     metadata TEXT NOT NULL DEFAULT '{}',  -- JSON object
//!     size_bytes BIGINT NOT NULL DEFAULT 0,
//!     created_at BIGINT NOT NULL,
//!     updated_at BIGINT NOT NULL
//! );
//! ```
//!
//! [`SqlStore::init_schema`] creates these tables.

mod backend;
mod config;
mod queries;

#[cfg(test)]
mod tests;

pub use backend::{DatabaseType, SqlStore};
pub use config::SqlStoreConfig;
