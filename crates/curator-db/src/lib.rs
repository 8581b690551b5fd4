//! # curator-db: Storage Layer for Curator
//!
//! This crate provides database access for the catalog mirror and the
//! listing draft store. It uses SQLite for local storage with sqlx for
//! async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Curator Data Flow                                │
//! │                                                                         │
//! │  curator-shop (sync, committer, publish)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     curator-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ VariantRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ DraftRepo     │    │ 001_init.sql │  │   │
//! │  │   │ Management    │    │               │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (one file per shop, WAL mode)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (variant, draft)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use curator_db::{Database, DbConfig};
//!
//! let config = DbConfig::new("path/to/catalog.sqlite");
//! let db = Database::new(config).await?;
//!
//! let snapshot = db.variants().list_all().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::draft::DraftRepository;
pub use repository::variant::{FieldPatch, VariantRepository};
