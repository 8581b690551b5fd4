//! # curator-core: Pure Business Logic for Curator
//!
//! This crate is the **heart** of Curator. It contains all catalog logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Curator Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 curator-shop (orchestration)                    │   │
//! │  │   live fetch ──► differ ──► stage ──► committer ──► publish     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ curator-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ hierarchy │  │   diff    │  │   │
//! │  │   │  Variant  │  │   Money   │  │ SPU nodes │  │ snapshots │  │   │
//! │  │   │ ProductNode│ │  coercion │  │ aggregates│  │  buckets  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐                                 │   │
//! │  │   │   stage   │  │ validation│                                 │   │
//! │  │   │ EditBuffer│  │   rules   │                                 │   │
//! │  │   └───────────┘  └───────────┘                                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    curator-db (Database Layer)                  │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Variant, ProductNode, ListingDraft, …)
//! - [`money`] - Money type with integer cents and lossless wire coercion
//! - [`hierarchy`] - Flat variant rows → SPU/variant tree with aggregates
//! - [`diff`] - Local vs live snapshot comparison
//! - [`stage`] - Uncommitted edit buffer with accept/reject diff gate
//! - [`error`] - Domain error types
//! - [`validation`] - Operator input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64), so string
//!    and numeric wire prices compare exactly after coercion
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod diff;
pub mod error;
pub mod hierarchy;
pub mod money;
pub mod stage;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use curator_core::Money` instead of
// `use curator_core::money::Money`

pub use diff::{diff_snapshots, ChangedField, DiffReport, VariantDiff};
pub use error::{CoreError, CoreResult, ValidationError};
pub use hierarchy::build_hierarchy;
pub use money::{coerce_money, Money};
pub use stage::{EditBuffer, EntityEdits};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Trailing window for the "recently touched fields" display tracker.
///
/// ## Why a constant?
/// The window is a UI-display convenience, not a correctness mechanism;
/// one shared constant keeps the buffer and its tests honest about that.
pub const RECENT_EDIT_WINDOW_SECS: i64 = 60;

/// Default page size for live catalog fetches.
///
/// Pagination continues until a page returns fewer than this many items.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Default chunk size for bounded parallel database-merge batches.
///
/// A tunable, not a correctness constraint: it bounds simultaneous
/// outbound connections without serializing the whole job.
pub const DEFAULT_CHUNK_SIZE: usize = 20;
