//! # curator-shop: Platform Adapter & Reconciliation Engine
//!
//! This crate owns every call to the external commerce platform and the
//! orchestration built on top of curator-core and curator-db.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Reconciliation Flow                              │
//! │                                                                         │
//! │  platform ──► fetch (live snapshot) ──┐                                │
//! │                                       ├──► diff ──► stage ──►          │
//! │  curator-db ──► stored snapshot ──────┘        committer ──► curator-db│
//! │                                                                         │
//! │                        Publish Flow                                     │
//! │                                                                         │
//! │  draft store ──► publish pipeline ──► platform ──► draft store         │
//! │                                                    (push-state flag)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`client`] - The [`ShopClient`](client::ShopClient) trait and its
//!   HTTP implementation
//! - [`config`] - TOML configuration for connection and tuning
//! - [`fetch`] - Paginated live-catalog fetch, wire to core lowering
//! - [`batch`] - Bounded parallel chunk execution
//! - [`committer`] - Staged-edit persistence with per-entity isolation
//! - [`publish`] - Draft to remote product pipeline
//! - [`error`] - Shop error types

// =============================================================================
// Module Declarations
// =============================================================================

pub mod batch;
pub mod client;
pub mod committer;
pub mod config;
pub mod error;
pub mod fetch;
pub mod publish;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use batch::run_chunked;
pub use client::{RestShopClient, ShopClient};
pub use committer::{CommitPlan, CommitReport, ReconciliationCommitter};
pub use config::ShopConfig;
pub use error::{ShopError, ShopResult, UserError};
pub use fetch::fetch_live_snapshot;
pub use publish::{PublishOutcome, PublishPipeline, PublishState};
