//! # Shop Error Types
//!
//! Error types for platform and orchestration operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Shop Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Platform            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  RequestFailed  │  │  UserErrors (create)    │ │
//! │  │  ConfigLoad     │  │  HttpStatus     │  │  MissingLocation        │ │
//! │  │                 │  │  Decode         │  │  MissingInventoryItem   │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌──────────────────────────┐  ┌──────────────────────────────────┐    │
//! │  │    Wrapped layers        │  │     Data integrity               │    │
//! │  │                          │  │                                  │    │
//! │  │  Db(DbError)             │  │  VariantCountMismatch            │    │
//! │  │  Core(CoreError)         │  │  InvalidRemoteId                 │    │
//! │  └──────────────────────────┘  └──────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for shop operations.
pub type ShopResult<T> = Result<T, ShopError>;

/// A single structured validation error returned by the platform.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct UserError {
    /// Dotted field path, e.g. `variants[0].price`.
    #[serde(default)]
    pub field: Option<String>,
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

impl std::fmt::Display for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{field}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Shop error type covering config, transport, and platform failures.
///
/// ## Design Principles
/// - Each variant includes enough context for debugging
/// - Platform user errors keep their structured form so callers can
///   surface them field-by-field instead of as one opaque string
/// - All errors are `Send + Sync` for async compatibility
#[derive(Debug, Error)]
pub enum ShopError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid shop configuration.
    #[error("Invalid shop configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// HTTP request could not be sent or completed.
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Platform answered with a non-success status.
    #[error("Platform returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Response body did not match the expected shape.
    #[error("Failed to decode platform response: {0}")]
    Decode(String),

    // =========================================================================
    // Platform Errors
    // =========================================================================
    /// The platform rejected a create/update with structured validation
    /// errors. Nothing was created.
    #[error("Platform rejected the request: {}", format_user_errors(.0))]
    UserErrors(Vec<UserError>),

    /// No active location exists on the shop.
    #[error("No active inventory location found on the shop")]
    MissingLocation,

    /// A created variant came back without an inventory item id.
    #[error("Variant {variant_id} has no inventory item id")]
    MissingInventoryItem { variant_id: i64 },

    /// The platform returned a different number of variants than sent.
    #[error("Variant count mismatch: sent {sent}, platform returned {returned}")]
    VariantCountMismatch { sent: usize, returned: usize },

    /// A platform gid could not be parsed into a numeric id.
    #[error("Invalid remote id: {0}")]
    InvalidRemoteId(String),

    // =========================================================================
    // Wrapped Layers
    // =========================================================================
    /// Database layer error.
    #[error(transparent)]
    Db(#[from] curator_db::DbError),

    /// Core domain error.
    #[error(transparent)]
    Core(#[from] curator_core::CoreError),
}

impl From<reqwest::Error> for ShopError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ShopError::Decode(err.to_string())
        } else {
            ShopError::RequestFailed(err.to_string())
        }
    }
}

fn format_user_errors(errors: &[UserError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Unit Tests
// =============================================================================
