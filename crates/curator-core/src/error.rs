//! # Error Types
//!
//! Domain-specific error types for curator-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  curator-core errors (this file)                                       │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  curator-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  curator-shop errors (separate crate)                                  │
//! │  └── ShopError        - Platform API / pipeline failures               │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError/ShopError → Caller        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (variant id, field name, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent catalog rule violations or domain logic failures.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Variant cannot be found in the local snapshot.
    #[error("Variant not found: {0}")]
    VariantNotFound(i64),

    /// Listing draft cannot be found.
    #[error("Draft not found: {0}")]
    DraftNotFound(String),

    /// A monetary value could not be parsed.
    ///
    /// ## When This Occurs
    /// - The platform sends a malformed price string
    /// - An operator types a non-numeric cost
    #[error("Invalid money value '{value}': {reason}")]
    InvalidMoney { value: String, reason: String },

    /// A staged edit targets a field the committer does not know how to merge.
    #[error("Unknown staged field '{field}' for entity {entity_id}")]
    UnknownStagedField { entity_id: i64, field: String },

    /// A staged value does not fit the field it targets.
    #[error("Invalid value for '{field}': {reason}")]
    InvalidFieldValue { field: String, reason: String },

    /// A draft is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Trying to mark a draft ready twice
    /// - Mutating draft data after a publish started
    #[error("Draft {draft_id} is {current_status}, cannot perform operation")]
    InvalidDraftStatus {
        draft_id: String,
        current_status: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when operator input doesn't meet requirements.
/// Used for early validation before any network or database call.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (e.g., non-numeric price string).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Convenience type alias for Results with ValidationError.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================
