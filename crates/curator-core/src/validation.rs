//! # Validation Module
//!
//! Input validation utilities for Curator.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE - operator input checked before any network      │
//! │           or database call; bad input is rejected before any           │
//! │           side effect happens                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  └── PRIMARY KEY / UNIQUE constraints                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Platform (structured user errors on create)                  │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{ValidationError, ValidationResult};
use crate::money::Money;
use crate::types::DraftData;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product/draft title.
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most 255 characters
pub fn validate_title(title: &str) -> ValidationResult<()> {
    let title = title.trim();

    if title.is_empty() {
        return Err(ValidationError::Required {
            field: "title".to_string(),
        });
    }

    if title.len() > 255 {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: 255,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an operator-typed money string (cost, price override).
///
/// Rejects non-numeric and negative input before any network call.
pub fn validate_money_input(field: &str, input: &str) -> ValidationResult<Money> {
    let money = Money::parse(input).map_err(|e| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: e.to_string(),
    })?;

    if money.cents() < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }

    Ok(money)
}

/// Validates an inventory quantity (manual override or draft stock).
pub fn validate_quantity(field: &str, quantity: i64) -> ValidationResult<()> {
    if quantity < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }

    // SQLite and the platform both cap well below this; the bound catches
    // fat-fingered paste input.
    const MAX_QUANTITY: i64 = 1_000_000;
    if quantity > MAX_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// Draft Validators
// =============================================================================

/// Validates a draft before it may be published.
///
/// ## Rules
/// - Title present
/// - Every explicit variant's option values match the declared option axes
/// - Quantities non-negative
pub fn validate_draft_for_publish(data: &DraftData) -> ValidationResult<()> {
    validate_title(&data.title)?;

    for variant in &data.variants {
        if !data.options.is_empty() && variant.option_values.len() != data.options.len() {
            return Err(ValidationError::InvalidFormat {
                field: "variants".to_string(),
                reason: format!(
                    "variant '{}' has {} option values, expected {}",
                    variant.title,
                    variant.option_values.len(),
                    data.options.len()
                ),
            });
        }
        if let Some(qty) = variant.inventory_quantity {
            validate_quantity("inventory_quantity", qty)?;
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
