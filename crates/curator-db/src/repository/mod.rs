//! # Repository Layer
//!
//! One repository per aggregate, each owning a clone of the pool.

pub mod draft;
pub mod variant;

pub use draft::DraftRepository;
pub use variant::{FieldPatch, VariantRepository};
