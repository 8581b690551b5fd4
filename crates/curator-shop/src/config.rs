//! # Shop Configuration
//!
//! Configuration for the platform connection and reconciliation behavior.
//!
//! ## Configuration File Format
//! ```toml
//! # shop.toml
//! [shop]
//! domain = "my-store.example-shop.com"
//! access_token = "shpat_xxxxxxxxxxxx"
//! api_version = "2024-07"
//!
//! [sync]
//! page_size = 50    # variants per live fetch page (max 250)
//! chunk_size = 20   # parallel DB writes per commit batch
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{ShopError, ShopResult};
use curator_core::{DEFAULT_CHUNK_SIZE, DEFAULT_PAGE_SIZE};

/// Platform connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopSettings {
    /// Shop domain, e.g. `my-store.example-shop.com`.
    pub domain: String,

    /// Admin API access token, sent as a request header.
    pub access_token: String,

    /// Pinned Admin API version, e.g. `2024-07`.
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

/// Reconciliation tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Variants requested per live fetch page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Parallel writes per commit chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            page_size: DEFAULT_PAGE_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Top-level configuration for curator-shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopConfig {
    pub shop: ShopSettings,

    #[serde(default)]
    pub sync: SyncSettings,
}

impl ShopConfig {
    /// Loads and validates configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ShopResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading shop config");

        let raw = std::fs::read_to_string(path)
            .map_err(|e| ShopError::ConfigLoadFailed(format!("{}: {e}", path.display())))?;
        let config: ShopConfig =
            toml::from_str(&raw).map_err(|e| ShopError::ConfigLoadFailed(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validates field constraints.
    ///
    /// The platform caps page sizes at 250; anything above that would be
    /// silently truncated server-side, so reject it here instead.
    pub fn validate(&self) -> ShopResult<()> {
        if self.shop.domain.trim().is_empty() {
            return Err(ShopError::InvalidConfig("shop.domain is empty".to_string()));
        }
        if self.shop.domain.contains("://") {
            return Err(ShopError::InvalidConfig(
                "shop.domain must be a bare hostname, not a URL".to_string(),
            ));
        }
        if self.shop.access_token.trim().is_empty() {
            return Err(ShopError::InvalidConfig(
                "shop.access_token is empty".to_string(),
            ));
        }
        if self.sync.page_size == 0 || self.sync.page_size > 250 {
            return Err(ShopError::InvalidConfig(format!(
                "sync.page_size must be 1-250, got {}",
                self.sync.page_size
            )));
        }
        if self.sync.chunk_size == 0 {
            return Err(ShopError::InvalidConfig(
                "sync.chunk_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Base URL for the versioned Admin API.
    pub fn api_base(&self) -> String {
        format!(
            "https://{}/admin/api/{}",
            self.shop.domain, self.shop.api_version
        )
    }
}

fn default_api_version() -> String {
    "2024-07".to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

// =============================================================================
// Unit Tests
// =============================================================================
