//! Item boundary and catalog cache.
//!
//! Item data (model locators, physical dimensions, tracking targets) is
//! supplied by an external collaborator; this module defines the immutable
//! per-item record the interaction core consumes, plus a time-expiring
//! cache over a fetched item list. The cache owns no fetch logic — callers
//! store what they fetched and the cache answers until the TTL lapses.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::Clock;
use crate::pose::PhysicalDimensions;

/// Default cache lifetime for a fetched item list.
pub const DEFAULT_CATALOG_TTL: Duration = Duration::from_secs(5 * 60);

/// An item that can be experienced in AR.
///
/// Immutable once fetched. Resource locators are optional: an item without
/// a model cannot be placed, an item without a tracking target cannot be
/// scanned, and those absences surface as configuration errors in the
/// respective controllers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Stable identifier used in routes and lookups.
    pub slug: String,
    /// Display title.
    pub title: String,
    /// Catalog category.
    pub category: String,
    /// Optional long description.
    #[serde(default)]
    pub description: Option<String>,
    /// GLB model resource locator for placement mode.
    #[serde(default)]
    pub model_locator: Option<String>,
    /// USDZ model resource locator for iOS-class delivery.
    #[serde(default)]
    pub usdz_locator: Option<String>,
    /// Tracking-target resource locator for scan mode.
    #[serde(default)]
    pub target_locator: Option<String>,
    /// Physical width in meters.
    #[serde(default)]
    pub width_m: Option<f64>,
    /// Physical height in meters.
    #[serde(default)]
    pub height_m: Option<f64>,
    /// Physical depth in meters.
    #[serde(default)]
    pub depth_m: Option<f64>,
}

impl Item {
    /// The item's physical dimensions, when all three are present.
    ///
    /// Auto-scaling requires the complete set; partial dimensions are
    /// treated as absent.
    pub fn physical_dimensions(&self) -> Option<PhysicalDimensions> {
        match (self.width_m, self.height_m, self.depth_m) {
            (Some(w), Some(h), Some(d)) => Some(PhysicalDimensions::new(w, h, d)),
            _ => None,
        }
    }
}

/// Fallback item shown when the catalog is empty or unreachable.
///
/// Keeps the experience usable without any backend data.
pub fn demo_item() -> Item {
    Item {
        slug: "demo-cube".to_string(),
        title: "Demo Cube (3D Test)".to_string(),
        category: "electronics".to_string(),
        description: Some(
            "A simple 3D cube to test AR viewing capabilities.".to_string(),
        ),
        model_locator: Some(
            "https://modelviewer.dev/shared-assets/models/Astronaut.glb".to_string(),
        ),
        usdz_locator: None,
        target_locator: None,
        width_m: None,
        height_m: None,
        depth_m: None,
    }
}

struct CachedCatalog {
    items: Vec<Item>,
    stored_at: Instant,
}

/// Time-expiring cache over a fetched item list.
///
/// Expiry is computed against an injected [`Clock`], so it is testable
/// without waiting.
pub struct CatalogCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    cached: Option<CachedCatalog>,
}

impl CatalogCache {
    /// Create an empty cache with the given TTL.
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            ttl,
            clock,
            cached: None,
        }
    }

    /// Create an empty cache with [`DEFAULT_CATALOG_TTL`].
    pub fn with_default_ttl(clock: Arc<dyn Clock>) -> Self {
        Self::new(clock, DEFAULT_CATALOG_TTL)
    }

    /// Store a freshly fetched item list, resetting the expiry window.
    pub fn store(&mut self, items: Vec<Item>) {
        debug!(count = items.len(), "catalog cached");
        self.cached = Some(CachedCatalog {
            items,
            stored_at: self.clock.now(),
        });
    }

    /// The cached items, or `None` when nothing is stored or the entry has
    /// expired.
    pub fn get(&self) -> Option<&[Item]> {
        let cached = self.cached.as_ref()?;
        if self.is_expired(self.clock.now()) {
            return None;
        }
        Some(&cached.items)
    }

    /// Look up a cached item by slug (respects expiry).
    pub fn find_by_slug(&self, slug: &str) -> Option<&Item> {
        self.get()?.iter().find(|item| item.slug == slug)
    }

    /// Cached items in the given category; `"all"` returns everything.
    pub fn filter_category(&self, category: &str) -> Vec<&Item> {
        match self.get() {
            Some(items) if category == "all" => items.iter().collect(),
            Some(items) => items.iter().filter(|i| i.category == category).collect(),
            None => Vec::new(),
        }
    }

    /// Drop the cached list immediately.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Whether the cached entry (if any) has passed its TTL at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        match &self.cached {
            Some(cached) => now.duration_since(cached.stored_at) >= self.ttl,
            None => true,
        }
    }
}
