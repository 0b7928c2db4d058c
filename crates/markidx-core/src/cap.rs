//! Effective-cap policy: how many markups a view may materialize for a
//! document of a given size.

use serde::{Deserialize, Serialize};

/// Shrink factor applied once a document reaches `min_pages`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapTier {
    pub min_pages: usize,
    pub factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapConfiguration {
    pub min_indexed: usize,
    pub max_indexed: usize,
    pub configured_cap: usize,
    pub adaptive_enabled: bool,
    pub tiers: Vec<CapTier>,
}

impl Default for CapConfiguration {
    fn default() -> Self {
        Self {
            min_indexed: 500,
            max_indexed: 100_000,
            configured_cap: 20_000,
            adaptive_enabled: true,
            tiers: default_tiers(),
        }
    }
}

fn default_tiers() -> Vec<CapTier> {
    vec![
        CapTier { min_pages: 600, factor: 0.65 },
        CapTier { min_pages: 1000, factor: 0.45 },
    ]
}

impl CapConfiguration {
    /// Clamps out-of-range inputs instead of rejecting them: swapped bounds
    /// are reordered, tier factors are forced into `(0, 1]` and tiers are
    /// sorted by page threshold.
    #[must_use]
    pub fn normalized(self) -> Self {
        let (min_indexed, max_indexed) = if self.min_indexed <= self.max_indexed {
            (self.min_indexed, self.max_indexed)
        } else {
            (self.max_indexed, self.min_indexed)
        };
        let mut tiers: Vec<CapTier> = self
            .tiers
            .into_iter()
            .map(|t| CapTier {
                min_pages: t.min_pages,
                factor: if t.factor.is_finite() { t.factor.clamp(f64::MIN_POSITIVE, 1.0) } else { 1.0 },
            })
            .collect();
        tiers.sort_by_key(|t| t.min_pages);
        Self {
            min_indexed,
            max_indexed,
            configured_cap: self.configured_cap,
            adaptive_enabled: self.adaptive_enabled,
            tiers,
        }
    }

    /// Shrink factor for a document of `page_count` pages (1.0 below every tier).
    pub fn factor_for(&self, page_count: usize) -> f64 {
        self.tiers
            .iter()
            .filter(|t| page_count >= t.min_pages)
            .max_by_key(|t| t.min_pages)
            .map_or(1.0, |t| t.factor)
    }
}

/// Maximum number of markups a view materializes for a document of
/// `page_count` pages. Always within `[min_indexed, max_indexed]`.
pub fn effective_cap(page_count: usize, config: &CapConfiguration) -> usize {
    let config = config.clone().normalized();
    let mut cap = config.configured_cap;
    if config.adaptive_enabled {
        cap = (cap as f64 * config.factor_for(page_count)).floor() as usize;
    }
    cap.clamp(config.min_indexed, config.max_indexed)
}
