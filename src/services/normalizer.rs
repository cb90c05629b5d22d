use std::collections::HashSet;

use crate::models::{ProductId, RawRecommendation};

/// Default maximum number of recommended products per request
pub const DEFAULT_RESULT_CAP: usize = 10;

/// Default size of the recommendation service's id space (ids 1..=200)
pub const DEFAULT_NATIVE_RANGE: i64 = 200;

/// Catalogs at or below this size use a plain modulo remap
pub const DIRECT_REMAP_MAX: i64 = 10;

/// Maps recommendation-service ids onto ids that are valid for the current catalog
///
/// Three policies, chosen by catalog size:
/// 1. `catalog_size >= native_range`: ids pass through unchanged (deduplicated, uncapped).
/// 2. `catalog_size <= DIRECT_REMAP_MAX`: `(id mod catalog_size) + 1`.
/// 3. Otherwise: ids are sorted, remapped with `(stable_hash(id) mod catalog_size) + 1`,
///    then truncated to `min(catalog_size, result_cap)`.
///
/// Every result is deduplicated (first occurrence wins) and sorted ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdNormalizer {
    result_cap: usize,
    native_range: i64,
}

impl Default for IdNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_RESULT_CAP, DEFAULT_NATIVE_RANGE)
    }
}

impl IdNormalizer {
    /// Both values are validated at startup by `Config::validate`
    pub fn new(result_cap: usize, native_range: i64) -> Self {
        Self {
            result_cap,
            native_range,
        }
    }

    pub fn result_cap(&self) -> usize {
        self.result_cap
    }

    pub fn native_range(&self) -> i64 {
        self.native_range
    }

    pub fn normalize(&self, raw: &[RawRecommendation], catalog_size: i64) -> Vec<ProductId> {
        if raw.is_empty() || catalog_size <= 0 {
            return Vec::new();
        }

        let mut ids = if catalog_size >= self.native_range {
            self.pass_through(raw, catalog_size)
        } else if catalog_size <= DIRECT_REMAP_MAX {
            self.direct_remap(raw, catalog_size)
        } else {
            self.hashed_remap(raw, catalog_size)
        };

        ids.sort_unstable();

        tracing::debug!(
            raw = raw.len(),
            catalog_size,
            normalized = ?ids,
            "Normalized recommendation ids"
        );

        ids
    }

    fn pass_through(&self, raw: &[RawRecommendation], catalog_size: i64) -> Vec<ProductId> {
        // Ids outside the catalog could never resolve to a product
        dedup_first(
            raw.iter()
                .map(|r| r.external_id)
                .filter(|id| (1..=catalog_size).contains(id)),
        )
    }

    fn direct_remap(&self, raw: &[RawRecommendation], catalog_size: i64) -> Vec<ProductId> {
        let mut ids = dedup_first(
            raw.iter()
                .map(|r| r.external_id.rem_euclid(catalog_size) + 1),
        );
        ids.truncate(self.cap_for(catalog_size));
        ids
    }

    fn hashed_remap(&self, raw: &[RawRecommendation], catalog_size: i64) -> Vec<ProductId> {
        let mut external: Vec<i64> = raw.iter().map(|r| r.external_id).collect();
        external.sort_unstable();

        let buckets = catalog_size as u64;
        let mut ids = dedup_first(
            external
                .into_iter()
                .map(|id| (stable_hash(id as u64) % buckets) as i64 + 1),
        );
        ids.truncate(self.cap_for(catalog_size));
        ids
    }

    fn cap_for(&self, catalog_size: i64) -> usize {
        let size = usize::try_from(catalog_size).unwrap_or(usize::MAX);
        size.min(self.result_cap)
    }
}

/// SplitMix64 output function: add the golden-ratio increment, then mix.
///
/// `stable_hash(0) == 0xE220A8397B1DCDAF`. Must never change: it decides which
/// products get recommended.
pub fn stable_hash(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn dedup_first(ids: impl Iterator<Item = ProductId>) -> Vec<ProductId> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}
