use crate::model::{Drip, FeedNotice};
use crate::queue::FallbackStore;
use crate::samples;

/// A content source tried when live generation produces nothing. Tiers are
/// walked in `FALLBACK_ORDER`; the first one that yields items wins, and
/// exhausting the list is the hard-error case. Adding or reordering tiers is
/// an edit to the order constant, not to control flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FallbackTier {
    /// Most recent successfully generated drips, mirrored from the durable
    /// cache.
    CachedDrips,
    /// Samples compiled into the app, for first runs with no cache yet.
    BundledSamples,
}

pub const FALLBACK_ORDER: &[FallbackTier] = &[FallbackTier::CachedDrips, FallbackTier::BundledSamples];

impl FallbackTier {
    pub const fn name(self) -> &'static str {
        match self {
            Self::CachedDrips => "cached_drips",
            Self::BundledSamples => "bundled_samples",
        }
    }

    pub const fn notice(self) -> FeedNotice {
        match self {
            Self::CachedDrips => FeedNotice::StaleContent,
            Self::BundledSamples => FeedNotice::SampleContent,
        }
    }

    pub fn drips(self, store: &FallbackStore) -> Vec<Drip> {
        match self {
            Self::CachedDrips => store.drips().to_vec(),
            Self::BundledSamples => samples::bundled_drips(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_tier_is_tried_before_samples() {
        assert_eq!(
            FALLBACK_ORDER,
            &[FallbackTier::CachedDrips, FallbackTier::BundledSamples]
        );
    }

    #[test]
    fn empty_cache_tier_yields_nothing() {
        let store = FallbackStore::default();
        assert!(FallbackTier::CachedDrips.drips(&store).is_empty());
        assert!(!FallbackTier::BundledSamples.drips(&store).is_empty());
    }
}
