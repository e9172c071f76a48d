use crux_kv::error::KeyValueError;
use serde::{Deserialize, Serialize};

use crate::capabilities::{BatchOutcome, GeneratorError};
use crate::model::{DripId, ExplanationMode, MediaKind};
use crate::storage::StorageKey;

/// Why a batch was requested; decides how its results merge into the queue.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchPurpose {
    /// First load for the current preferences; installs the queue, or walks
    /// the fallback tiers when nothing came back.
    Initial,
    /// Background top-up; appends behind the current head, silent on failure.
    Refill,
    /// Pull-to-refresh; replaces the queue, leaves it untouched on failure.
    Refresh,
}

/// A user-submitted drip before validation. `size_bytes` is the media file
/// size as the shell read it, checked against the upload limit.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UserDripPayload {
    pub fact: String,
    pub caption: String,
    pub media_url: String,
    pub media_kind: MediaKind,
    pub size_bytes: u64,
}

type KvRead = Result<Option<Vec<u8>>, KeyValueError>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Event {
    AppStarted,

    // Boot hydration from the durable cache; every read tolerates
    // missing/corrupt data.
    PreferencesHydrated(KvRead),
    ProfileHydrated(KvRead),
    FavoritesHydrated(KvRead),
    CommentsHydrated(KvRead),
    AchievementsHydrated(KvRead),
    FallbackHydrated(KvRead),
    RegionResolved { region: String },

    // Onboarding
    StartRequested,
    PreferencesSubmitted {
        topics: Vec<String>,
        username: String,
        region: String,
    },

    // Queue lifecycle
    LoadRequested,
    BatchSettled {
        purpose: FetchPurpose,
        outcome: BatchOutcome,
    },
    AdvanceRequested,
    AdvanceSettled,
    RefreshRequested,
    RefreshSettled,

    // User actions
    FavoriteToggled { drip_id: DripId },
    CommentSubmitted { drip_id: DripId, text: String },
    UsernameChanged { username: String },
    DripSubmitted(Box<UserDripPayload>),
    ExplainRequested { mode: ExplanationMode },
    ExplanationReady(Result<String, GeneratorError>),

    // Navigation
    ProfileOpened,
    UploaderOpened,
    FeedResumed,

    // Notifications & persistence bookkeeping
    ToastExpired,
    Persisted {
        key: StorageKey,
        result: Result<Option<Vec<u8>>, KeyValueError>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_size_is_reasonable() {
        // Large payloads ride behind a Box to keep the enum small.
        let size = std::mem::size_of::<Event>();
        assert!(
            size <= 128,
            "Event enum is {size} bytes, box more variants"
        );
    }
}
