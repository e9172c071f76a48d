use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::queue::{DripQueue, FallbackStore};
use crate::{DEFAULT_USERNAME, THINKING_PLACEHOLDER};

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

typed_id!(DripId);
typed_id!(CommentId);
typed_id!(AchievementId);

impl DripId {
    /// Id for a user-submitted drip. AI drips arrive with shell-assigned ids,
    /// bundled samples carry fixed literals.
    pub fn for_user_submission(now: UnixTimeMs) -> Self {
        Self(format!("{}-user", now.0))
    }
}

impl CommentId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// Explicit timestamp unit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct UnixTimeMs(pub u64);

impl UnixTimeMs {
    pub fn now() -> Self {
        let ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self(ms)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

/// One unit of feed content: a fact, a meme-style caption, and media that is
/// either a remote reference or an inline data URI.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Drip {
    pub id: DripId,
    pub fact: String,
    pub caption: String,
    pub media_url: String,
    pub media_kind: MediaKind,
    #[serde(default)]
    pub is_user_generated: bool,
    #[serde(default)]
    pub author: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    pub username: String,
    pub region: String,
    pub drips_viewed: u32,
    pub favorites_saved: u32,
    pub comments_made: u32,
    pub drips_created: u32,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
            region: String::new(),
            drips_viewed: 0,
            favorites_saved: 0,
            comments_made: 0,
            drips_created: 0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Comment {
    pub id: CommentId,
    pub drip_id: DripId,
    pub author: String,
    pub text: String,
    pub created_at_ms: UnixTimeMs,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UnlockedAchievement {
    pub achievement_id: AchievementId,
    pub unlocked_at_ms: UnixTimeMs,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExplanationMode {
    Simple,
    Deep,
}

impl ExplanationMode {
    pub const fn title(self) -> &'static str {
        match self {
            Self::Simple => "Explained Simply",
            Self::Deep => "Diving Deeper",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Explanation {
    pub title: String,
    pub content: String,
}

impl Explanation {
    pub fn pending(mode: ExplanationMode) -> Self {
        Self {
            title: mode.title().to_string(),
            content: THINKING_PLACEHOLDER.to_string(),
        }
    }
}

/// The finite set of screens the shell can render.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppMode {
    Welcome,
    Preferences,
    #[default]
    Loading,
    Content,
    Error,
    Profile,
    Explaining,
    Uploading,
}

/// Two-state machine guarding `advance()`: the head is popped only when the
/// exit transition settles, so overlapping advances collapse to one pop.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Transition {
    #[default]
    Idle,
    Exiting,
}

/// Soft warning shown when the feed is served from a fallback tier.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedNotice {
    StaleContent,
    SampleContent,
}

impl FeedNotice {
    pub const fn message(self) -> &'static str {
        match self {
            Self::StaleContent => "Couldn't fetch new content. Showing older drips.",
            Self::SampleContent => "Couldn't connect. Showing some of our favorite drips.",
        }
    }
}

/// Startup handshake: the initial load decision needs both the persisted
/// preferences and a region before it can run, and must run exactly once.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct BootState {
    pub preferences_loaded: bool,
    pub region_resolved: bool,
    pub completed: bool,
}

impl BootState {
    pub fn ready(self) -> bool {
        self.preferences_loaded && self.region_resolved && !self.completed
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Model {
    pub mode: AppMode,
    pub boot: BootState,

    // Feed
    pub queue: DripQueue,
    pub fallback: FallbackStore,
    pub fetch_in_flight: bool,
    pub transition: Transition,
    pub is_refreshing: bool,
    pub notice: Option<FeedNotice>,

    // User
    pub preferences: Vec<String>,
    pub detected_region: String,
    pub profile: UserProfile,
    pub favorites: Vec<Drip>,
    pub comments: HashMap<DripId, Vec<Comment>>,
    pub unlocked: Vec<UnlockedAchievement>,

    // Overlays
    pub active_toast: Option<AchievementId>,
    pub explanation: Option<Explanation>,
    pub error: Option<crate::AppError>,
    pub form_error: Option<String>,
}

impl Model {
    /// Region used for generation requests: the profile's saved region once
    /// onboarding has set one, otherwise whatever GeoLookup detected.
    pub fn active_region(&self) -> String {
        if self.profile.region.is_empty() {
            self.detected_region.clone()
        } else {
            self.profile.region.clone()
        }
    }

    pub fn is_favorite(&self, id: &DripId) -> bool {
        self.favorites.iter().any(|d| &d.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_submission_ids_carry_the_user_suffix() {
        let id = DripId::for_user_submission(UnixTimeMs(1700000000000));
        assert_eq!(id.as_str(), "1700000000000-user");
    }

    #[test]
    fn default_profile_matches_first_run() {
        let profile = UserProfile::default();
        assert_eq!(profile.username, DEFAULT_USERNAME);
        assert!(profile.region.is_empty());
        assert_eq!(profile.drips_viewed, 0);
    }

    #[test]
    fn active_region_prefers_saved_profile_region() {
        let mut model = Model {
            detected_region: "Japan".into(),
            ..Model::default()
        };
        assert_eq!(model.active_region(), "Japan");

        model.profile.region = "Brazil".into();
        assert_eq!(model.active_region(), "Brazil");
    }

    #[test]
    fn drip_tolerates_missing_optional_fields() {
        let json = r#"{
            "id": "sample-1",
            "fact": "f",
            "caption": "c",
            "media_url": "asset://x",
            "media_kind": "image"
        }"#;
        let drip: Drip = serde_json::from_str(json).expect("decode");
        assert!(!drip.is_user_generated);
        assert!(drip.author.is_none());
    }

    #[test]
    fn boot_state_is_ready_exactly_once() {
        let mut boot = BootState::default();
        assert!(!boot.ready());
        boot.preferences_loaded = true;
        assert!(!boot.ready());
        boot.region_resolved = true;
        assert!(boot.ready());
        boot.completed = true;
        assert!(!boot.ready());
    }
}
