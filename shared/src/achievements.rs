use std::collections::HashSet;

use crate::model::{UnlockedAchievement, UserProfile};

/// Which profile counter a rule watches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatCounter {
    DripsViewed,
    FavoritesSaved,
    CommentsMade,
    DripsCreated,
}

impl StatCounter {
    pub fn read(self, profile: &UserProfile) -> u32 {
        match self {
            Self::DripsViewed => profile.drips_viewed,
            Self::FavoritesSaved => profile.favorites_saved,
            Self::CommentsMade => profile.comments_made,
            Self::DripsCreated => profile.drips_created,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AchievementRule {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub counter: StatCounter,
    pub threshold: u32,
}

/// Table order is evaluation order; when several rules unlock on the same
/// action the first one in the table gets the toast.
pub const ACHIEVEMENTS: &[AchievementRule] = &[
    AchievementRule {
        id: "view_1",
        title: "Curious Newbie",
        description: "View your first Drip.",
        icon: "💧",
        counter: StatCounter::DripsViewed,
        threshold: 1,
    },
    AchievementRule {
        id: "view_10",
        title: "Brain Feeder",
        description: "View 10 Drips.",
        icon: "🧠",
        counter: StatCounter::DripsViewed,
        threshold: 10,
    },
    AchievementRule {
        id: "view_50",
        title: "Knowledge Junkie",
        description: "View 50 Drips.",
        icon: "📚",
        counter: StatCounter::DripsViewed,
        threshold: 50,
    },
    AchievementRule {
        id: "view_100",
        title: "Sage in Training",
        description: "View 100 Drips.",
        icon: "🦉",
        counter: StatCounter::DripsViewed,
        threshold: 100,
    },
    AchievementRule {
        id: "fav_1",
        title: "First Find",
        description: "Favorite your first Drip.",
        icon: "❤️",
        counter: StatCounter::FavoritesSaved,
        threshold: 1,
    },
    AchievementRule {
        id: "fav_10",
        title: "Collector",
        description: "Favorite 10 Drips.",
        icon: "💎",
        counter: StatCounter::FavoritesSaved,
        threshold: 10,
    },
    AchievementRule {
        id: "fav_25",
        title: "Curator",
        description: "Favorite 25 Drips.",
        icon: "🖼️",
        counter: StatCounter::FavoritesSaved,
        threshold: 25,
    },
    AchievementRule {
        id: "comment_1",
        title: "First Words",
        description: "Write your first comment.",
        icon: "💬",
        counter: StatCounter::CommentsMade,
        threshold: 1,
    },
    AchievementRule {
        id: "comment_10",
        title: "Social Butterfly",
        description: "Write 10 comments.",
        icon: "🦋",
        counter: StatCounter::CommentsMade,
        threshold: 10,
    },
    AchievementRule {
        id: "create_1",
        title: "Creator",
        description: "Create your first Drip.",
        icon: "🎨",
        counter: StatCounter::DripsCreated,
        threshold: 1,
    },
    AchievementRule {
        id: "create_5",
        title: "Meme Lord",
        description: "Create 5 Drips.",
        icon: "👑",
        counter: StatCounter::DripsCreated,
        threshold: 5,
    },
];

pub fn find(id: &str) -> Option<&'static AchievementRule> {
    ACHIEVEMENTS.iter().find(|rule| rule.id == id)
}

/// Rules whose threshold the profile now meets and which are not yet in the
/// unlocked set, in table order. Already-unlocked ids never come back.
pub fn newly_unlocked(
    profile: &UserProfile,
    unlocked: &[UnlockedAchievement],
) -> Vec<&'static AchievementRule> {
    let have: HashSet<&str> = unlocked
        .iter()
        .map(|u| u.achievement_id.as_str())
        .collect();

    ACHIEVEMENTS
        .iter()
        .filter(|rule| !have.contains(rule.id) && rule.counter.read(profile) >= rule.threshold)
        .collect()
}
