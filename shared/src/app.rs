use serde::{Deserialize, Serialize};

use crate::achievements::{self, AchievementRule};
use crate::capabilities::Capabilities;
use crate::event::{Event, FetchPurpose, UserDripPayload};
use crate::fallback::FALLBACK_ORDER;
use crate::model::{
    AchievementId, AppMode, Comment, CommentId, Drip, DripId, Explanation, FeedNotice, Model,
    Transition, UnixTimeMs, UnlockedAchievement, UserProfile,
};
use crate::storage::{self, StorageKey};
use crate::{
    AppError, ErrorKind, ADVANCE_SETTLE_MS, DEFAULT_REGION, EXPLAIN_APOLOGY, GEO_ENDPOINT,
    HARD_FAILURE_MESSAGE, INITIAL_FETCH_COUNT, MAX_UPLOAD_BYTES, MAX_USERNAME_CHARS,
    MIN_QUEUE_SIZE, MIN_USERNAME_CHARS, REFILL_COUNT, REFRESH_SETTLE_MS, TOAST_DURATION_MS,
    TOPICS,
};

/// Shape of the ipapi.co response; only the country matters here.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct GeoLookup {
    #[serde(default)]
    pub country_name: Option<String>,
}

fn region_from_lookup(result: crux_http::Result<crux_http::Response<GeoLookup>>) -> String {
    match result {
        Ok(mut response) => response
            .take_body()
            .and_then(|geo| geo.country_name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string()),
        Err(e) => {
            tracing::warn!(error = %e, "region lookup failed, using default");
            DEFAULT_REGION.to_string()
        }
    }
}

#[derive(Default)]
pub struct App;

impl App {
    /// The one mutual-exclusion point in the system: a batch is issued only
    /// when no other batch is outstanding. The guard is set here and cleared
    /// by the single `BatchSettled` event every batch produces, whatever the
    /// mix of per-item outcomes.
    fn request_batch(
        &self,
        purpose: FetchPurpose,
        count: usize,
        model: &mut Model,
        caps: &Capabilities,
    ) -> bool {
        if model.fetch_in_flight {
            tracing::debug!(?purpose, "batch rejected, fetch already in flight");
            return false;
        }
        model.fetch_in_flight = true;

        let topics = model.preferences.clone();
        let region = model.active_region();
        caps.generator.batch(topics, region, count, move |outcome| Event::BatchSettled {
            purpose,
            outcome,
        });
        true
    }

    fn install_queue(
        &self,
        drips: Vec<Drip>,
        notice: Option<FeedNotice>,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        model.queue.replace(drips);
        model.notice = notice;
        model.error = None;
        model.mode = AppMode::Content;
        self.maintain_queue(model, caps);
    }

    /// Walk the fallback tiers in order; the first non-empty one feeds the
    /// queue with its soft warning. Exhaustion is the only path to the hard
    /// error screen.
    fn run_fallback_cascade(&self, model: &mut Model, caps: &Capabilities) {
        for tier in FALLBACK_ORDER {
            let drips = tier.drips(&model.fallback);
            if !drips.is_empty() {
                tracing::info!(tier = tier.name(), "serving fallback tier");
                self.install_queue(drips, Some(tier.notice()), model, caps);
                return;
            }
        }
        model.mode = AppMode::Error;
        model.error = Some(AppError::new(ErrorKind::Generation, HARD_FAILURE_MESSAGE));
    }

    /// Background refill check, re-run whenever the queue length or mode
    /// changes. Never blocks consumption; never stacks fetches.
    fn maintain_queue(&self, model: &mut Model, caps: &Capabilities) {
        if model.mode == AppMode::Content
            && model.queue.len() < MIN_QUEUE_SIZE
            && !model.fetch_in_flight
        {
            self.request_batch(FetchPurpose::Refill, REFILL_COUNT, model, caps);
        }
    }

    /// Mirror a successful batch into the fallback store and write it out.
    /// The write is best-effort; a failure is logged by `Persisted`.
    fn record_fallback(&self, drips: &[Drip], model: &mut Model, caps: &Capabilities) {
        model.fallback.absorb(drips);
        Self::persist(StorageKey::FallbackDrips, &model.fallback.drips().to_vec(), caps);
    }

    fn persist<T: Serialize>(key: StorageKey, value: &T, caps: &Capabilities) {
        if let Some(bytes) = storage::encode(key, value) {
            caps.kv
                .set(key.as_str().to_string(), bytes, move |result| Event::Persisted {
                    key,
                    result,
                });
        }
    }

    fn persist_profile(&self, model: &Model, caps: &Capabilities) {
        Self::persist(StorageKey::Profile, &model.profile, caps);
    }

    /// Re-evaluate the rule table against the profile. All fresh unlocks are
    /// recorded; only the first gets the toast, which the shell clears after
    /// `TOAST_DURATION_MS`. A replacement toast can be cut short by the
    /// earlier timer.
    fn award_achievements(&self, model: &mut Model, caps: &Capabilities) {
        let newly = achievements::newly_unlocked(&model.profile, &model.unlocked);
        if newly.is_empty() {
            return;
        }

        let now = UnixTimeMs::now();
        for rule in &newly {
            tracing::info!(achievement = rule.id, "achievement unlocked");
            model.unlocked.push(UnlockedAchievement {
                achievement_id: AchievementId::new(rule.id),
                unlocked_at_ms: now,
            });
        }
        Self::persist(StorageKey::Achievements, &model.unlocked, caps);

        model.active_toast = Some(AchievementId::new(newly[0].id));
        caps.delay.after_millis(TOAST_DURATION_MS, Event::ToastExpired);
    }

    /// Both hydration flags must be in before the first-load decision, and
    /// the decision runs exactly once.
    fn maybe_finish_boot(&self, model: &mut Model, caps: &Capabilities) {
        if !model.boot.ready() {
            return;
        }
        model.boot.completed = true;

        if model.preferences.is_empty() {
            model.mode = AppMode::Welcome;
            return;
        }
        if model.profile.region.is_empty() {
            model.profile.region = model.detected_region.clone();
            self.persist_profile(model, caps);
        }
        self.load_initial(model, caps);
    }

    fn load_initial(&self, model: &mut Model, caps: &Capabilities) {
        if model.preferences.is_empty() {
            model.mode = AppMode::Preferences;
            return;
        }
        model.mode = AppMode::Loading;
        model.error = None;
        model.notice = None;
        model.queue.clear();
        self.request_batch(FetchPurpose::Initial, INITIAL_FETCH_COUNT, model, caps);
    }

    fn validate_username(username: &str) -> Result<String, String> {
        let trimmed = username.trim();
        let chars = trimmed.chars().count();
        if !(MIN_USERNAME_CHARS..=MAX_USERNAME_CHARS).contains(&chars) {
            return Err(format!(
                "Username must be {MIN_USERNAME_CHARS}-{MAX_USERNAME_CHARS} characters."
            ));
        }
        Ok(trimmed.to_string())
    }

    fn validate_submission(payload: &UserDripPayload) -> Result<(), String> {
        if payload.fact.trim().is_empty()
            || payload.caption.trim().is_empty()
            || payload.media_url.is_empty()
        {
            return Err("Please fill all fields and select a file.".to_string());
        }
        if payload.size_bytes > MAX_UPLOAD_BYTES {
            return Err("File is too large. Max 10MB.".to_string());
        }
        Ok(())
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        match event {
            Event::AppStarted => {
                model.mode = AppMode::Loading;

                caps.kv.get(
                    StorageKey::Preferences.as_str().to_string(),
                    Event::PreferencesHydrated,
                );
                caps.kv.get(
                    StorageKey::Profile.as_str().to_string(),
                    Event::ProfileHydrated,
                );
                caps.kv.get(
                    StorageKey::Favorites.as_str().to_string(),
                    Event::FavoritesHydrated,
                );
                caps.kv.get(
                    StorageKey::Comments.as_str().to_string(),
                    Event::CommentsHydrated,
                );
                caps.kv.get(
                    StorageKey::Achievements.as_str().to_string(),
                    Event::AchievementsHydrated,
                );
                caps.kv.get(
                    StorageKey::FallbackDrips.as_str().to_string(),
                    Event::FallbackHydrated,
                );

                caps.http
                    .get(GEO_ENDPOINT)
                    .expect_json()
                    .send(|result| Event::RegionResolved {
                        region: region_from_lookup(result),
                    });

                caps.render.render();
            }

            Event::PreferencesHydrated(result) => {
                model.preferences = storage::decode_or_default(StorageKey::Preferences, result);
                model.boot.preferences_loaded = true;
                self.maybe_finish_boot(model, caps);
                caps.render.render();
            }

            Event::ProfileHydrated(result) => {
                model.profile = storage::decode_or_default(StorageKey::Profile, result);
                caps.render.render();
            }

            Event::FavoritesHydrated(result) => {
                model.favorites = storage::decode_or_default(StorageKey::Favorites, result);
                caps.render.render();
            }

            Event::CommentsHydrated(result) => {
                model.comments = storage::decode_or_default(StorageKey::Comments, result);
                caps.render.render();
            }

            Event::AchievementsHydrated(result) => {
                model.unlocked = storage::decode_or_default(StorageKey::Achievements, result);
                caps.render.render();
            }

            Event::FallbackHydrated(result) => {
                let stored: Vec<Drip> =
                    storage::decode_or_default(StorageKey::FallbackDrips, result);
                model.fallback.hydrate(stored);
            }

            Event::RegionResolved { region } => {
                model.detected_region = region;
                model.boot.region_resolved = true;
                self.maybe_finish_boot(model, caps);
                caps.render.render();
            }

            Event::StartRequested => {
                if model.mode == AppMode::Welcome {
                    model.mode = AppMode::Preferences;
                    caps.render.render();
                }
            }

            Event::PreferencesSubmitted {
                topics,
                username,
                region,
            } => {
                if topics.is_empty() {
                    model.form_error = Some("Pick at least one topic.".to_string());
                    caps.render.render();
                    return;
                }
                let username = match Self::validate_username(&username) {
                    Ok(name) => name,
                    Err(message) => {
                        model.form_error = Some(message);
                        caps.render.render();
                        return;
                    }
                };
                let region = region.trim().to_string();
                if region.is_empty() {
                    model.form_error = Some("Select a region.".to_string());
                    caps.render.render();
                    return;
                }

                model.form_error = None;
                model.preferences = topics;
                Self::persist(StorageKey::Preferences, &model.preferences, caps);

                model.profile.username = username;
                model.profile.region = region;
                self.persist_profile(model, caps);

                self.load_initial(model, caps);
                caps.render.render();
            }

            Event::LoadRequested => {
                self.load_initial(model, caps);
                caps.render.render();
            }

            Event::BatchSettled { purpose, outcome } => {
                // Guard cleared on every exit path, before anything else.
                model.fetch_in_flight = false;

                if let Ok(drips) = &outcome {
                    if !drips.is_empty() {
                        self.record_fallback(drips, model, caps);
                    }
                }

                match purpose {
                    FetchPurpose::Initial => {
                        if model.mode != AppMode::Loading {
                            tracing::debug!("discarding stale initial batch result");
                            return;
                        }
                        match outcome {
                            Ok(drips) if !drips.is_empty() => {
                                self.install_queue(drips, None, model, caps);
                            }
                            Ok(_) => self.run_fallback_cascade(model, caps),
                            Err(e) => {
                                tracing::warn!(error = %e, "initial batch failed");
                                self.run_fallback_cascade(model, caps);
                            }
                        }
                    }
                    FetchPurpose::Refill => match outcome {
                        Ok(drips) => {
                            let appended = model.queue.append_back(drips);
                            if appended > 0 {
                                self.maintain_queue(model, caps);
                            }
                        }
                        Err(e) => {
                            tracing::debug!(error = %e, "background refill failed, keeping queue");
                        }
                    },
                    FetchPurpose::Refresh => {
                        match outcome {
                            Ok(drips) => {
                                model.queue.replace(drips);
                                model.notice = None;
                                self.maintain_queue(model, caps);
                            }
                            Err(e) => {
                                tracing::debug!(error = %e, "refresh failed, queue untouched");
                            }
                        }
                        caps.delay.after_millis(REFRESH_SETTLE_MS, Event::RefreshSettled);
                    }
                }
                caps.render.render();
            }

            Event::AdvanceRequested => {
                if model.mode != AppMode::Content
                    || model.transition == Transition::Exiting
                    || model.queue.len() <= 1
                {
                    return;
                }
                model.transition = Transition::Exiting;
                caps.delay.after_millis(ADVANCE_SETTLE_MS, Event::AdvanceSettled);
                caps.render.render();
            }

            Event::AdvanceSettled => {
                if model.transition != Transition::Exiting {
                    return;
                }
                model.transition = Transition::Idle;
                model.queue.pop_front();

                model.profile.drips_viewed += 1;
                self.persist_profile(model, caps);
                self.award_achievements(model, caps);

                self.maintain_queue(model, caps);
                caps.render.render();
            }

            Event::RefreshRequested => {
                if model.mode != AppMode::Content || model.is_refreshing {
                    return;
                }
                if model.fetch_in_flight {
                    tracing::debug!("refresh rejected, fetch already in flight");
                    return;
                }
                model.is_refreshing = true;
                self.request_batch(FetchPurpose::Refresh, INITIAL_FETCH_COUNT, model, caps);
                caps.render.render();
            }

            Event::RefreshSettled => {
                model.is_refreshing = false;
                caps.render.render();
            }

            Event::FavoriteToggled { drip_id } => {
                if let Some(pos) = model.favorites.iter().position(|d| d.id == drip_id) {
                    model.favorites.remove(pos);
                } else if let Some(drip) = model.queue.find(&drip_id).cloned() {
                    model.favorites.push(drip);
                } else {
                    tracing::debug!(drip_id = drip_id.as_str(), "favorite target not found");
                    return;
                }
                Self::persist(StorageKey::Favorites, &model.favorites, caps);

                // Resynced, not incremented: un-favoriting and re-favoriting
                // the same drip must not double-count.
                model.profile.favorites_saved = model.favorites.len() as u32;
                self.persist_profile(model, caps);
                self.award_achievements(model, caps);
                caps.render.render();
            }

            Event::CommentSubmitted { drip_id, text } => {
                let text = text.trim().to_string();
                if text.is_empty() {
                    model.form_error = Some("Comment cannot be empty.".to_string());
                    caps.render.render();
                    return;
                }
                model.form_error = None;

                let comment = Comment {
                    id: CommentId::generate(),
                    drip_id: drip_id.clone(),
                    author: model.profile.username.clone(),
                    text,
                    created_at_ms: UnixTimeMs::now(),
                };
                model.comments.entry(drip_id).or_default().push(comment);
                Self::persist(StorageKey::Comments, &model.comments, caps);

                model.profile.comments_made += 1;
                self.persist_profile(model, caps);
                self.award_achievements(model, caps);
                caps.render.render();
            }

            Event::UsernameChanged { username } => {
                match Self::validate_username(&username) {
                    Ok(name) => {
                        model.form_error = None;
                        model.profile.username = name;
                        self.persist_profile(model, caps);
                    }
                    Err(message) => {
                        model.form_error = Some(message);
                    }
                }
                caps.render.render();
            }

            Event::DripSubmitted(payload) => {
                if let Err(message) = Self::validate_submission(&payload) {
                    model.form_error = Some(message);
                    caps.render.render();
                    return;
                }
                model.form_error = None;

                let drip = Drip {
                    id: DripId::for_user_submission(UnixTimeMs::now()),
                    fact: payload.fact,
                    caption: payload.caption,
                    media_url: payload.media_url,
                    media_kind: payload.media_kind,
                    is_user_generated: true,
                    author: Some(model.profile.username.clone()),
                };
                model.queue.push_front(drip);

                model.profile.drips_created += 1;
                self.persist_profile(model, caps);
                self.award_achievements(model, caps);

                model.mode = AppMode::Content;
                caps.render.render();
            }

            Event::ExplainRequested { mode } => {
                if model.mode != AppMode::Content {
                    return;
                }
                let Some(fact) = model.queue.head().map(|d| d.fact.clone()) else {
                    return;
                };
                model.explanation = Some(Explanation::pending(mode));
                model.mode = AppMode::Explaining;
                caps.generator.explain(fact, mode, Event::ExplanationReady);
                caps.render.render();
            }

            Event::ExplanationReady(result) => {
                if let Some(explanation) = model.explanation.as_mut() {
                    explanation.content = match result {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::warn!(error = %e, "explanation failed, using apology");
                            EXPLAIN_APOLOGY.to_string()
                        }
                    };
                }
                caps.render.render();
            }

            Event::ProfileOpened => {
                if model.mode == AppMode::Content {
                    model.mode = AppMode::Profile;
                    caps.render.render();
                }
            }

            Event::UploaderOpened => {
                if model.mode == AppMode::Content {
                    model.form_error = None;
                    model.mode = AppMode::Uploading;
                    caps.render.render();
                }
            }

            Event::FeedResumed => {
                if matches!(
                    model.mode,
                    AppMode::Profile | AppMode::Explaining | AppMode::Uploading
                ) {
                    model.mode = AppMode::Content;
                    model.explanation = None;
                    model.form_error = None;
                    caps.render.render();
                }
            }

            Event::ToastExpired => {
                model.active_toast = None;
                caps.render.render();
            }

            Event::Persisted { key, result } => {
                if let Err(e) = result {
                    tracing::warn!(key = key.as_str(), error = %e, "cache write failed");
                }
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        let current_drip = model.queue.head().cloned();
        let comments_for_current = current_drip
            .as_ref()
            .and_then(|d| model.comments.get(&d.id))
            .cloned()
            .unwrap_or_default();
        let current_is_favorite = current_drip
            .as_ref()
            .map(|d| model.is_favorite(&d.id))
            .unwrap_or(false);

        ViewModel {
            mode: model.mode,
            current_drip,
            current_is_favorite,
            comments_for_current,
            queue_len: model.queue.len(),
            can_advance: model.queue.len() > 1 && model.transition == Transition::Idle,
            is_advancing: model.transition == Transition::Exiting,
            is_refreshing: model.is_refreshing,
            notice: model.notice.map(|n| n.message().to_string()),
            error: model.error.as_ref().map(|e| e.message.clone()),
            form_error: model.form_error.clone(),
            topics: TOPICS.iter().map(|t| (*t).to_string()).collect(),
            detected_region: model.detected_region.clone(),
            profile: model.profile.clone(),
            favorites: model.favorites.clone(),
            unlocked: model.unlocked.clone(),
            achievement_toast: model
                .active_toast
                .as_ref()
                .and_then(|id| achievements::find(id.as_str()))
                .map(AchievementView::from),
            explanation: model.explanation.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AchievementView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
}

impl From<&'static AchievementRule> for AchievementView {
    fn from(rule: &'static AchievementRule) -> Self {
        Self {
            id: rule.id.to_string(),
            title: rule.title.to_string(),
            description: rule.description.to_string(),
            icon: rule.icon.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ViewModel {
    pub mode: AppMode,
    pub current_drip: Option<Drip>,
    pub current_is_favorite: bool,
    pub comments_for_current: Vec<Comment>,
    pub queue_len: usize,
    pub can_advance: bool,
    pub is_advancing: bool,
    pub is_refreshing: bool,
    pub notice: Option<String>,
    pub error: Option<String>,
    pub form_error: Option<String>,
    pub topics: Vec<String>,
    pub detected_region: String,
    pub profile: UserProfile,
    pub favorites: Vec<Drip>,
    pub unlocked: Vec<UnlockedAchievement>,
    pub achievement_toast: Option<AchievementView>,
    pub explanation: Option<Explanation>,
}
