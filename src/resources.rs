//! Cached reads and cache-invalidating writes, one per API resource.

use crate::api::{ApiClient, Params};
use crate::cache::{Memo, QueryCache, Resource, Tag};
use crate::calendar::date_key;
use crate::errors::ApiError;
use crate::models::{
    Activity, ActivityLog, Behavior, Client, DashboardStats, Entity, Goal, MediaUpload, Page,
    Schedule, Shift, User,
};
use crate::stats::{self, BehaviorStats, GoalStats};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, info, warn};

pub const DASHBOARD_REFRESH: Duration = Duration::from_secs(30);
pub const CRITICAL_BEHAVIORS_REFRESH: Duration = Duration::from_secs(60);
pub const TODAYS_SCHEDULE_REFRESH: Duration = Duration::from_secs(5 * 60);

const BEHAVIOR_TAGS: &[Tag] = &[Tag::Behavior, Tag::Client];
const DASHBOARD_TAGS: &[Tag] = &[
    Tag::Dashboard,
    Tag::Client,
    Tag::Behavior,
    Tag::Goal,
    Tag::Activity,
    Tag::Shift,
];
const REPORT_TAGS: &[Tag] = &[
    Tag::Report,
    Tag::Behavior,
    Tag::Goal,
    Tag::Activity,
    Tag::ActivityLog,
];
const SCHEDULE_TAGS: &[Tag] = &[Tag::Schedule, Tag::Activity, Tag::Client, Tag::User];

pub struct Resources {
    api: ApiClient,
    cache: QueryCache,
    behavior_stats: Memo<BehaviorStats, (u64, NaiveDate)>,
    goal_stats: Memo<GoalStats, (u64, NaiveDate)>,
}

impl Resources {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            cache: QueryCache::new(),
            behavior_stats: Memo::default(),
            goal_stats: Memo::default(),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    async fn list<E: Entity>(
        &self,
        params: &Params,
        tags: &[Tag],
        refresh: Option<Duration>,
    ) -> Resource<Page<E>> {
        let key = self.api.url(E::PATH, params);
        self.cache
            .fetch(&key, tags, refresh, || self.api.list::<E>(params))
            .await
    }

    pub async fn clients(&self, params: &Params) -> Resource<Page<Client>> {
        self.list(params, &[Tag::Client], None).await
    }

    pub async fn client(&self, id: i64) -> Resource<Client> {
        let key = self.api.url(&format!("{}/{id}", Client::PATH), &Params::new());
        self.cache
            .fetch(&key, &[Tag::Client], None, || self.api.get::<Client>(id))
            .await
    }

    pub async fn users(&self, params: &Params) -> Resource<Page<User>> {
        self.list(params, &[Tag::User], None).await
    }

    pub async fn behaviors(&self, params: &Params) -> Resource<Page<Behavior>> {
        self.list(params, BEHAVIOR_TAGS, None).await
    }

    pub async fn critical_behaviors(&self) -> Resource<Page<Behavior>> {
        let params = Params::new().with("severity", "critical");
        self.list(&params, BEHAVIOR_TAGS, Some(CRITICAL_BEHAVIORS_REFRESH))
            .await
    }

    pub async fn goals(&self, params: &Params) -> Resource<Page<Goal>> {
        self.list(params, &[Tag::Goal, Tag::Client], None).await
    }

    pub async fn activities(&self, params: &Params) -> Resource<Page<Activity>> {
        self.list(params, &[Tag::Activity, Tag::Client], None).await
    }

    pub async fn activity_logs(&self, params: &Params) -> Resource<Page<ActivityLog>> {
        let key = self.api.url("/activities/logs", params);
        self.cache
            .fetch(&key, &[Tag::ActivityLog, Tag::Activity], None, || {
                self.api.activity_logs(params)
            })
            .await
    }

    pub async fn schedules(&self, params: &Params) -> Resource<Page<Schedule>> {
        self.list(params, SCHEDULE_TAGS, None).await
    }

    pub async fn todays_schedule(&self, today: NaiveDate) -> Resource<Page<Schedule>> {
        let params = Params::new().with("date", date_key(today));
        self.list(&params, SCHEDULE_TAGS, Some(TODAYS_SCHEDULE_REFRESH))
            .await
    }

    pub async fn shifts(&self, params: &Params) -> Resource<Page<Shift>> {
        self.list(params, &[Tag::Shift, Tag::User, Tag::Client], None)
            .await
    }

    pub async fn dashboard_stats(&self) -> Resource<DashboardStats> {
        let key = self.api.url("/dashboard/stats", &Params::new());
        self.cache
            .fetch(&key, DASHBOARD_TAGS, Some(DASHBOARD_REFRESH), || {
                self.api.dashboard_stats()
            })
            .await
    }

    pub async fn report(&self, name: &str, params: &Params) -> Resource<Value> {
        let key = self.api.url(&format!("/reports/{name}"), params);
        self.cache
            .fetch(&key, REPORT_TAGS, None, || self.api.report(name, params))
            .await
    }

    pub async fn profile(&self) -> Resource<User> {
        let key = self.api.url("/auth/profile", &Params::new());
        self.cache
            .fetch(&key, &[Tag::Profile, Tag::User], None, || self.api.profile())
            .await
    }

    /// Forces revalidation of one cached URL.
    pub fn mutate(&self, key: &str) -> bool {
        self.cache.mutate(key)
    }

    pub fn clear(&self) {
        self.cache.clear();
        self.behavior_stats.retain(|_| false);
        self.goal_stats.retain(|_| false);
    }

    pub async fn create<E: Entity, B: Serialize + ?Sized>(&self, body: &B) -> Result<E, ApiError> {
        let created = self.api.create::<E, B>(body).await?;
        self.cache.invalidate_tags(&[E::TAG]);
        info!(entity = E::NAME, id = created.id(), "created");
        Ok(created)
    }

    pub async fn update<E: Entity, B: Serialize + ?Sized>(
        &self,
        id: i64,
        body: &B,
    ) -> Result<E, ApiError> {
        let updated = self.api.update::<E, B>(id, body).await?;
        self.cache.invalidate_tags(&[E::TAG]);
        info!(entity = E::NAME, id, "updated");
        Ok(updated)
    }

    pub async fn delete<E: Entity>(&self, id: i64) -> Result<(), ApiError> {
        self.api.delete::<E>(id).await?;
        self.cache.invalidate_tags(&[E::TAG]);
        info!(entity = E::NAME, id, "deleted");
        Ok(())
    }

    pub async fn log_activity<B: Serialize + ?Sized>(&self, body: &B) -> Result<ActivityLog, ApiError> {
        let log = self.api.create_activity_log(body).await?;
        self.cache.invalidate_tags(&[Tag::ActivityLog]);
        info!(id = log.id, "activity logged");
        Ok(log)
    }

    pub async fn upload_media(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
        metadata: Option<&Value>,
    ) -> Result<MediaUpload, ApiError> {
        let upload = self
            .api
            .upload_media(file_name, content_type, bytes, metadata)
            .await?;
        info!(url = %upload.url, "media uploaded");
        Ok(upload)
    }

    /// Behavior summary of a fetched list, recomputed only when the list changes.
    pub fn behavior_stats(
        &self,
        params: &Params,
        behaviors: &Resource<Page<Behavior>>,
        today: NaiveDate,
    ) -> Option<Arc<BehaviorStats>> {
        let page = behaviors.data.as_ref()?;
        let key = self.api.url(Behavior::PATH, params);
        Some(
            self.behavior_stats
                .get_or_compute(&key, (behaviors.version, today), || stats::behavior_stats(&page.results, today)),
        )
    }

    pub fn goal_stats(
        &self,
        params: &Params,
        goals: &Resource<Page<Goal>>,
        today: NaiveDate,
    ) -> Option<Arc<GoalStats>> {
        let page = goals.data.as_ref()?;
        let key = self.api.url(Goal::PATH, params);
        Some(
            self.goal_stats
                .get_or_compute(&key, (goals.version, today), || stats::goal_stats(&page.results, today)),
        )
    }

    /// Evicts idle cache entries and the summaries computed from them.
    pub fn sweep(&self) {
        let evicted = self.cache.evict_idle();
        self.behavior_stats.retain(|key| self.cache.contains(key));
        self.goal_stats.retain(|key| self.cache.contains(key));
        if evicted > 0 {
            debug!(evicted, "swept cache");
        }
    }

    async fn refresh_live(&self) {
        if !self.api.tokens().is_signed_in().await {
            return;
        }
        let today = Local::now().date_naive();
        let (dashboard, critical, schedule) = tokio::join!(
            self.dashboard_stats(),
            self.critical_behaviors(),
            self.todays_schedule(today),
        );
        for (name, error) in [
            ("dashboard stats", dashboard.error),
            ("critical behaviors", critical.error),
            ("today's schedule", schedule.error),
        ] {
            match error {
                Some(err) if err.is_unauthorized() => debug!("skipping {name} refresh: {err}"),
                Some(err) => warn!("failed to refresh {name}: {err}"),
                None => {}
            }
        }
    }
}

/// Keeps the live dashboard views warm until `shutdown` flips to true.
pub fn spawn_live_refresh(
    resources: Arc<Resources>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(DASHBOARD_REFRESH);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    resources.refresh_live().await;
                    resources.sweep();
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        debug!("live refresh stopped");
    })
}
