mod noop_store;
mod redis_store;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::warn;

use noop_store::NoopQuotaStore;
use redis_store::RedisQuotaStore;

/// Held while one user's quota decision is in flight; see [`QuotaTracker::lock_user`].
pub type QuotaGuard = OwnedMutexGuard<()>;

/// A user's usage for the current day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQuota {
    pub count: u32,
    pub last_reset: NaiveDate,
}

impl UserQuota {
    pub fn fresh(today: NaiveDate) -> Self {
        Self {
            count: 0,
            last_reset: today,
        }
    }
}

/// Daily request cap applicable to one user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectiveLimit {
    Unlimited,
    Daily(u32),
}

impl EffectiveLimit {
    pub fn is_unlimited(self) -> bool {
        matches!(self, Self::Unlimited)
    }
}

/// Decides which users are exempt from the daily cap.
#[derive(Clone, Debug)]
pub struct QuotaPolicy {
    daily_limit: u32,
    unlimited_users: HashSet<u64>,
    unlimited_roles: HashSet<u64>,
}

impl QuotaPolicy {
    pub fn new(daily_limit: u32) -> Self {
        Self {
            daily_limit,
            unlimited_users: HashSet::new(),
            unlimited_roles: HashSet::new(),
        }
    }

    pub fn with_unlimited_users(mut self, user_ids: impl IntoIterator<Item = u64>) -> Self {
        self.unlimited_users.extend(user_ids);
        self
    }

    pub fn with_unlimited_roles(mut self, role_ids: impl IntoIterator<Item = u64>) -> Self {
        self.unlimited_roles.extend(role_ids);
        self
    }

    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    pub fn effective_limit(&self, user_id: u64, role_ids: &[u64]) -> EffectiveLimit {
        let exempt = self.unlimited_users.contains(&user_id)
            || role_ids
                .iter()
                .any(|role_id| self.unlimited_roles.contains(role_id));

        if exempt {
            EffectiveLimit::Unlimited
        } else {
            EffectiveLimit::Daily(self.daily_limit)
        }
    }
}

#[derive(Clone, Debug)]
enum QuotaBackend {
    Disabled(NoopQuotaStore),
    Redis(RedisQuotaStore),
}

#[derive(Debug)]
struct TrackerState {
    records: Mutex<HashMap<u64, UserQuota>>,
    user_locks: Mutex<HashMap<u64, Arc<Mutex<()>>>>,
    backend: QuotaBackend,
}

/// Per-user daily usage counter.
///
/// Days roll over on the UTC calendar date. Records are kept in memory and
/// written through to the configured backend; backend failures are logged and
/// never block a request. Past-day records are evicted whenever a new user is
/// cached.
#[derive(Clone, Debug)]
pub struct QuotaTracker {
    state: Arc<TrackerState>,
}

impl QuotaTracker {
    pub fn in_memory() -> Self {
        Self::with_backend(QuotaBackend::Disabled(NoopQuotaStore))
    }

    pub fn redis(redis_url: &str, key_prefix: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self::with_backend(QuotaBackend::Redis(
            RedisQuotaStore::from_url(redis_url, key_prefix)?,
        )))
    }

    fn with_backend(backend: QuotaBackend) -> Self {
        Self {
            state: Arc::new(TrackerState {
                records: Mutex::new(HashMap::new()),
                user_locks: Mutex::new(HashMap::new()),
                backend,
            }),
        }
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self.state.backend, QuotaBackend::Redis(_))
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        match &self.state.backend {
            QuotaBackend::Disabled(_) => Ok(()),
            QuotaBackend::Redis(store) => store.ping().await,
        }
    }

    /// Serialise quota decisions for one user. Hold the guard from the limit
    /// check until usage has been recorded.
    pub async fn lock_user(&self, user_id: u64) -> QuotaGuard {
        let lock = {
            let mut locks = self.state.user_locks.lock().await;
            locks.retain(|id, lock| *id == user_id || Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(user_id).or_default())
        };

        lock.lock_owned().await
    }

    /// Reset the user's count if their record is from an earlier day.
    pub async fn check_and_reset(&self, user_id: u64) -> anyhow::Result<UserQuota> {
        self.check_and_reset_on(user_id, today()).await
    }

    pub async fn is_within_limit(
        &self,
        user_id: u64,
        limit: EffectiveLimit,
    ) -> anyhow::Result<bool> {
        self.is_within_limit_on(user_id, limit, today()).await
    }

    /// Count one dispatched request against the user.
    pub async fn record_usage(&self, user_id: u64) -> anyhow::Result<UserQuota> {
        self.record_usage_on(user_id, today()).await
    }

    /// Requests left today, or `None` when the user is unlimited.
    pub async fn remaining(
        &self,
        user_id: u64,
        limit: EffectiveLimit,
    ) -> anyhow::Result<Option<u32>> {
        self.remaining_on(user_id, limit, today()).await
    }

    async fn check_and_reset_on(
        &self,
        user_id: u64,
        today: NaiveDate,
    ) -> anyhow::Result<UserQuota> {
        let (quota, was_reset) = self.update_record(user_id, today, |_| {}).await;

        if was_reset {
            self.save_to_backend(user_id, &quota).await;
        }

        Ok(quota)
    }

    /// Resolve the user's record for `today`, apply `update` to it in place
    /// and return the result plus whether a day rollover zeroed it.
    ///
    /// The backend is only consulted on a cache miss, and never while the
    /// records map is locked.
    async fn update_record(
        &self,
        user_id: u64,
        today: NaiveDate,
        update: impl FnOnce(&mut UserQuota),
    ) -> (UserQuota, bool) {
        let cached = self.state.records.lock().await.contains_key(&user_id);
        let loaded = if cached {
            None
        } else {
            self.load_from_backend(user_id).await
        };

        let mut records = self.state.records.lock().await;
        if !records.contains_key(&user_id) {
            records.retain(|_, quota| quota.last_reset == today);
        }

        let quota = records
            .entry(user_id)
            .or_insert_with(|| loaded.unwrap_or_else(|| UserQuota::fresh(today)));

        let was_reset = quota.last_reset != today;
        if was_reset {
            *quota = UserQuota::fresh(today);
        }
        update(&mut *quota);

        (*quota, was_reset)
    }

    async fn is_within_limit_on(
        &self,
        user_id: u64,
        limit: EffectiveLimit,
        today: NaiveDate,
    ) -> anyhow::Result<bool> {
        let EffectiveLimit::Daily(max) = limit else {
            return Ok(true);
        };

        let quota = self.check_and_reset_on(user_id, today).await?;
        Ok(quota.count < max)
    }

    async fn record_usage_on(
        &self,
        user_id: u64,
        today: NaiveDate,
    ) -> anyhow::Result<UserQuota> {
        let (quota, _) = self
            .update_record(user_id, today, |quota| {
                quota.count = quota.count.saturating_add(1);
            })
            .await;

        self.save_to_backend(user_id, &quota).await;
        Ok(quota)
    }

    async fn remaining_on(
        &self,
        user_id: u64,
        limit: EffectiveLimit,
        today: NaiveDate,
    ) -> anyhow::Result<Option<u32>> {
        let EffectiveLimit::Daily(max) = limit else {
            return Ok(None);
        };

        let quota = self.check_and_reset_on(user_id, today).await?;
        Ok(Some(max.saturating_sub(quota.count)))
    }

    async fn load_from_backend(&self, user_id: u64) -> Option<UserQuota> {
        let loaded = match &self.state.backend {
            QuotaBackend::Disabled(store) => store.load(user_id).await,
            QuotaBackend::Redis(store) => store.load(user_id).await,
        };

        match loaded {
            Ok(quota) => quota,
            Err(source) => {
                warn!(?source, user_id, "quota load failed; treating user as fresh");
                None
            }
        }
    }

    async fn save_to_backend(&self, user_id: u64, quota: &UserQuota) {
        let saved = match &self.state.backend {
            QuotaBackend::Disabled(store) => store.save(user_id, quota).await,
            QuotaBackend::Redis(store) => store.save(user_id, quota).await,
        };

        if let Err(source) = saved {
            warn!(?source, user_id, "quota save failed; usage kept in memory only");
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}
