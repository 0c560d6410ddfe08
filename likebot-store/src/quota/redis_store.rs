use std::time::Duration;

use deadpool_redis::{Config, Connection, Pool, Runtime};
use redis::AsyncCommands;

use super::UserQuota;

/// Records outlive a single day so a reset is still observed after midnight.
const RECORD_TTL: Duration = Duration::from_secs(48 * 60 * 60);

#[derive(Clone, Debug)]
pub struct RedisQuotaStore {
    pool: Pool,
    key_prefix: String,
}

impl RedisQuotaStore {
    pub fn from_url(redis_url: &str, key_prefix: impl Into<String>) -> anyhow::Result<Self> {
        let config = Config::from_url(redis_url);
        let pool = config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| anyhow::anyhow!("failed to create redis pool: {e}"))?;

        Ok(Self {
            pool,
            key_prefix: key_prefix.into(),
        })
    }

    pub fn key(&self, user_id: u64) -> String {
        format!("{}:like_quota:{}", self.key_prefix, user_id)
    }

    async fn connection(&self) -> anyhow::Result<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| anyhow::anyhow!("failed to get redis connection: {e}"))
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        let mut conn = self.connection().await?;

        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("redis PING failed: {e}"))?;

        Ok(())
    }

    pub async fn load(&self, user_id: u64) -> anyhow::Result<Option<UserQuota>> {
        let key = self.key(user_id);
        let mut conn = self.connection().await?;

        let value = conn
            .get::<_, Option<Vec<u8>>>(&key)
            .await
            .map_err(|e| anyhow::anyhow!("redis GET failed for key `{key}`: {e}"))?;

        match value {
            Some(bytes) => {
                let quota = serde_json::from_slice(&bytes).map_err(|e| {
                    anyhow::anyhow!("failed to deserialize quota record `{key}`: {e}")
                })?;
                Ok(Some(quota))
            }
            None => Ok(None),
        }
    }

    pub async fn save(&self, user_id: u64, quota: &UserQuota) -> anyhow::Result<()> {
        let key = self.key(user_id);
        let payload = serde_json::to_vec(quota)
            .map_err(|e| anyhow::anyhow!("failed to serialize quota record `{key}`: {e}"))?;
        let mut conn = self.connection().await?;

        conn.set_ex::<_, _, ()>(&key, payload, RECORD_TTL.as_secs())
            .await
            .map_err(|e| anyhow::anyhow!("redis SETEX failed for key `{key}`: {e}"))?;

        Ok(())
    }
}
