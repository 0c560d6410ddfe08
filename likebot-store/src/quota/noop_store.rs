use super::UserQuota;

/// Backend used when no durable storage is configured. Usage lives only in the
/// tracker's memory and is lost on restart.
#[derive(Clone, Debug, Default)]
pub struct NoopQuotaStore;

impl NoopQuotaStore {
    pub async fn load(&self, _user_id: u64) -> anyhow::Result<Option<UserQuota>> {
        Ok(None)
    }

    pub async fn save(&self, _user_id: u64, _quota: &UserQuota) -> anyhow::Result<()> {
        Ok(())
    }
}
