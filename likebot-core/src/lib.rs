use std::time::Duration;

use likebot_api::LikeClient;
use likebot_store::{ConfigStore, QuotaPolicy, QuotaTracker};

pub type Error = anyhow::Error;

/// Delay before transient like replies are removed.
pub const DEFAULT_CLEANUP_DELAY: Duration = Duration::from_secs(10);
pub const DEFAULT_EMBED_FOOTER: &str = "DEVELOPED BY THUG";

/// Presentation settings for the like command.
#[derive(Clone, Debug)]
pub struct LikeSettings {
    pub cleanup_delay: Duration,
    pub embed_footer: String,
}

impl Default for LikeSettings {
    fn default() -> Self {
        Self {
            cleanup_delay: DEFAULT_CLEANUP_DELAY,
            embed_footer: DEFAULT_EMBED_FOOTER.to_owned(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Data {
    pub config: ConfigStore,
    pub quota: QuotaTracker,
    pub policy: QuotaPolicy,
    pub likes: LikeClient,
    pub settings: LikeSettings,
}

pub type Context<'a> = poise::Context<'a, Data, Error>;
