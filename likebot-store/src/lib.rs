pub mod config;
pub mod persist;
pub mod quota;

pub use config::{ChannelToggle, ConfigStore};
pub use quota::{EffectiveLimit, QuotaGuard, QuotaPolicy, QuotaTracker, UserQuota};
