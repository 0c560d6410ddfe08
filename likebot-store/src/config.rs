use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::persist::write_json_atomic;

/// On-disk shape of the like channel configuration. Keys this bot does not
/// use are kept in `extra` and written back untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub servers: BTreeMap<String, ServerConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub like_channels: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Result of [`ConfigStore::toggle_channel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelToggle {
    Added,
    Removed,
}

/// Per-server allow-list of channels where `like` may run, backed by a JSON file.
#[derive(Clone, Debug)]
pub struct ConfigStore {
    path: Arc<PathBuf>,
    document: Arc<Mutex<ConfigDocument>>,
}

impl ConfigStore {
    /// Load the document at `path`.
    ///
    /// A missing file is created with an empty document. A file that cannot be
    /// read or parsed is logged and overwritten with an empty document.
    pub async fn load(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();

        let document = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<ConfigDocument>(&bytes) {
                Ok(document) => {
                    info!(
                        path = %path.display(),
                        servers = document.servers.len(),
                        "Like channel config loaded."
                    );
                    return Ok(Self::from_parts(path, document));
                }
                Err(source) => {
                    warn!(
                        ?source,
                        path = %path.display(),
                        "like channel config is corrupt or empty; resetting to default"
                    );
                    ConfigDocument::default()
                }
            },
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                ConfigDocument::default()
            }
            Err(source) => {
                warn!(
                    ?source,
                    path = %path.display(),
                    "like channel config is unreadable; resetting to default"
                );
                ConfigDocument::default()
            }
        };

        write_json_atomic(&path, &document).await?;
        Ok(Self::from_parts(path, document))
    }

    fn from_parts(path: PathBuf, document: ConfigDocument) -> Self {
        Self {
            path: Arc::new(path),
            document: Arc::new(Mutex::new(document)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the server has no allow-list (or an empty one), or the list
    /// contains `channel_id`.
    pub async fn is_channel_allowed(&self, server_id: u64, channel_id: u64) -> bool {
        let document = self.document.lock().await;
        let Some(server) = document.servers.get(&server_id.to_string()) else {
            return true;
        };

        let channel_key = channel_id.to_string();
        server.like_channels.is_empty() || server.like_channels.contains(&channel_key)
    }

    /// Flip `channel_id` in the server's allow-list and persist before returning.
    ///
    /// The in-memory document only changes once the file has been replaced.
    pub async fn toggle_channel(
        &self,
        server_id: u64,
        channel_id: u64,
    ) -> anyhow::Result<ChannelToggle> {
        let mut document = self.document.lock().await;

        let mut updated = document.clone();
        let channels = &mut updated
            .servers
            .entry(server_id.to_string())
            .or_default()
            .like_channels;

        let channel_key = channel_id.to_string();
        let toggle = if let Some(index) = channels.iter().position(|id| *id == channel_key) {
            channels.remove(index);
            ChannelToggle::Removed
        } else {
            channels.push(channel_key);
            ChannelToggle::Added
        };

        write_json_atomic(&self.path, &updated).await?;
        *document = updated;

        Ok(toggle)
    }

    /// Allowed channels for the server, in insertion order. Entries that are
    /// not valid ids are skipped.
    pub async fn like_channels(&self, server_id: u64) -> Vec<u64> {
        let document = self.document.lock().await;
        document
            .servers
            .get(&server_id.to_string())
            .map(|server| {
                server
                    .like_channels
                    .iter()
                    .filter_map(|id| id.parse::<u64>().ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}
