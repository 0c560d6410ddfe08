use std::fmt;

use serde::Deserialize;

/// Error marker the like service uses for an exhausted UID.
const ALREADY_MAXED_ERROR: &str = "Failder";

/// A JSON scalar that may arrive as either a number or a string.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    /// Numeric value of a JSON number. Text is never numeric, so `"1"` does
    /// not equal the status code `1` while `1.0` does.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => number.as_f64(),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Raw like service envelope. Every field is optional.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LikeResponse {
    #[serde(default)]
    pub status: Option<Scalar>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub player: Option<PlayerInfo>,
    #[serde(default)]
    pub likes: Option<LikeCounts>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PlayerInfo {
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub uid: Option<Scalar>,
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LikeCounts {
    #[serde(default)]
    pub before: Option<Scalar>,
    #[serde(default)]
    pub after: Option<Scalar>,
    #[serde(default)]
    pub added_by_api: Option<Scalar>,
}

/// Account details of a successful request, placeholders already applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LikeReport {
    pub nickname: String,
    pub uid: String,
    pub region: String,
    pub added: String,
    pub before: String,
    pub after: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LikeOutcome {
    Success(LikeReport),
    /// The UID already received its maximum likes for the day.
    AlreadyMaxed,
    /// Any other status the service reports.
    Failed { status: Option<i64> },
}

impl LikeOutcome {
    /// Classify a decoded response. `region_token` is the region the user
    /// typed, shown when the service omits the player's region.
    pub fn from_response(response: LikeResponse, region_token: &str) -> Self {
        let status = response.status.as_ref().and_then(Scalar::as_number);

        if status == Some(1.0) {
            let player = response.player.unwrap_or_default();
            let likes = response.likes.unwrap_or_default();

            return Self::Success(LikeReport {
                nickname: player.nickname.unwrap_or_else(|| "Unknown".to_owned()),
                uid: text_or(player.uid, "Unknown"),
                region: player
                    .region
                    .unwrap_or_else(|| region_token.to_ascii_uppercase()),
                added: text_or(likes.added_by_api, "0"),
                before: text_or(likes.before, "N/A"),
                after: text_or(likes.after, "N/A"),
            });
        }

        if status == Some(2.0) || response.error.as_deref() == Some(ALREADY_MAXED_ERROR) {
            return Self::AlreadyMaxed;
        }

        Self::Failed {
            status: status
                .filter(|code| code.fract() == 0.0)
                .map(|code| code as i64),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Non-success replies are transient and get deleted after a delay.
    pub fn needs_cleanup(&self) -> bool {
        !self.is_success()
    }
}

fn text_or(value: Option<Scalar>, placeholder: &str) -> String {
    value
        .map(|value| value.to_string())
        .unwrap_or_else(|| placeholder.to_owned())
}
