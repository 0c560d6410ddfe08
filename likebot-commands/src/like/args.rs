use likebot_utils::parse::is_ascii_digits;

/// Validated `like` arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LikeTarget {
    pub region: String,
    pub uid: String,
}

/// Which arguments were missing after the uid/region swap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MissingInput {
    Region { uid: String },
    Uid { region: String },
    Both,
}

impl MissingInput {
    pub fn guidance(&self) -> String {
        match self {
            Self::Region { uid } => format!(
                "Please specify a region for UID `{}` (for example `ind`, `br`, `na`).",
                uid
            ),
            Self::Uid { region } => format!(
                "Please specify the player UID to send likes to in region `{}`.",
                region
            ),
            Self::Both => "Please specify a region and a player UID.".to_owned(),
        }
    }
}

/// Normalise raw arguments. A lone numeric first argument is taken as the
/// uid, so `like 123456` reports a missing region rather than a missing uid.
pub fn resolve_like_args(
    region: Option<String>,
    uid: Option<String>,
) -> Result<LikeTarget, MissingInput> {
    let mut region = non_empty(region);
    let mut uid = non_empty(uid);

    if uid.is_none() && region.as_deref().is_some_and(is_ascii_digits) {
        uid = region.take();
    }

    match (region, uid) {
        (Some(region), Some(uid)) => Ok(LikeTarget { region, uid }),
        (None, Some(uid)) => Err(MissingInput::Region { uid }),
        (Some(region), None) => Err(MissingInput::Uid { region }),
        (None, None) => Err(MissingInput::Both),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
