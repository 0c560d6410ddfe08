use poise::serenity_prelude as serenity;

use likebot_api::LikeOutcome;
use likebot_store::EffectiveLimit;
use likebot_utils::embed::{FAILURE_EMBED_COLOR, SUCCESS_EMBED_COLOR, error_embed};

use super::args::MissingInput;

pub const RESULT_TITLE: &str = "```FREE FIRE LIKE```";

pub const CHANNEL_NOT_ALLOWED_MESSAGE: &str = "❌ This command can only be used in designated channels. Please use one of the allowed channels.";

const MAX_LIKES_NOTICE: &str =
    "```MAX LIKES\nThis UID has already received the maximum likes today.```";

/// Quota line shown under the result.
pub fn limit_line(limit: EffectiveLimit, remaining: Option<u32>) -> String {
    match (limit, remaining) {
        (EffectiveLimit::Daily(max), Some(remaining)) => {
            format!("Requests remaining: {}/{}", remaining, max)
        }
        (EffectiveLimit::Daily(max), None) => format!("Requests remaining: {}/{}", max, max),
        (EffectiveLimit::Unlimited, _) => "Unlimited usage".to_owned(),
    }
}

pub fn result_description(outcome: &LikeOutcome, limit_line: &str) -> String {
    match outcome {
        LikeOutcome::Success(report) => format!(
            "```\n\
             ┌  ACCOUNT\n\
             ├─ NICKNAME:{}\n\
             ├─ UID:{}\n\
             ├─ REGION:{}\n\
             └─ RESULT:\n\
             \x20   ├─ ADDED:+{}\n\
             \x20   ├─ BEFORE:{}\n\
             \x20   └─ AFTER:{}\n\
             ┌  DAILY LIMIT\n\
             └─ {}\n\
             ```",
            report.nickname,
            report.uid,
            report.region,
            report.added,
            report.before,
            report.after,
            limit_line
        ),
        LikeOutcome::AlreadyMaxed | LikeOutcome::Failed { .. } => {
            format!("{}\n```\n┌  DAILY LIMIT\n└─ {}\n```", MAX_LIKES_NOTICE, limit_line)
        }
    }
}

pub fn result_embed(
    outcome: &LikeOutcome,
    limit_line: &str,
    avatar_url: &str,
    footer: &str,
) -> serenity::CreateEmbed {
    let color = if outcome.is_success() {
        SUCCESS_EMBED_COLOR
    } else {
        FAILURE_EMBED_COLOR
    };

    serenity::CreateEmbed::new()
        .title(RESULT_TITLE)
        .color(color)
        .timestamp(serenity::Timestamp::now())
        .thumbnail(avatar_url)
        .description(result_description(outcome, limit_line))
        .footer(serenity::CreateEmbedFooter::new(footer))
}

pub fn missing_input_embed(missing: &MissingInput, usage: &str) -> serenity::CreateEmbed {
    error_embed(
        "Missing Region or UID",
        format!("{}\nUsage: `{}`", missing.guidance(), usage),
    )
}

pub fn daily_limit_embed(limit: u32) -> serenity::CreateEmbed {
    error_embed(
        "Daily Limit Reached",
        format!(
            "You have used all {} like request{} for today. Try again tomorrow.",
            limit,
            if limit == 1 { "" } else { "s" }
        ),
    )
}

pub fn service_unavailable_embed() -> serenity::CreateEmbed {
    error_embed(
        "Service Unavailable",
        "The like service is not responding right now. Please try again later.",
    )
}

pub fn critical_error_embed(error: &anyhow::Error) -> serenity::CreateEmbed {
    error_embed("Critical Error", format!("{:#}", error))
}

#[cfg(test)]
mod tests {
    use likebot_api::{LikeOutcome, LikeReport};
    use likebot_store::EffectiveLimit;

    use super::{limit_line, result_description};

    fn report() -> LikeReport {
        LikeReport {
            nickname: "Foo".to_owned(),
            uid: "123456".to_owned(),
            region: "NX".to_owned(),
            added: "5".to_owned(),
            before: "10".to_owned(),
            after: "15".to_owned(),
        }
    }

    #[test]
    fn limit_lines() {
        assert_eq!(
            limit_line(EffectiveLimit::Daily(3), Some(2)),
            "Requests remaining: 2/3"
        );
        assert_eq!(
            limit_line(EffectiveLimit::Unlimited, None),
            "Unlimited usage"
        );
    }

    #[test]
    fn success_shows_account_and_like_counts() {
        let description = result_description(
            &LikeOutcome::Success(report()),
            "Requests remaining: 0/1",
        );

        assert!(description.contains("├─ NICKNAME:Foo\n"));
        assert!(description.contains("├─ UID:123456\n"));
        assert!(description.contains("├─ REGION:NX\n"));
        assert!(description.contains("    ├─ ADDED:+5\n"));
        assert!(description.contains("    ├─ BEFORE:10\n"));
        assert!(description.contains("    └─ AFTER:15\n"));
        assert!(description.contains("└─ Requests remaining: 0/1\n"));
        assert!(description.starts_with("```\n"));
        assert!(description.ends_with("```"));
    }

    #[test]
    fn non_success_shows_max_likes_notice() {
        for outcome in [LikeOutcome::AlreadyMaxed, LikeOutcome::Failed { status: Some(7) }] {
            let description = result_description(&outcome, "Unlimited usage");
            assert!(description.starts_with("```MAX LIKES"));
            assert!(description.contains("Unlimited usage"));
            assert!(!description.contains("ADDED"));
        }
    }
}
