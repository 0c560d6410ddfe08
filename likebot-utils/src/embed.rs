use poise::serenity_prelude as serenity;

/// Default embed color used for neutral notices.
pub const DEFAULT_EMBED_COLOR: u32 = 0x90_55_30;
/// Color of a successful like result.
pub const SUCCESS_EMBED_COLOR: u32 = 0x2E_CC_71;
/// Color of failures and rejections.
pub const FAILURE_EMBED_COLOR: u32 = 0xE7_4C_3C;

/// Neutral titled notice.
pub fn notice_embed(title: &str, description: impl Into<String>) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title.to_owned())
        .color(DEFAULT_EMBED_COLOR)
        .description(description)
}

/// Red titled notice for errors and rejections.
pub fn error_embed(title: &str, description: impl Into<String>) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title.to_owned())
        .color(FAILURE_EMBED_COLOR)
        .description(description)
}
