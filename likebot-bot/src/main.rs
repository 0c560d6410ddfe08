use std::env;
use std::time::Duration;

use poise::serenity_prelude as serenity;
use tracing::{debug, error, info, warn};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use rustls::crypto::ring::default_provider;

use likebot_api::LikeClient;
use likebot_core::{DEFAULT_CLEANUP_DELAY, DEFAULT_EMBED_FOOTER, Data, Error, LikeSettings};
use likebot_store::{ConfigStore, QuotaPolicy, QuotaTracker};
use likebot_utils::embed::error_embed;
use likebot_utils::parse::parse_id_list;

const DEFAULT_LIKE_CHANNELS_FILE: &str = "like_channels.json";
const DEFAULT_DAILY_LIMIT: u64 = 1;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(filter_fn(|metadata| {
        let target = metadata.target();

        let within_info_level = *metadata.level() <= tracing::Level::INFO;
        if !within_info_level {
            return false;
        }

        !(target.starts_with("serenity::gateway::bridge::shard_manager")
            || target.starts_with("serenity::gateway::bridge::shard_runner"))
    }));

    tracing_subscriber::registry().with(fmt_layer).init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    dotenvy::dotenv().ok();

    let token = env::var("DISCORD_TOKEN")?;
    let guild_id = match env::var("DISCORD_GUILD_ID") {
        Ok(raw) => Some(raw.trim().parse::<u64>()?),
        Err(_) => None,
    };

    let config_path = env::var("LIKE_CHANNELS_FILE")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LIKE_CHANNELS_FILE.to_string());
    let config = ConfigStore::load(&config_path).await?;
    info!(path = %config.path().display(), "Like channel config ready.");

    let quota = build_quota_tracker().await;

    let daily_limit = u32::try_from(env_u64("LIKE_DAILY_LIMIT", DEFAULT_DAILY_LIMIT))
        .unwrap_or(u32::MAX);
    let unlimited_users = env_id_list("LIKE_UNLIMITED_USER_IDS");
    let unlimited_roles = env_id_list("LIKE_UNLIMITED_ROLE_IDS");
    info!(
        daily_limit,
        unlimited_users = unlimited_users.len(),
        unlimited_roles = unlimited_roles.len(),
        "Like quota configured."
    );
    let policy = QuotaPolicy::new(daily_limit)
        .with_unlimited_users(unlimited_users)
        .with_unlimited_roles(unlimited_roles);

    let likes = LikeClient::from_env()?;
    info!(endpoint = %likes.endpoint(), "Like service client ready.");

    let settings = LikeSettings {
        cleanup_delay: Duration::from_secs(env_u64(
            "LIKE_CLEANUP_DELAY_SECONDS",
            DEFAULT_CLEANUP_DELAY.as_secs(),
        )),
        embed_footer: env::var("LIKE_EMBED_FOOTER")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_EMBED_FOOTER.to_string()),
    };

    let data = Data {
        config,
        quota,
        policy,
        likes,
        settings,
    };

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: likebot_commands::commands(),
            on_error: |error| Box::pin(on_error(error)),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(likebot_utils::COMMAND_PREFIX.to_string()),
                mention_as_prefix: false,
                ..Default::default()
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            let data = data.clone();
            Box::pin(async move {
                info!("Likebot is ready.");

                match guild_id {
                    Some(guild_id) => {
                        poise::builtins::register_in_guild(
                            ctx,
                            &framework.options().commands,
                            serenity::GuildId::new(guild_id),
                        )
                        .await?;
                        info!(guild_id, "Commands registered in guild.");
                    }
                    None => {
                        poise::builtins::register_globally(ctx, &framework.options().commands)
                            .await?;
                        info!("Commands registered globally.");
                    }
                }

                Ok(data)
            })
        })
        .build();

    info!("Likebot is connecting...");

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;

    client.start().await?;
    Ok(())
}

async fn build_quota_tracker() -> QuotaTracker {
    let redis_key_prefix =
        env::var("REDIS_KEY_PREFIX").unwrap_or_else(|_| "likebot:prod".to_string());

    if !env_bool("REDIS_ENABLED", false) {
        info!("Quota persistence disabled; daily usage resets on restart (set REDIS_ENABLED=true to persist).");
        return QuotaTracker::in_memory();
    }

    let Ok(redis_url) = env::var("REDIS_URL") else {
        warn!(key_prefix = %redis_key_prefix, "REDIS_ENABLED=true but REDIS_URL is missing; keeping quota in memory.");
        return QuotaTracker::in_memory();
    };

    let tracker = match QuotaTracker::redis(&redis_url, redis_key_prefix.clone()) {
        Ok(tracker) => tracker,
        Err(err) => {
            warn!(?err, key_prefix = %redis_key_prefix, "Failed to initialize Redis quota store; keeping quota in memory.");
            return QuotaTracker::in_memory();
        }
    };

    if let Err(err) = tracker.ping().await {
        warn!(
            ?err,
            "Redis ping failed; quota operations will fall back to memory until it recovers."
        );
    } else {
        info!(key_prefix = %redis_key_prefix, "Redis quota store enabled.");
    }

    tracker
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(value) => value.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

fn env_id_list(key: &str) -> Vec<u64> {
    env::var(key)
        .map(|value| parse_id_list(&value))
        .unwrap_or_default()
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!(?error, "command error");

            let embed = error_embed(
                "Critical Error",
                "Something went wrong while running this command.",
            );

            let _ = ctx
                .send(poise::CreateReply::default().ephemeral(true).embed(embed))
                .await;
        }
        poise::FrameworkError::ArgumentParse { ctx, input, .. } => {
            let name = ctx.command().qualified_name.as_str();
            let usage = match likebot_commands::usage_for(name) {
                Some(usage) => format!("Usage: `{}`", usage),
                None => format!("Usage: `!{}`", name),
            };
            let description = if let Some(input) = input {
                format!("Invalid argument: `{}`\n{}", input, usage)
            } else {
                format!("Missing required argument.\n{}", usage)
            };

            let _ = ctx.say(description).await;
        }
        poise::FrameworkError::MissingUserPermissions { ctx, .. } => {
            let _ = ctx
                .send(
                    poise::CreateReply::default()
                        .content("You need the Administrator permission to use this command.")
                        .ephemeral(true),
                )
                .await;
        }
        poise::FrameworkError::GuildOnly { ctx, .. } => {
            let _ = ctx.say("This command can only be used in a server.").await;
        }
        poise::FrameworkError::UnknownCommand { .. } => {
            debug!("unknown command invocation");
        }
        other => {
            error!(?other, "framework error");
        }
    }
}
