use poise::serenity_prelude as serenity;
use tracing::info;

use crate::CommandMeta;
use likebot_core::{Context, Error};
use likebot_store::ChannelToggle;
use likebot_utils::embed::notice_embed;

pub const META: CommandMeta = CommandMeta {
    name: "setlikechannel",
    desc: "Allow or disallow the like command in a channel.",
    category: "config",
    usage: "!setlikechannel [#channel]",
};

#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    category = "Config"
)]
pub async fn setlikechannel(
    ctx: Context<'_>,
    #[description = "The channel to allow/disallow the like command in."] channel: Option<
        serenity::GuildChannel,
    >,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say("This command can only be used in a server.").await?;
        return Ok(());
    };

    let config = &ctx.data().config;

    let Some(channel) = channel else {
        let channels = config.like_channels(guild_id.get()).await;
        ctx.send(
            poise::CreateReply::default()
                .embed(notice_embed("Like Channels", channel_list(&channels)))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    };

    if channel.guild_id != guild_id {
        ctx.say("That channel does not belong to this server.")
            .await?;
        return Ok(());
    }

    let toggle = config
        .toggle_channel(guild_id.get(), channel.id.get())
        .await?;
    let channels = config.like_channels(guild_id.get()).await;

    info!(
        guild_id = guild_id.get(),
        channel_id = channel.id.get(),
        ?toggle,
        "like channel toggled"
    );

    ctx.send(
        poise::CreateReply::default()
            .embed(notice_embed(
                "Like Channels",
                format!(
                    "{}\n\n{}",
                    toggle_message(toggle, channel.id.get()),
                    channel_list(&channels)
                ),
            ))
            .ephemeral(true),
    )
    .await?;

    Ok(())
}

fn toggle_message(toggle: ChannelToggle, channel_id: u64) -> String {
    match toggle {
        ChannelToggle::Added => format!("✅ <#{}> is now allowed for the like command.", channel_id),
        ChannelToggle::Removed => {
            format!("❌ <#{}> is no longer allowed for the like command.", channel_id)
        }
    }
}

fn channel_list(channels: &[u64]) -> String {
    if channels.is_empty() {
        return "No channels configured: the like command works in every channel.".to_owned();
    }

    let mentions = channels
        .iter()
        .map(|id| format!("<#{}>", id))
        .collect::<Vec<_>>()
        .join(", ");

    format!("Allowed channels: {}", mentions)
}
