pub mod args;
pub mod embeds;
pub mod flow;

use poise::serenity_prelude as serenity;
use tracing::{error, warn};

use crate::CommandMeta;
use embeds::{
    CHANNEL_NOT_ALLOWED_MESSAGE, critical_error_embed, daily_limit_embed, limit_line,
    missing_input_embed, result_embed, service_unavailable_embed,
};
use flow::{Admission, LikeDecision, LikeRequest, Rejection, admit_like, dispatch_like};
use likebot_api::LikeOutcome;
use likebot_core::{Context, Error};
use likebot_utils::cleanup::{CleanupTarget, schedule_cleanup};

pub const META: CommandMeta = CommandMeta {
    name: "like",
    desc: "Send likes to a Free Fire account.",
    category: "likes",
    usage: "!like <region> <uid>",
};

/// How the command was invoked, with what cleanup needs to address it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invocation {
    Slash {
        token: String,
    },
    Prefix {
        channel_id: serenity::ChannelId,
        message_id: serenity::MessageId,
    },
}

impl Invocation {
    fn from_context(ctx: Context<'_>) -> Self {
        match ctx {
            poise::Context::Application(app) => Self::Slash {
                token: app.interaction.token.clone(),
            },
            poise::Context::Prefix(prefix) => Self::Prefix {
                channel_id: prefix.msg.channel_id,
                message_id: prefix.msg.id,
            },
        }
    }

    fn is_prefix(&self) -> bool {
        matches!(self, Self::Prefix { .. })
    }
}

#[poise::command(prefix_command, slash_command, category = "Likes")]
pub async fn like(
    ctx: Context<'_>,
    #[description = "Account region (ind, br, us, sac, na, ...)"] region: Option<String>,
    #[description = "Player UID"] uid: Option<String>,
) -> Result<(), Error> {
    if let Err(source) = run_like(ctx, region, uid).await {
        error!(?source, user_id = ctx.author().id.get(), "like command failed");

        ctx.send(
            poise::CreateReply::default()
                .embed(critical_error_embed(&source))
                .ephemeral(true),
        )
        .await?;
    }

    Ok(())
}

async fn run_like(
    ctx: Context<'_>,
    region: Option<String>,
    uid: Option<String>,
) -> Result<(), Error> {
    let data = ctx.data();
    let invocation = Invocation::from_context(ctx);

    let request = LikeRequest {
        user_id: ctx.author().id.get(),
        role_ids: author_role_ids(ctx).await,
        guild_id: ctx.guild_id().map(|guild_id| guild_id.get()),
        channel_id: ctx.channel_id().get(),
        via_prefix: invocation.is_prefix(),
        region,
        uid,
    };

    let admitted = match admit_like(data, request).await? {
        Admission::Admitted(admitted) => admitted,
        Admission::Rejected(rejection) => {
            ctx.send(rejection_reply(&rejection)).await?;
            return Ok(());
        }
    };

    let typing = match &invocation {
        Invocation::Slash { .. } => {
            ctx.defer_ephemeral().await?;
            None
        }
        Invocation::Prefix { channel_id, .. } => {
            Some(channel_id.start_typing(&ctx.serenity_context().http))
        }
    };

    let decision = dispatch_like(data, admitted).await?;
    drop(typing);

    let (outcome, limit, remaining) = match decision {
        LikeDecision::Completed {
            outcome,
            limit,
            remaining,
        } => (outcome, limit, remaining),
        LikeDecision::Unavailable(_) => {
            ctx.send(
                poise::CreateReply::default()
                    .embed(service_unavailable_embed())
                    .ephemeral(true),
            )
            .await?;
            return Ok(());
        }
    };

    let embed = result_embed(
        &outcome,
        &limit_line(limit, remaining),
        &ctx.author().face(),
        &data.settings.embed_footer,
    );
    let reply = ctx
        .send(
            poise::CreateReply::default()
                .embed(embed)
                .ephemeral(!invocation.is_prefix())
                .reply(true),
        )
        .await?;

    if !outcome.needs_cleanup() {
        return Ok(());
    }

    let reply_message_id = match &invocation {
        Invocation::Prefix { .. } => match reply.message().await {
            Ok(message) => Some(message.id),
            Err(source) => {
                warn!(?source, "could not resolve like reply for cleanup");
                None
            }
        },
        Invocation::Slash { .. } => None,
    };

    let targets = planned_cleanup(&outcome, &invocation, reply_message_id);
    schedule_cleanup(
        ctx.serenity_context().http.clone(),
        data.settings.cleanup_delay,
        targets,
    );

    Ok(())
}

fn rejection_reply(rejection: &Rejection) -> poise::CreateReply {
    let reply = poise::CreateReply::default().ephemeral(true);
    match rejection {
        Rejection::MissingInput(missing) => reply.embed(missing_input_embed(missing, META.usage)),
        Rejection::ChannelNotAllowed => reply.content(CHANNEL_NOT_ALLOWED_MESSAGE),
        Rejection::DailyLimitReached { limit } => reply.embed(daily_limit_embed(*limit)),
    }
}

async fn author_role_ids(ctx: Context<'_>) -> Vec<u64> {
    match ctx.author_member().await {
        Some(member) => member.roles.iter().map(|role_id| role_id.get()).collect(),
        None => Vec::new(),
    }
}

/// Messages to delete once a transient reply has been shown. Successful
/// results are kept; for prefix invocations the invoking message goes too.
pub fn planned_cleanup(
    outcome: &LikeOutcome,
    invocation: &Invocation,
    reply_message_id: Option<serenity::MessageId>,
) -> Vec<CleanupTarget> {
    if !outcome.needs_cleanup() {
        return Vec::new();
    }

    match invocation {
        Invocation::Slash { token } => vec![CleanupTarget::InteractionResponse {
            token: token.clone(),
        }],
        Invocation::Prefix {
            channel_id,
            message_id,
        } => {
            let mut targets = Vec::with_capacity(2);
            if let Some(reply_message_id) = reply_message_id {
                targets.push(CleanupTarget::ChannelMessage {
                    channel_id: *channel_id,
                    message_id: reply_message_id,
                });
            }
            targets.push(CleanupTarget::ChannelMessage {
                channel_id: *channel_id,
                message_id: *message_id,
            });
            targets
        }
    }
}
