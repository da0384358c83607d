use crate::{Context, Data};
use blockwatch_bot::validation;
use blockwatch_core::{SubscriberId, render_status};
use poise::command;
use poise::serenity_prelude as serenity;
use thiserror::Error;

pub(crate) type Error = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub(crate) enum CommandError {
    #[error("Invalid minecraft server")]
    InvalidServer,
}

fn subscriber(ctx: &Context<'_>) -> SubscriberId {
    SubscriberId(ctx.channel_id().get())
}

/// Add a Minecraft server for live status updates
#[command(slash_command, prefix_command)]
pub async fn add(
    ctx: Context<'_>,
    #[description = "Server address, e.g. play.example.com:25565"]
    #[rest]
    server: Option<String>,
) -> Result<(), Error> {
    let data = ctx.data();
    let server = validation::extract_server_key(server.as_deref().unwrap_or_default())?;

    tracing::debug!(%server, "checking server before adding it");
    if let Err(e) = data.probe.probe(&server).await {
        tracing::debug!(%server, error = %e, "server didn't answer");
        return Err(CommandError::InvalidServer.into());
    }

    data.engine.subscribe(&server, subscriber(&ctx)).await?;
    ctx.say(format!("Server {} is successfully added", server))
        .await?;

    if let Some(status) = data.engine.cached_status(&server).await {
        ctx.say(render_status(&server, &status, None)).await?;
    }
    Ok(())
}

/// Delete a server from live status updates
#[command(slash_command, prefix_command)]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Server address, e.g. play.example.com:25565"]
    #[rest]
    server: Option<String>,
) -> Result<(), Error> {
    let data = ctx.data();
    let server = validation::extract_server_key(server.as_deref().unwrap_or_default())?;
    data.engine.unsubscribe(&server, subscriber(&ctx)).await?;
    ctx.say(format!("Server {} is successfully removed", server))
        .await?;
    Ok(())
}

/// Stop live status for every server in this channel
#[command(slash_command, prefix_command)]
pub async fn stop(ctx: Context<'_>) -> Result<(), Error> {
    ctx.data().engine.unsubscribe_all(subscriber(&ctx)).await;
    ctx.say("Unsubscribed from all servers").await?;
    Ok(())
}

/// List the servers this channel gets live status for
#[command(slash_command, prefix_command)]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let servers = ctx.data().engine.servers_of(subscriber(&ctx)).await;
    let reply = if servers.is_empty() {
        "No servers added yet.".to_string()
    } else {
        servers
            .iter()
            .map(|s| format!("- {}", s))
            .collect::<Vec<_>>()
            .join("\n")
    };
    ctx.say(reply).await?;
    Ok(())
}

/// User-facing errors become a reply; everything else goes to the default handler.
pub(crate) async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::warn!(command = %ctx.command().name, %error, "command rejected");
            if let Err(e) = ctx.say(error.to_string()).await {
                tracing::error!("Failed to send error reply: {}", e);
            }
        }
        poise::FrameworkError::UnknownCommand { ctx, msg, .. } => {
            if let Err(e) = msg.channel_id.say(ctx, "Unknown command").await {
                tracing::error!("Failed to send unknown command reply: {}", e);
            }
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                tracing::error!("Error while handling error: {}", e);
            }
        }
    }
}

/// Every command the bot registers.
pub(crate) fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![add(), remove(), stop(), list()]
}

/// Intents needed for prefix commands in guild channels and DMs.
pub(crate) fn intents() -> serenity::GatewayIntents {
    serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT
}
