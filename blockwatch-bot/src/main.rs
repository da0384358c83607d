mod discord_commands;
use anyhow::Context as _;
use blockwatch_bot::config::Config;
use blockwatch_bot::discord::DiscordGateway;
use blockwatch_bot::ping::SlpProbe;
use blockwatch_bot::{RateLimitConfig, create_app};
use blockwatch_core::{Engine, Scheduler, StatusProbe};
use poise::{Framework, FrameworkOptions, PrefixFrameworkOptions, serenity_prelude as serenity};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

type Context<'a> = poise::Context<'a, crate::Data, crate::discord_commands::Error>;

pub(crate) struct Data {
    pub(crate) engine: Arc<Engine>,
    pub(crate) probe: Arc<dyn StatusProbe>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for structured logging
    #[cfg(debug_assertions)]
    let log_level = tracing::Level::DEBUG;
    #[cfg(not(debug_assertions))]
    let log_level = tracing::Level::INFO;

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();
    tracing::info!("Starting blockwatch...");
    let config = Config::from_env()?;
    tracing::info!(
        "Configuration: port={}, prefix={}, protocol={}, probe_timeout={}ms, poll_interval={}ms",
        config.port,
        config.command_prefix,
        config.protocol_version,
        config.probe_timeout.as_millis(),
        config.poll_interval.as_millis()
    );

    let http = Arc::new(serenity::Http::new(&config.discord_token));
    let engine = Arc::new(Engine::new(Arc::new(DiscordGateway::new(http))));
    let probe: Arc<dyn StatusProbe> = Arc::new(SlpProbe::new(
        config.probe_timeout,
        config.protocol_version,
    ));
    let scheduler = Scheduler::new(engine.clone(), probe.clone(), config.poll_interval).start();

    let app = create_app(
        engine.clone(),
        config.request_timeout,
        RateLimitConfig {
            per_sec: config.rate_limit_per_sec,
            burst: config.rate_limit_burst,
        },
    );
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Status API listening on {}", addr);

    let framework = Framework::builder()
        .options(FrameworkOptions {
            commands: discord_commands::commands(),
            prefix_options: PrefixFrameworkOptions {
                prefix: Some(config.command_prefix.clone()),
                ..Default::default()
            },
            on_error: |error| Box::pin(discord_commands::on_error(error)),
            pre_command: |ctx| {
                Box::pin(async move {
                    tracing::info!(
                        "Executing command '{}' in channel {}",
                        ctx.command().name,
                        ctx.channel_id()
                    );
                })
            },
            post_command: |ctx| {
                Box::pin(async move {
                    tracing::info!(
                        "Finished command '{}' in channel {}",
                        ctx.command().name,
                        ctx.channel_id()
                    );
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                tracing::info!("Logged in to Discord as {}", ready.user.name);
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(Data { engine, probe })
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&config.discord_token, discord_commands::intents())
        .framework(framework)
        .await
        .context("Error creating Discord client")?;
    tokio::select! {
        result = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()) => {
            if let Err(e) = result {
                tracing::error!("Axum server error: {}", e);
            }
        }
        result = client.start() => {
            if let Err(e) = result {
                tracing::error!("Discord client error: {:?}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }
    scheduler.shutdown().await;
    Ok(())
}
