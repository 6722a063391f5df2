use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use secrecy::ExposeSecret;
use serenity::all::{GatewayIntents, Http};
use serenity::Client;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use newsbot::config::Config;
use newsbot::discord::{
    AdminPolicy, Handler, LogSink, MessageSink, SerenitySink, TextFallbackSink,
};
use newsbot::feed::HttpEntrySource;
use newsbot::health::{self, ServiceInfo, SERVICE_NAME};
use newsbot::pipeline::{Pipeline, PipelineActor, RunRequest};
use newsbot::state::BotState;
use newsbot::translate::{GoogleTranslator, NoopTranslator, Translator};

#[derive(Parser, Debug)]
#[command(name = "newsbot", about = "Discord bot posting translated tech news")]
struct Args {
    /// Path to the TOML config file (optional)
    #[arg(long, value_name = "FILE", default_value = "newsbot.toml")]
    config: PathBuf,

    /// Run the pipeline once, bypassing the daily trigger, then exit
    #[arg(long)]
    once: bool,

    /// Log messages instead of posting them; no Discord connection
    #[arg(long)]
    dry_run: bool,

    /// Validate configuration and exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config '{}'", args.config.display()))?;
    config
        .apply_env()
        .context("Invalid environment override")?;
    config.validate().context("Invalid configuration")?;
    let trigger = config.trigger()?;

    let token = if args.dry_run {
        None
    } else {
        Some(config.token().context("Discord token is required")?)
    };

    if args.check_config {
        println!(
            "Configuration OK: {} channel(s), {} source(s), daily at {:02}:00 UTC",
            config.discord.channel_ids.len(),
            config.news.sources.len(),
            trigger.hour()
        );
        return Ok(());
    }

    tracing::info!(
        channels = ?config.discord.channel_ids,
        trigger_hour = trigger.hour(),
        strict_filter = config.news.strict_tech_filter,
        dry_run = args.dry_run,
        "Starting news bot"
    );

    let http_client = reqwest::Client::builder()
        .user_agent(concat!("newsbot/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .context("Failed to build HTTP client")?;

    let feeds = Arc::new(HttpEntrySource::new(http_client.clone()));
    let translator: Arc<dyn Translator> = if config.translation.enabled {
        let mut google = GoogleTranslator::new(http_client)
            .with_source_lang(config.translation.source_language.clone())
            .with_max_chunk_chars(config.translation.max_chunk_chars)
            .with_retries(config.translation.max_retries, Duration::from_secs(1));
        if let Some(base_url) = &config.translation.base_url {
            google = google.with_base_url(base_url.clone());
        }
        Arc::new(google)
    } else {
        tracing::info!("Translation disabled, posting original text");
        Arc::new(NoopTranslator)
    };

    let sink: Arc<dyn MessageSink> = match &token {
        Some(token) => {
            let http = Arc::new(Http::new(token.expose_secret()));
            Arc::new(TextFallbackSink::new(Arc::new(SerenitySink::new(http))))
        }
        None => Arc::new(LogSink),
    };

    let state = Arc::new(BotState::new(Utc::now()));
    let pipeline = Pipeline::new(feeds, translator, sink.clone(), config.pipeline_settings());
    let (actor, handle) =
        PipelineActor::new(pipeline, trigger, config.poll_interval(), state.clone());

    if args.once {
        let actor_task = tokio::spawn(actor.run());
        let report = handle
            .run(RunRequest::manual())
            .await
            .context("Pipeline stopped unexpectedly")?;
        println!(
            "Run finished: {:?} ({} fetched, {} selected, {} delivered)",
            report.outcome,
            report.fetched,
            report.selected,
            report.delivered()
        );
        drop(handle);
        actor_task.await.context("Pipeline task panicked")?;
        return Ok(());
    }

    if config.health.enabled {
        let addr = config.health.addr();
        let info = ServiceInfo {
            service: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "Daily tech news from The Verge and CNET, translated to Mongolian"
                .to_string(),
            sources: config
                .news
                .sources
                .iter()
                .map(|s| s.source.display_name().to_string())
                .collect(),
            trigger_hour_utc: trigger.hour(),
            target_language: config.translation.target_language.clone(),
        };
        let health_state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = health::serve(addr, health_state, info).await {
                tracing::error!(addr = %addr, error = %e, "Health server stopped");
            }
        });
    }

    let timer_task = actor.spawn_timer(handle.clone());
    let actor_task = tokio::spawn(actor.run());

    match token {
        None => {
            tracing::info!("Dry run: Discord gateway disabled, press Ctrl-C to stop");
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl-C")?;
        }
        Some(token) => {
            let intents = GatewayIntents::GUILDS
                | GatewayIntents::GUILD_MESSAGES
                | GatewayIntents::DIRECT_MESSAGES
                | GatewayIntents::MESSAGE_CONTENT;
            let handler = Handler::new(
                handle.clone(),
                sink,
                state.clone(),
                AdminPolicy {
                    user_ids: config.discord.admin_user_ids.clone(),
                    role_ids: config.discord.admin_role_ids.clone(),
                },
                config.discord.command_prefix.clone(),
            );

            let mut client = Client::builder(token.expose_secret(), intents)
                .event_handler(handler)
                .await
                .context("Failed to create Discord client")?;

            let shard_manager = client.shard_manager.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Shutting down");
                    shard_manager.shutdown_all().await;
                }
            });

            client.start().await.context("Discord client error")?;
        }
    }

    timer_task.abort();
    actor_task.abort();
    Ok(())
}
