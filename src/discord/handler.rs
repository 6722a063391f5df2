use super::commands::{self, AdminPolicy, Caller, Command, MentionIntent};
use super::{MessageSink, OutgoingMessage};
use crate::pipeline::{PipelineHandle, RunRequest};
use crate::state::BotState;
use chrono::Utc;
use serenity::all::{ConnectionStage, Context, EventHandler, Message, Ready, ShardStageUpdateEvent};
use serenity::async_trait;
use std::sync::Arc;

/// Gateway event handler: chat commands and mentions.
pub struct Handler {
    pipeline: PipelineHandle,
    replies: Arc<dyn MessageSink>,
    state: Arc<BotState>,
    admins: AdminPolicy,
    prefix: String,
}

impl Handler {
    pub fn new(
        pipeline: PipelineHandle,
        replies: Arc<dyn MessageSink>,
        state: Arc<BotState>,
        admins: AdminPolicy,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            pipeline,
            replies,
            state,
            admins,
            prefix: prefix.into(),
        }
    }

    async fn reply(&self, channel: u64, message: OutgoingMessage) {
        if let Err(e) = self.replies.post(channel, &message).await {
            tracing::warn!(channel = channel, error = %e, "Failed to send reply");
        }
    }

    async fn on_command(&self, ctx: &Context, msg: &Message, command: Command) {
        let channel = msg.channel_id.get();
        tracing::info!(
            command = ?command,
            user = msg.author.id.get(),
            channel = channel,
            "Command received"
        );

        match command {
            Command::News => {
                if !self.admins.allows(&caller(ctx, msg)) {
                    self.reply(
                        channel,
                        OutgoingMessage::Text(commands::permission_denied_text().to_string()),
                    )
                    .await;
                    return;
                }

                self.reply(channel, OutgoingMessage::Card(commands::searching_card()))
                    .await;
                let text = match self.pipeline.run(RunRequest::manual()).await {
                    Ok(report) => commands::manual_run_text(&report),
                    Err(e) => {
                        tracing::error!(error = %e, "Manual run failed");
                        format!("Алдаа гарлаа: {}", e)
                    }
                };
                self.reply(channel, OutgoingMessage::Text(text)).await;
            }

            Command::Status | Command::Info => match self.pipeline.status().await {
                Ok(status) => {
                    let card = if command == Command::Status {
                        commands::status_card(&status, Utc::now())
                    } else {
                        commands::info_card(&status, &self.prefix)
                    };
                    self.reply(channel, OutgoingMessage::Card(card)).await;
                }
                Err(e) => tracing::error!(error = %e, "Status unavailable"),
            },
        }
    }

    async fn on_mention(&self, msg: &Message) {
        let channel = msg.channel_id.get();
        match MentionIntent::classify(&msg.content) {
            MentionIntent::Greeting => {
                let card = commands::greeting_card(msg.id.get());
                self.reply(channel, OutgoingMessage::Card(card)).await;
            }
            MentionIntent::NewsRequest => {
                self.reply(channel, OutgoingMessage::Card(commands::searching_card()))
                    .await;
                match self.pipeline.run(RunRequest::mention(channel)).await {
                    Ok(report) => {
                        let card = commands::mention_result_card(&report);
                        self.reply(channel, OutgoingMessage::Card(card)).await;
                    }
                    Err(e) => tracing::error!(error = %e, "Mention run failed"),
                }
            }
        }
    }
}

/// Resolves the author's roles and guild permissions from the cache.
///
/// Messages outside a guild, or from a guild not yet cached, carry no
/// permissions.
fn caller(ctx: &Context, msg: &Message) -> Caller {
    let role_ids = msg
        .member
        .as_ref()
        .map(|m| m.roles.iter().map(|r| r.get()).collect())
        .unwrap_or_default();
    let manage_messages = match (msg.guild(&ctx.cache), msg.member.as_deref()) {
        (Some(guild), Some(member)) => guild
            .partial_member_permissions(msg.author.id, member)
            .manage_messages(),
        _ => false,
    };
    Caller {
        user_id: msg.author.id.get(),
        role_ids,
        manage_messages,
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        if let Some(command) = Command::parse(&msg.content, &self.prefix) {
            self.on_command(&ctx, &msg, command).await;
            return;
        }

        if msg.mentions_me(&ctx).await.unwrap_or(false) {
            self.on_mention(&msg).await;
        }
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        self.state.set_connected(true);
        tracing::info!(
            user = %ready.user.name,
            guilds = ready.guilds.len(),
            "Connected to Discord"
        );
    }

    async fn shard_stage_update(&self, _ctx: Context, event: ShardStageUpdateEvent) {
        let connected = matches!(event.new, ConnectionStage::Connected);
        if connected != self.state.is_connected() {
            tracing::info!(stage = ?event.new, "Gateway connection changed");
        }
        self.state.set_connected(connected);
    }
}
