//! Minimal HTTP endpoint for hosting platforms that probe a port.
use crate::pipeline::RunSummary;
use crate::state::BotState;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;

pub const SERVICE_NAME: &str = "GDG Ulaanbaatar News Bot";

/// Static description served on `/status` and `/info`.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub description: String,
    pub sources: Vec<String>,
    pub trigger_hour_utc: u32,
    pub target_language: String,
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    service: &'static str,
    started_at: DateTime<Utc>,
    uptime_secs: i64,
    timestamp: DateTime<Utc>,
    bot_connected: bool,
    last_run: Option<RunSummary>,
}

#[derive(Clone)]
struct HealthState {
    bot: Arc<BotState>,
    info: Arc<ServiceInfo>,
}

pub fn router(bot: Arc<BotState>, info: ServiceInfo) -> Router {
    let state = HealthState {
        bot,
        info: Arc::new(info),
    };
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/status", get(service_info))
        .route("/info", get(service_info))
        .with_state(state)
}

/// Serves until the listener fails.
pub async fn serve(addr: SocketAddr, bot: Arc<BotState>, info: ServiceInfo) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Health server listening");
    axum::serve(listener, router(bot, info)).await
}

async fn health(State(state): State<HealthState>) -> Json<HealthBody> {
    let now = Utc::now();
    Json(HealthBody {
        status: "healthy",
        service: SERVICE_NAME,
        started_at: state.bot.started_at(),
        uptime_secs: state.bot.uptime_secs(now),
        timestamp: now,
        bot_connected: state.bot.is_connected(),
        last_run: state.bot.last_run().await,
    })
}

async fn service_info(State(state): State<HealthState>) -> Json<ServiceInfo> {
    Json(state.info.as_ref().clone())
}
