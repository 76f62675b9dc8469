//! Gateway HTTP server: webhook, health, and service info.

use crate::activity::InvokeResponse;
use crate::bot::{TranslationBot, TurnContext};
use crate::channels::{ActivityTransport, BotFrameworkTransport};
use crate::config::{self, Config};
use crate::translator::TranslatorClient;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

const SERVICE_NAME: &str = "translation-bot";

/// Shared state for the gateway. Built once at startup; immutable afterwards.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    pub bot: Arc<TranslationBot>,
    pub transport: Arc<dyn ActivityTransport>,
}

impl GatewayState {
    /// Wire the production services (Azure translator, Bot Framework transport) from config.
    pub fn from_config(config: Config) -> Result<Self> {
        let translator =
            TranslatorClient::new(&config.translator).context("building translator client")?;
        let transport = BotFrameworkTransport::new(&config.bot);
        Ok(Self {
            bot: Arc::new(TranslationBot::new(Arc::new(translator))),
            transport: Arc::new(transport),
            config: Arc::new(config),
        })
    }

    /// `bind:port` the gateway listens on.
    pub fn bind_addr(&self) -> String {
        format!(
            "{}:{}",
            self.config.gateway.bind.trim(),
            self.config.gateway.port
        )
    }
}

/// Routes: `POST /api/messages`, `GET /health`, `GET /`.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health_http))
        .route("/api/messages", post(messages))
        .with_state(state)
}

/// Run the gateway server; binds to config.gateway.bind:config.gateway.port.
/// Fails before binding when required settings (translator key) are missing.
/// Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_gateway(config: Config) -> Result<()> {
    config::validate(&config)?;
    let state = GatewayState::from_config(config)?;
    let bind_addr = state.bind_addr();
    if state.config.bot.app_id.is_empty() {
        log::warn!("BOT_APP_ID not set: inbound requests are not authenticated (local mode)");
    }
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().contains("application/json"))
        .unwrap_or(false)
}

/// POST /api/messages — authenticate and decode the activity, run the bot, return any
/// synchronous replies. Processing errors are logged and answered with 500.
async fn messages(State(state): State<GatewayState>, headers: HeaderMap, body: Bytes) -> Response {
    if !is_json_content_type(&headers) {
        return error_response(StatusCode::UNSUPPORTED_MEDIA_TYPE, "Invalid content type");
    }
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    match process_activity(&state, auth_header, &body).await {
        Ok(Some(invoke)) => {
            let status = StatusCode::from_u16(invoke.status).unwrap_or(StatusCode::OK);
            (status, Json(invoke.body)).into_response()
        }
        Ok(None) => StatusCode::OK.into_response(),
        Err(e) => {
            log::error!("Error processing activity: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn process_activity(
    state: &GatewayState,
    auth_header: &str,
    body: &[u8],
) -> Result<Option<InvokeResponse>> {
    state.transport.authenticate(auth_header)?;
    let activity = state.transport.decode(body)?;
    log::debug!(
        "inbound {:?} activity on channel {}",
        activity.typ,
        activity.channel_id.as_deref().unwrap_or("?")
    );
    let mut ctx = TurnContext::new(state.transport.as_ref(), &activity);
    state.bot.on_turn(&mut ctx).await?;
    Ok(ctx.into_invoke_response())
}

/// GET /health returns a fixed health JSON (for liveness checks).
async fn health_http() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
    }))
}

/// GET / describes the service and its endpoints.
async fn home() -> Json<serde_json::Value> {
    Json(json!({
        "message": "Translation Bot is running!",
        "endpoints": {
            "messages": "/api/messages",
            "health": "/health"
        },
        "supported_languages": ["English", "Sinhala"]
    }))
}
