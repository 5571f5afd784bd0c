//! Main gateway: long polling, session sweeping and the status endpoint

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use teloxide::dispatching::Dispatcher;
use teloxide::dptree;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::types::{AllowedUpdate, Update};
use teloxide::update_listeners::Polling;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use samtich_core::{Messenger, ResponseStore, SessionStore, SurveyEngine};

use crate::config::BotConfig;
use crate::router::ChatRouter;
use crate::telegram::TelegramClient;
use crate::updates::survey_event;
use crate::{GatewayError, Result};

/// How often a pending shutdown is retried while the dispatcher starts up
const SHUTDOWN_RETRY: Duration = Duration::from_millis(50);

/// Gateway state shared across handlers
#[derive(Clone)]
pub struct GatewayState {
    pub config: BotConfig,
    pub router: ChatRouter,
    pub started_at: DateTime<Utc>,
    /// Cancelled once; stays cancelled for anyone who looks later
    pub shutdown: CancellationToken,
}

impl GatewayState {
    /// Wire the survey engine to `messenger`
    pub fn new(config: BotConfig, messenger: Arc<dyn Messenger>) -> Self {
        let store = Arc::new(ResponseStore::new(config.data_file.clone()));
        let engine = Arc::new(SurveyEngine::new(messenger, store, config.survey_settings()));

        Self {
            config,
            router: ChatRouter::new(engine),
            started_at: Utc::now(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn engine(&self) -> &Arc<SurveyEngine> {
        self.router.engine()
    }
}

/// Main Gateway
pub struct Gateway {
    state: Arc<GatewayState>,
    client: Arc<TelegramClient>,
}

impl Gateway {
    /// Create a gateway talking to the Bot API
    pub fn new(config: BotConfig) -> Result<Self> {
        config.validate()?;
        let client = Arc::new(TelegramClient::new(&config.telegram)?);
        let state = Arc::new(GatewayState::new(config, client.clone()));
        Ok(Self { state, client })
    }

    /// Get gateway state
    pub fn state(&self) -> Arc<GatewayState> {
        self.state.clone()
    }

    /// Build the Axum router
    pub fn build_router(&self) -> Router {
        router(self.state.clone())
    }

    /// Run until [`Gateway::shutdown`] is called. Events already queued for
    /// a chat are handled before this returns.
    pub async fn start(&self) -> Result<()> {
        let shutdown = self.state.shutdown.clone();
        let me = tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                tracing::info!("Shutdown requested before connecting");
                return Ok(());
            }
            me = self.client.get_me() => me?,
        };
        tracing::info!(
            "Connected to Telegram as @{} ({})",
            me.user.username.as_deref().unwrap_or("?"),
            me.user.id
        );

        let server = if self.state.config.http.enabled {
            Some(self.spawn_http().await?)
        } else {
            None
        };
        let sweeper = spawn_sweeper(
            self.state.engine().sessions().clone(),
            self.state.config.session_timeout(),
            self.state.config.sweep_interval(),
        );

        self.poll().await;
        self.state.shutdown.cancel();

        if let Some(handle) = sweeper {
            handle.abort();
        }
        self.state.router.shutdown().await;
        if let Some(handle) = server {
            let _ = handle.await;
        }
        tracing::info!("Gateway stopped");
        Ok(())
    }

    /// Shutdown the gateway
    pub fn shutdown(&self) {
        self.state.shutdown.cancel();
        tracing::info!("Gateway shutdown initiated");
    }

    /// Long-poll the Bot API and hand every update to the chat router
    async fn poll(&self) {
        let router = self.state.router.clone();
        let handler = dptree::endpoint(move |update: Update| {
            let router = router.clone();
            async move {
                let update_id = update.id.0;
                match survey_event(update) {
                    Some(event) => router.route(event),
                    None => tracing::debug!("Skipping update {}", update_id),
                }
                respond(())
            }
        });

        let bot = self.client.bot().clone();
        let listener = Polling::builder(bot.clone())
            .timeout(self.client.poll_timeout())
            .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery])
            .build();
        let mut dispatcher = Dispatcher::builder(bot, handler).build();

        let token = dispatcher.shutdown_token();
        let shutdown = self.state.shutdown.clone();
        let stopper = tokio::spawn(async move {
            shutdown.cancelled().await;
            // refused while the dispatcher is still idle
            while token.shutdown().is_err() {
                tokio::time::sleep(SHUTDOWN_RETRY).await;
            }
        });

        tracing::info!("Polling for updates");
        dispatcher
            .dispatch_with_listener(listener, LoggingErrorHandler::with_custom_text("getUpdates failed"))
            .await;
        stopper.abort();
        tracing::info!("Polling stopped");
    }

    async fn spawn_http(&self) -> Result<JoinHandle<()>> {
        let addr = self.state.config.socket_addr()?;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(GatewayError::Io)?;
        let router = self.build_router();
        let shutdown = self.state.shutdown.clone();

        tracing::info!("Status endpoint listening on {}", addr);
        Ok(tokio::spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await;
            if let Err(e) = served {
                tracing::error!("Status endpoint stopped: {}", e);
            }
        }))
    }
}

/// Periodically drop idle sessions; `None` when expiry is disabled
pub fn spawn_sweeper(
    sessions: SessionStore,
    timeout: Option<chrono::Duration>,
    every: Duration,
) -> Option<JoinHandle<()>> {
    let timeout = timeout?;
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = sessions.cleanup_expired(timeout);
            if removed > 0 {
                tracing::info!("Swept {} idle sessions", removed);
            }
        }
    }))
}

/// `/health` and `/status` routes over `state`
pub fn router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/status", get(handle_status))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "version": crate::VERSION
    }))
}

async fn handle_status(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    let engine = state.engine();
    let sessions = engine.sessions().active_sessions();
    let mut by_state: BTreeMap<String, usize> = BTreeMap::new();
    for info in &sessions {
        *by_state.entry(info.state.to_string()).or_default() += 1;
    }

    axum::Json(serde_json::json!({
        "version": crate::VERSION,
        "uptime_secs": (Utc::now() - state.started_at).num_seconds(),
        "sessions": sessions.len(),
        "sessions_by_state": by_state,
        "lanes": state.router.lane_count(),
        "responses_stored": engine.store().count().await,
        "events": state.router.stats(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::tests::AcceptAll;
    use samtich_core::{Origin, SurveyState};

    fn config(dir: &tempfile::TempDir) -> BotConfig {
        BotConfig::new()
            .with_token("1:t")
            .with_photos(vec!["a".into(), "b".into()])
            .with_data_file(dir.path().join("results.json"))
    }

    fn state(dir: &tempfile::TempDir) -> Arc<GatewayState> {
        let config = config(dir);
        Arc::new(GatewayState::new(config, Arc::new(AcceptAll::default())))
    }

    #[tokio::test]
    async fn test_status_reports_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir);
        state.engine().sessions().create(Origin::new(1, 1));
        state.engine().sessions().create(Origin::new(2, 2));

        let response = handle_status(State(state)).await.into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["sessions"], 2);
        assert_eq!(json["sessions_by_state"][SurveyState::StartMenu.to_string()], 2);
        assert_eq!(json["responses_stored"], 0);
        assert_eq!(json["events"]["events"], 0);
    }

    #[tokio::test]
    async fn test_health() {
        let response = handle_health().await.into_response();
        assert!(response.status().is_success());
    }

    #[tokio::test]
    async fn test_sweeper_disabled_without_timeout() {
        assert!(spawn_sweeper(SessionStore::new(), None, Duration::from_millis(10)).is_none());
    }

    #[tokio::test]
    async fn test_sweeper_drops_idle_sessions() {
        let sessions = SessionStore::new();
        sessions.create(Origin::new(1, 1));

        let handle = spawn_sweeper(
            sessions.clone(),
            Some(chrono::Duration::zero()),
            Duration::from_millis(10),
        )
        .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert_eq!(sessions.session_count(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_before_start_is_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(&dir);
        // nothing listens here
        config.telegram.api_base = "http://127.0.0.1:9/".into();
        config.http.enabled = false;
        let gateway = Gateway::new(config).unwrap();

        gateway.shutdown();
        let stopped = tokio::time::timeout(Duration::from_secs(5), gateway.start()).await;
        assert!(matches!(stopped, Ok(Ok(()))));
        assert!(gateway.state().shutdown.is_cancelled());
    }

    #[test]
    fn test_gateway_requires_valid_config() {
        assert!(matches!(
            Gateway::new(BotConfig::default()),
            Err(GatewayError::InvalidConfig(_))
        ));
    }
}
