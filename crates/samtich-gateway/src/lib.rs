//! Samtich Gateway - Telegram transport for the survey
//!
//! Long-polls the Bot API through teloxide, maps updates to survey events and
//! routes them to the engine one chat at a time. Also serves a small
//! health/status endpoint.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     Samtich Gateway                      │
//! ├──────────────────────────────────────────────────────────┤
//! │   teloxide Polling ──► updates::survey_event             │
//! │                                  │                       │
//! │                       ┌──────────▼──────────┐            │
//! │                       │     ChatRouter      │            │
//! │                       │  (one lane / chat)  │            │
//! │                       └──────────┬──────────┘            │
//! │                                  │                       │
//! │                       ┌──────────▼──────────┐            │
//! │                       │    SurveyEngine     │──► results │
//! │                       └──────────┬──────────┘    .json   │
//! │                                  │                       │
//! │   Bot API ◄──── TelegramClient (Messenger) ◄─────┘       │
//! │                                                          │
//! │   sweeper: drops idle sessions                           │
//! │   axum:    GET /health, GET /status                      │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod router;
pub mod telegram;
pub mod updates;

pub use config::BotConfig;
pub use error::{GatewayError, Result};
pub use gateway::{Gateway, GatewayState};
pub use router::{ChatRouter, StatsSnapshot};
pub use telegram::TelegramClient;
pub use updates::survey_event;

/// Gateway version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default status endpoint port
pub const DEFAULT_PORT: u16 = 18790;

/// Default host
pub const DEFAULT_HOST: &str = "127.0.0.1";
