//! Samtich survey core
//!
//! Conversation state machine for the «Самцыч» photo-rating survey: a
//! participant rates a photo, tags what they liked or disliked, names their
//! city and optionally fills a four-block "ideal type" questionnaire. The
//! finished response is appended to a JSON store and announced to the
//! administrators.
//!
//! # Architecture
//!
//! ```text
//!  InboundEvent ──► SurveyEngine ──► accept(state, payload) ──► Transition
//!                        │                                          │
//!                        │◄────────── Session (SessionStore) ◄──────┘
//!                        │
//!                        ├──► Messenger (render prompt, edit-or-send)
//!                        │
//!                        └──► terminal branch:
//!                               ResponseRecord::assemble
//!                               ResponseStore::append   (single writer)
//!                               AdminNotifier::notify   (best effort)
//! ```
//!
//! The transport lives outside this crate and only has to implement
//! [`Messenger`] and feed [`InboundEvent`]s one chat at a time.

pub mod catalog;
pub mod engine;
pub mod error;
pub mod event;
pub mod messenger;
pub mod notify;
pub mod prompts;
pub mod record;
pub mod session;
pub mod store;
pub mod toggle;

pub use catalog::{DeepBlock, Rating};
pub use engine::{Outcome, SurveyEngine, SurveySettings, Transition};
pub use error::{Result, SurveyError};
pub use event::{CallbackData, ChatId, InboundEvent, MessageRef, Origin, UserId};
pub use messenger::{Button, ButtonAction, Keyboard, Messenger};
pub use notify::{AdminNotifier, DeliveryReport};
pub use record::{DeepAnswers, ResponseRecord};
pub use session::{Session, SessionInfo, SessionStore, SurveyState};
pub use store::ResponseStore;
pub use toggle::ToggleSet;

/// Core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
