//! Outbound messaging capability consumed by the survey engine

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::event::{ChatId, MessageRef};
use crate::Result;

/// What happens when a button is pressed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonAction {
    /// Round-trips the payload back as a button event
    Callback(String),
    /// Opens a link
    Url(String),
}

/// Inline button
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub action: ButtonAction,
}

impl Button {
    pub fn callback(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Callback(data.into()),
        }
    }

    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action: ButtonAction::Url(url.into()),
        }
    }
}

/// Inline keyboard, row by row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(mut self, row: Vec<Button>) -> Self {
        self.rows.push(row);
        self
    }

    pub fn single(self, button: Button) -> Self {
        self.row(vec![button])
    }

    /// All callback payloads, in display order
    pub fn callbacks(&self) -> Vec<&str> {
        self.rows
            .iter()
            .flatten()
            .filter_map(|b| match &b.action {
                ButtonAction::Callback(data) => Some(data.as_str()),
                ButtonAction::Url(_) => None,
            })
            .collect()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.rows.iter().flatten().map(|b| b.label.as_str()).collect()
    }
}

/// Chat transport operations.
///
/// Edit operations fail when the target message is gone or does not support
/// the edit; callers recover through [`edit_or_send`] and friends.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef>;

    async fn edit_message_text(
        &self,
        message: &MessageRef,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<()>;

    async fn edit_message_caption(
        &self,
        message: &MessageRef,
        caption: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<()>;

    async fn edit_message_reply_markup(&self, message: &MessageRef, keyboard: &Keyboard) -> Result<()>;

    async fn delete_message(&self, message: &MessageRef) -> Result<()>;

    /// Sends the photos as one album; only the first one carries a caption.
    async fn send_photo_album(
        &self,
        chat: ChatId,
        photos: &[String],
        first_caption: &str,
    ) -> Result<Vec<MessageRef>>;

    async fn acknowledge(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}

/// Replace the content of `target`, or send a fresh message when that fails.
///
/// Media messages are edited through their caption.
pub async fn edit_or_send(
    messenger: &dyn Messenger,
    chat: ChatId,
    target: Option<&MessageRef>,
    text: &str,
    keyboard: Option<&Keyboard>,
) -> Result<()> {
    if let Some(message) = target {
        let edited = if message.has_media {
            messenger.edit_message_caption(message, text, keyboard).await
        } else {
            messenger.edit_message_text(message, text, keyboard).await
        };
        match edited {
            Ok(()) => return Ok(()),
            Err(e) => {
                tracing::debug!("Edit of message {} failed, sending fresh: {}", message.message_id, e)
            }
        }
    }
    messenger.send_message(chat, text, keyboard).await.map(|_| ())
}

/// Swap the keyboard of `target` in place, or send `fallback_text` with it.
pub async fn edit_markup_or_send(
    messenger: &dyn Messenger,
    chat: ChatId,
    target: Option<&MessageRef>,
    keyboard: &Keyboard,
    fallback_text: &str,
) -> Result<()> {
    if let Some(message) = target {
        match messenger.edit_message_reply_markup(message, keyboard).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                tracing::debug!("Markup edit of message {} failed, sending fresh: {}", message.message_id, e)
            }
        }
    }
    messenger
        .send_message(chat, fallback_text, Some(keyboard))
        .await
        .map(|_| ())
}
