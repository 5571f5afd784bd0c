//! Telegram Bot API client
//!
//! Thin wrapper around [`teloxide::Bot`] implementing the survey's
//! [`Messenger`] seam.

use async_trait::async_trait;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQueryId, ChatId, FileId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, InputMedia,
    InputMediaPhoto, Me, MessageId,
};
use url::Url;

use samtich_core::{ButtonAction, Keyboard, MessageRef, Messenger};

use crate::config::TelegramSettings;
use crate::updates::message_ref;
use crate::{GatewayError, Result};

/// Extra time on top of the long-poll timeout before the HTTP request gives up
const HTTP_GRACE_SECS: u64 = 10;

/// Bot API client
pub struct TelegramClient {
    bot: Bot,
    poll_timeout: Duration,
}

impl TelegramClient {
    pub fn new(settings: &TelegramSettings) -> Result<Self> {
        let http = teloxide::net::default_reqwest_settings()
            .timeout(Duration::from_secs(settings.poll_timeout_secs + HTTP_GRACE_SECS))
            .build()
            .map_err(|e| GatewayError::Internal(format!("HTTP client: {}", e)))?;
        let api_url = Url::parse(&settings.api_base).map_err(|e| {
            GatewayError::InvalidConfig(format!("telegram.api_base {:?}: {}", settings.api_base, e))
        })?;

        Ok(Self {
            bot: Bot::with_client(settings.token.clone(), http).set_api_url(api_url),
            poll_timeout: Duration::from_secs(settings.poll_timeout_secs),
        })
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// Long-polling timeout handed to `getUpdates`
    pub fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }

    pub async fn get_me(&self) -> Result<Me> {
        Ok(self.bot.get_me().await?)
    }
}

/// Inline keyboard markup for a survey keyboard
pub fn inline_keyboard(keyboard: &Keyboard) -> Result<InlineKeyboardMarkup> {
    let rows = keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|button| match &button.action {
                    ButtonAction::Callback(data) => {
                        Ok(InlineKeyboardButton::callback(button.label.clone(), data.clone()))
                    }
                    ButtonAction::Url(url) => {
                        let url = Url::parse(url)
                            .map_err(|e| GatewayError::InvalidConfig(format!("button link {:?}: {}", url, e)))?;
                        Ok(InlineKeyboardButton::url(button.label.clone(), url))
                    }
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(InlineKeyboardMarkup::new(rows))
}

fn target(message: &MessageRef) -> Result<(ChatId, MessageId)> {
    let id = i32::try_from(message.message_id)
        .map_err(|_| GatewayError::Internal(format!("message id {} out of range", message.message_id)))?;
    Ok((ChatId(message.chat_id.0), MessageId(id)))
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_message(
        &self,
        chat: samtich_core::ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> samtich_core::Result<MessageRef> {
        let mut request = self.bot.send_message(ChatId(chat.0), text);
        if let Some(kb) = keyboard {
            request = request.reply_markup(inline_keyboard(kb)?);
        }
        let sent = request.await.map_err(GatewayError::from)?;
        Ok(message_ref(&sent))
    }

    async fn edit_message_text(
        &self,
        message: &MessageRef,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> samtich_core::Result<()> {
        let (chat, id) = target(message)?;
        let mut request = self.bot.edit_message_text(chat, id, text);
        if let Some(kb) = keyboard {
            request = request.reply_markup(inline_keyboard(kb)?);
        }
        request.await.map_err(GatewayError::from)?;
        Ok(())
    }

    async fn edit_message_caption(
        &self,
        message: &MessageRef,
        caption: &str,
        keyboard: Option<&Keyboard>,
    ) -> samtich_core::Result<()> {
        let (chat, id) = target(message)?;
        let mut request = self.bot.edit_message_caption(chat, id).caption(caption);
        if let Some(kb) = keyboard {
            request = request.reply_markup(inline_keyboard(kb)?);
        }
        request.await.map_err(GatewayError::from)?;
        Ok(())
    }

    async fn edit_message_reply_markup(&self, message: &MessageRef, keyboard: &Keyboard) -> samtich_core::Result<()> {
        let (chat, id) = target(message)?;
        self.bot
            .edit_message_reply_markup(chat, id)
            .reply_markup(inline_keyboard(keyboard)?)
            .await
            .map_err(GatewayError::from)?;
        Ok(())
    }

    async fn delete_message(&self, message: &MessageRef) -> samtich_core::Result<()> {
        let (chat, id) = target(message)?;
        self.bot.delete_message(chat, id).await.map_err(GatewayError::from)?;
        Ok(())
    }

    async fn send_photo_album(
        &self,
        chat: samtich_core::ChatId,
        photos: &[String],
        first_caption: &str,
    ) -> samtich_core::Result<Vec<MessageRef>> {
        let chat = ChatId(chat.0);

        // sendMediaGroup needs 2-10 items
        if let [single] = photos {
            let sent = self
                .bot
                .send_photo(chat, InputFile::file_id(FileId(single.clone())))
                .caption(first_caption)
                .await
                .map_err(GatewayError::from)?;
            return Ok(vec![message_ref(&sent)]);
        }

        let media: Vec<InputMedia> = photos
            .iter()
            .enumerate()
            .map(|(i, photo)| {
                let item = InputMediaPhoto::new(InputFile::file_id(FileId(photo.clone())));
                InputMedia::Photo(if i == 0 { item.caption(first_caption) } else { item })
            })
            .collect();

        let sent = self
            .bot
            .send_media_group(chat, media)
            .await
            .map_err(GatewayError::from)?;
        Ok(sent.iter().map(message_ref).collect())
    }

    async fn acknowledge(&self, callback_id: &str, text: Option<&str>) -> samtich_core::Result<()> {
        let mut request = self
            .bot
            .answer_callback_query(CallbackQueryId(callback_id.to_string()));
        if let Some(text) = text {
            request = request.text(text);
        }
        request.await.map_err(GatewayError::from)?;
        Ok(())
    }
}
