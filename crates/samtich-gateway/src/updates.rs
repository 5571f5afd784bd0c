//! Mapping of Bot API updates to survey events

use teloxide::types::{MaybeInaccessibleMessage, Message, Update, UpdateKind, UserId};

use samtich_core::{ChatId, InboundEvent, MessageRef, Origin};

/// Map an update to a survey event. Updates the survey has no use for
/// (channel posts, edits, callbacks without a message, ...) map to `None`.
pub fn survey_event(update: Update) -> Option<InboundEvent> {
    match update.kind {
        UpdateKind::CallbackQuery(query) => {
            let message = query.message?;
            Some(InboundEvent::Button {
                origin: Origin::new(message.chat().id.0, user_id(query.from.id)?),
                callback_id: query.id.0,
                message: Some(callback_message_ref(&message)),
                data: query.data.unwrap_or_default(),
            })
        }
        UpdateKind::Message(message) => message_event(&message),
        _ => None,
    }
}

fn message_event(message: &Message) -> Option<InboundEvent> {
    let origin = Origin::new(message.chat.id.0, user_id(message.from.as_ref()?.id)?);

    if let Some(text) = message.text() {
        return Some(match parse_command(text) {
            Some(name) => InboundEvent::Command { origin, name },
            None => InboundEvent::Text {
                origin,
                text: text.to_string(),
            },
        });
    }

    let largest = message
        .photo()?
        .iter()
        .max_by_key(|p| u64::from(p.width) * u64::from(p.height))?;
    Some(InboundEvent::Photo {
        origin,
        file_id: largest.file.id.0.clone(),
        file_unique_id: largest.file.unique_id.0.clone(),
    })
}

fn user_id(id: UserId) -> Option<i64> {
    i64::try_from(id.0).ok()
}

/// Reference for later edits; photo messages are edited via caption
pub fn message_ref(message: &Message) -> MessageRef {
    let chat = ChatId(message.chat.id.0);
    let id = i64::from(message.id.0);
    if message.photo().is_some() {
        MessageRef::media(chat, id)
    } else {
        MessageRef::text(chat, id)
    }
}

fn callback_message_ref(message: &MaybeInaccessibleMessage) -> MessageRef {
    match message.regular_message() {
        Some(regular) => message_ref(regular),
        None => MessageRef::text(ChatId(message.chat().id.0), i64::from(message.id().0)),
    }
}

/// `/start@samtich_bot arg` → `start`
fn parse_command(text: &str) -> Option<String> {
    let word = text.strip_prefix('/')?.split_whitespace().next()?;
    let name = word.split('@').next().unwrap_or(word);
    (!name.is_empty()).then(|| name.to_string())
}
