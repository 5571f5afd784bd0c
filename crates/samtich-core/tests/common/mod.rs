//! Shared test harness: a recording messenger and a one-chat driver

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

use samtich_core::{
    ChatId, InboundEvent, Keyboard, MessageRef, Messenger, Origin, Outcome, ResponseRecord,
    ResponseStore, Session, SurveyEngine, SurveyError, SurveySettings,
};

pub const ADMINS: [i64; 2] = [900, 901];
pub const CHANNEL_URL: &str = "https://t.me/sam_tich";

/// One outbound call made by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Send {
        chat: ChatId,
        text: String,
        keyboard: Option<Keyboard>,
    },
    EditText {
        message_id: i64,
        text: String,
        keyboard: Option<Keyboard>,
    },
    EditCaption {
        message_id: i64,
        caption: String,
        keyboard: Option<Keyboard>,
    },
    EditMarkup {
        message_id: i64,
        keyboard: Keyboard,
    },
    Delete {
        message_id: i64,
    },
    Album {
        chat: ChatId,
        photos: Vec<String>,
        caption: String,
    },
    Ack {
        callback_id: String,
    },
}

impl Call {
    pub fn text(&self) -> Option<&str> {
        match self {
            Call::Send { text, .. } | Call::EditText { text, .. } => Some(text),
            Call::EditCaption { caption, .. } => Some(caption),
            _ => None,
        }
    }

    pub fn keyboard(&self) -> Option<&Keyboard> {
        match self {
            Call::Send { keyboard, .. }
            | Call::EditText { keyboard, .. }
            | Call::EditCaption { keyboard, .. } => keyboard.as_ref(),
            Call::EditMarkup { keyboard, .. } => Some(keyboard),
            _ => None,
        }
    }
}

/// Messenger that records every call and can be told to fail
#[derive(Default)]
pub struct RecordingMessenger {
    calls: Mutex<Vec<Call>>,
    next_id: AtomicI64,
    fail_edits: AtomicBool,
    failing_chats: Mutex<HashSet<ChatId>>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(100),
            ..Default::default()
        }
    }

    pub fn fail_edits(&self, fail: bool) {
        self.fail_edits.store(fail, Ordering::SeqCst);
    }

    pub fn fail_chat(&self, chat: ChatId) {
        self.failing_chats.lock().insert(chat);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    /// Calls addressed to `chat` with `send_message`
    pub fn sent_to(&self, chat: ChatId) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Send { chat: to, .. } if *to == chat))
            .collect()
    }

    pub fn last_keyboard(&self) -> Option<Keyboard> {
        self.calls()
            .iter()
            .rev()
            .find_map(|c| c.keyboard().cloned())
    }

    pub fn last_text(&self) -> Option<String> {
        self.calls()
            .iter()
            .rev()
            .find_map(|c| c.text().map(str::to_string))
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn edit_result(&self) -> samtich_core::Result<()> {
        if self.fail_edits.load(Ordering::SeqCst) {
            Err(SurveyError::Transport("message can't be edited".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> samtich_core::Result<MessageRef> {
        if self.failing_chats.lock().contains(&chat) {
            return Err(SurveyError::Transport("chat not found".into()));
        }
        self.record(Call::Send {
            chat,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(MessageRef::text(chat, self.id()))
    }

    async fn edit_message_text(
        &self,
        message: &MessageRef,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> samtich_core::Result<()> {
        self.edit_result()?;
        self.record(Call::EditText {
            message_id: message.message_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn edit_message_caption(
        &self,
        message: &MessageRef,
        caption: &str,
        keyboard: Option<&Keyboard>,
    ) -> samtich_core::Result<()> {
        self.edit_result()?;
        self.record(Call::EditCaption {
            message_id: message.message_id,
            caption: caption.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn edit_message_reply_markup(
        &self,
        message: &MessageRef,
        keyboard: &Keyboard,
    ) -> samtich_core::Result<()> {
        self.edit_result()?;
        self.record(Call::EditMarkup {
            message_id: message.message_id,
            keyboard: keyboard.clone(),
        });
        Ok(())
    }

    async fn delete_message(&self, message: &MessageRef) -> samtich_core::Result<()> {
        self.record(Call::Delete {
            message_id: message.message_id,
        });
        Ok(())
    }

    async fn send_photo_album(
        &self,
        chat: ChatId,
        photos: &[String],
        first_caption: &str,
    ) -> samtich_core::Result<Vec<MessageRef>> {
        self.record(Call::Album {
            chat,
            photos: photos.to_vec(),
            caption: first_caption.to_string(),
        });
        Ok(photos.iter().map(|_| MessageRef::media(chat, self.id())).collect())
    }

    async fn acknowledge(&self, callback_id: &str, _text: Option<&str>) -> samtich_core::Result<()> {
        self.record(Call::Ack {
            callback_id: callback_id.to_string(),
        });
        Ok(())
    }
}

pub fn settings() -> SurveySettings {
    SurveySettings {
        photo_pool: vec!["photo-1".into(), "photo-2".into(), "photo-3".into()],
        admins: ADMINS.iter().map(|id| ChatId(*id)).collect(),
        channel_url: CHANNEL_URL.into(),
        echo_photo_ids: true,
    }
}

/// Engine wired to a recording messenger and a temp-dir store
pub struct Harness {
    pub engine: Arc<SurveyEngine>,
    pub messenger: Arc<RecordingMessenger>,
    pub origin: Origin,
    _dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_data_file(|dir| dir.join("results.json"))
    }

    /// Store the responses at a path derived from the temp dir
    pub fn with_data_file(path: impl FnOnce(&Path) -> PathBuf) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let messenger = Arc::new(RecordingMessenger::new());
        let store = Arc::new(ResponseStore::new(path(dir.path())));
        let engine = Arc::new(SurveyEngine::new(messenger.clone(), store, settings()));
        Self {
            engine,
            messenger,
            origin: Origin::new(42, 42),
            _dir: dir,
        }
    }

    pub fn for_origin(&self, origin: Origin) -> Driver {
        Driver {
            engine: self.engine.clone(),
            origin,
        }
    }

    pub fn driver(&self) -> Driver {
        self.for_origin(self.origin)
    }

    pub fn session(&self) -> Option<Session> {
        self.engine.sessions().get(&self.origin)
    }

    pub async fn records(&self) -> Vec<ResponseRecord> {
        self.engine.store().load().await
    }
}

/// Sends events for one participant
#[derive(Clone)]
pub struct Driver {
    engine: Arc<SurveyEngine>,
    origin: Origin,
}

impl Driver {
    pub async fn start(&self) -> Outcome {
        self.engine
            .handle(InboundEvent::Command {
                origin: self.origin,
                name: "start".into(),
            })
            .await
    }

    pub async fn command(&self, name: &str) -> Outcome {
        self.engine
            .handle(InboundEvent::Command {
                origin: self.origin,
                name: name.into(),
            })
            .await
    }

    pub async fn press(&self, data: &str) -> Outcome {
        self.engine
            .handle(InboundEvent::Button {
                origin: self.origin,
                callback_id: format!("cb-{}", data),
                message: Some(MessageRef::text(self.origin.chat_id, 7)),
                data: data.into(),
            })
            .await
    }

    pub async fn text(&self, text: &str) -> Outcome {
        self.engine
            .handle(InboundEvent::Text {
                origin: self.origin,
                text: text.into(),
            })
            .await
    }

    /// Menu → rating → details → fixed city, stopping at the invite prompt
    pub async fn reach_invite(&self, rating: &str, details: &[&str], city: &str) {
        self.start().await;
        self.press("menu_rate").await;
        self.press(rating).await;
        for detail in details {
            self.press(&format!("toggle::{}", detail)).await;
        }
        self.press("details_next").await;
        self.press(&format!("city::{}", city)).await;
    }
}
