//! Per-chat survey sessions

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::catalog::{DeepBlock, Rating};
use crate::event::{MessageRef, Origin};
use crate::record::DeepAnswers;
use crate::toggle::ToggleSet;

/// Conversation step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyState {
    StartMenu,
    RatePhoto,
    AfterRating,
    CityChoice,
    OtherCity,
    InviteDeep,
    DeepBlock1,
    DeepBlock2,
    DeepBlock3,
    DeepBlock4,
    Completed,
}

impl SurveyState {
    pub const ALL: [SurveyState; 11] = [
        SurveyState::StartMenu,
        SurveyState::RatePhoto,
        SurveyState::AfterRating,
        SurveyState::CityChoice,
        SurveyState::OtherCity,
        SurveyState::InviteDeep,
        SurveyState::DeepBlock1,
        SurveyState::DeepBlock2,
        SurveyState::DeepBlock3,
        SurveyState::DeepBlock4,
        SurveyState::Completed,
    ];

    /// Questionnaire block answered in this state, if any
    pub fn deep_block(self) -> Option<DeepBlock> {
        match self {
            SurveyState::DeepBlock1 => Some(DeepBlock::Face),
            SurveyState::DeepBlock2 => Some(DeepBlock::Body),
            SurveyState::DeepBlock3 => Some(DeepBlock::Style),
            SurveyState::DeepBlock4 => Some(DeepBlock::Vibe),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SurveyState::Completed)
    }
}

impl std::fmt::Display for SurveyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Questionnaire answers collected so far
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepDraft {
    pub block1: Option<Vec<String>>,
    pub block2: Option<String>,
    pub block3: Option<Vec<String>>,
    pub block4: Option<Vec<String>>,
}

impl DeepDraft {
    /// All four blocks, or `None` while any is missing
    pub fn finish(&self) -> Option<DeepAnswers> {
        Some(DeepAnswers {
            block1: self.block1.clone()?,
            block2: self.block2.clone()?,
            block3: self.block3.clone()?,
            block4: self.block4.clone()?,
        })
    }
}

/// Survey session - one per chat participant while a conversation is open
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub origin: Origin,

    pub state: SurveyState,

    /// Photo the rating applies to
    pub current_photo: Option<String>,

    /// First album message, the one carrying the caption
    pub photo_message: Option<MessageRef>,

    pub rating: Option<Rating>,

    /// Live selection while the details step is open
    pub details_selected: ToggleSet,

    /// Details snapshot taken when the city is set
    pub details: Vec<String>,

    pub city: Option<String>,

    /// Absent unless the questionnaire was accepted
    pub deep: Option<DeepDraft>,

    /// Selection of the multi-select deep block currently open
    pub deep_buffer: Option<ToggleSet>,

    pub created_at: DateTime<Utc>,

    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(origin: Origin) -> Self {
        let now = Utc::now();
        Self {
            origin,
            state: SurveyState::StartMenu,
            current_photo: None,
            photo_message: None,
            rating: None,
            details_selected: ToggleSet::new(),
            details: Vec::new(),
            city: None,
            deep: None,
            deep_buffer: None,
            created_at: now,
            last_activity: now,
        }
    }

    /// Update last activity
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    pub fn is_expired(&self, timeout: chrono::Duration) -> bool {
        Utc::now() - self.last_activity > timeout
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            origin: self.origin,
            state: self.state,
            created_at: self.created_at,
            last_activity: self.last_activity,
        }
    }
}

/// Session summary info
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub origin: Origin,
    pub state: SurveyState,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// Session store - live sessions keyed by chat and user.
///
/// Callers take a session out, work on it, and put it back; events for one
/// chat are serialized by the dispatcher, so no lock is held across I/O.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Origin, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh session, replacing any previous one
    pub fn create(&self, origin: Origin) -> Session {
        let session = Session::new(origin);
        if self.sessions.write().insert(origin, session.clone()).is_some() {
            tracing::debug!("Session restarted: {}", origin);
        } else {
            tracing::debug!("Session created: {}", origin);
        }
        session
    }

    pub fn get(&self, origin: &Origin) -> Option<Session> {
        self.sessions.read().get(origin).cloned()
    }

    pub fn contains(&self, origin: &Origin) -> bool {
        self.sessions.read().contains_key(origin)
    }

    /// Remove the session for processing
    pub fn take(&self, origin: &Origin) -> Option<Session> {
        self.sessions.write().remove(origin)
    }

    pub fn put(&self, session: Session) {
        self.sessions.write().insert(session.origin, session);
    }

    /// Discard a session
    pub fn end(&self, origin: &Origin) -> bool {
        let removed = self.sessions.write().remove(origin).is_some();
        if removed {
            tracing::debug!("Session ended: {}", origin);
        }
        removed
    }

    /// Clean up sessions idle for longer than `timeout`
    pub fn cleanup_expired(&self, timeout: chrono::Duration) -> usize {
        let mut sessions = self.sessions.write();
        let expired: Vec<Origin> = sessions
            .iter()
            .filter(|(_, s)| s.is_expired(timeout))
            .map(|(origin, _)| *origin)
            .collect();

        for origin in &expired {
            sessions.remove(origin);
            tracing::info!("Session expired and removed: {}", origin);
        }

        expired.len()
    }

    pub fn active_sessions(&self) -> Vec<SessionInfo> {
        self.sessions.read().values().map(|s| s.info()).collect()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }
}
