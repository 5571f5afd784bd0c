//! Inbound event model and button payload codec

use serde::{Deserialize, Serialize};

use crate::catalog::{Rating, OTHER_CITY};

/// Chat identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to a message the bot can edit or delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: i64,
    /// The message carries media, so its text lives in the caption
    pub has_media: bool,
}

impl MessageRef {
    pub fn text(chat_id: ChatId, message_id: i64) -> Self {
        Self {
            chat_id,
            message_id,
            has_media: false,
        }
    }

    pub fn media(chat_id: ChatId, message_id: i64) -> Self {
        Self {
            chat_id,
            message_id,
            has_media: true,
        }
    }
}

/// Who an event came from. Sessions are keyed by this pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Origin {
    pub chat_id: ChatId,
    pub user_id: UserId,
}

impl Origin {
    pub fn new(chat_id: i64, user_id: i64) -> Self {
        Self {
            chat_id: ChatId(chat_id),
            user_id: UserId(user_id),
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.chat_id, self.user_id)
    }
}

/// Event delivered by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Slash command, name without the leading `/`
    Command { origin: Origin, name: String },

    /// Inline button press
    Button {
        origin: Origin,
        callback_id: String,
        message: Option<MessageRef>,
        data: String,
    },

    /// Plain text message
    Text { origin: Origin, text: String },

    /// Photo message
    Photo {
        origin: Origin,
        file_id: String,
        file_unique_id: String,
    },
}

impl InboundEvent {
    pub fn origin(&self) -> Origin {
        match self {
            InboundEvent::Command { origin, .. }
            | InboundEvent::Button { origin, .. }
            | InboundEvent::Text { origin, .. }
            | InboundEvent::Photo { origin, .. } => *origin,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::Command { .. } => "command",
            InboundEvent::Button { .. } => "button",
            InboundEvent::Text { .. } => "text",
            InboundEvent::Photo { .. } => "photo",
        }
    }
}

/// Start menu buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Rate,
    About,
    Back,
}

/// City button value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CityChoice {
    Fixed(String),
    Other,
}

/// Decoded button payload.
///
/// The prefix scopes a payload to one step; the state machine decides whether
/// the current state accepts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackData {
    Menu(MenuChoice),
    Rate(Rating),
    ToggleDetail(String),
    DetailsNext,
    City(CityChoice),
    Invite { accepted: bool },
    ToggleDeep(String),
    DeepNext,
    BodyType(String),
}

impl CallbackData {
    pub fn parse(data: &str) -> Option<Self> {
        if let Some(opt) = data.strip_prefix("toggle::") {
            return Some(CallbackData::ToggleDetail(opt.to_string()));
        }
        if let Some(opt) = data.strip_prefix("deep_toggle::") {
            return Some(CallbackData::ToggleDeep(opt.to_string()));
        }
        if let Some(opt) = data.strip_prefix("deep2::") {
            return Some(CallbackData::BodyType(opt.to_string()));
        }
        if let Some(city) = data.strip_prefix("city::") {
            return Some(CallbackData::City(if city == OTHER_CITY {
                CityChoice::Other
            } else {
                CityChoice::Fixed(city.to_string())
            }));
        }
        if let Some(code) = data.strip_prefix("rate_") {
            return code
                .parse::<u8>()
                .ok()
                .and_then(Rating::from_code)
                .map(CallbackData::Rate);
        }

        match data {
            "menu_rate" => Some(CallbackData::Menu(MenuChoice::Rate)),
            "menu_about" => Some(CallbackData::Menu(MenuChoice::About)),
            "menu_back" => Some(CallbackData::Menu(MenuChoice::Back)),
            "details_next" => Some(CallbackData::DetailsNext),
            "invite_yes" => Some(CallbackData::Invite { accepted: true }),
            "invite_no" => Some(CallbackData::Invite { accepted: false }),
            "deep_next" => Some(CallbackData::DeepNext),
            _ => None,
        }
    }

    pub fn encode(&self) -> String {
        match self {
            CallbackData::Menu(MenuChoice::Rate) => "menu_rate".to_string(),
            CallbackData::Menu(MenuChoice::About) => "menu_about".to_string(),
            CallbackData::Menu(MenuChoice::Back) => "menu_back".to_string(),
            CallbackData::Rate(rating) => format!("rate_{}", rating.code()),
            CallbackData::ToggleDetail(opt) => format!("toggle::{}", opt),
            CallbackData::DetailsNext => "details_next".to_string(),
            CallbackData::City(CityChoice::Fixed(city)) => format!("city::{}", city),
            CallbackData::City(CityChoice::Other) => format!("city::{}", OTHER_CITY),
            CallbackData::Invite { accepted: true } => "invite_yes".to_string(),
            CallbackData::Invite { accepted: false } => "invite_no".to_string(),
            CallbackData::ToggleDeep(opt) => format!("deep_toggle::{}", opt),
            CallbackData::DeepNext => "deep_next".to_string(),
            CallbackData::BodyType(opt) => format!("deep2::{}", opt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prefixed_payloads() {
        assert_eq!(
            CallbackData::parse("toggle::👀 Глаза"),
            Some(CallbackData::ToggleDetail("👀 Глаза".to_string()))
        );
        assert_eq!(
            CallbackData::parse("deep_toggle::Не важно"),
            Some(CallbackData::ToggleDeep("Не важно".to_string()))
        );
        assert_eq!(
            CallbackData::parse("city::OTHER"),
            Some(CallbackData::City(CityChoice::Other))
        );
        assert_eq!(
            CallbackData::parse("city::Брест"),
            Some(CallbackData::City(CityChoice::Fixed("Брест".to_string())))
        );
        assert_eq!(CallbackData::parse("rate_3"), Some(CallbackData::Rate(Rating::SomewhatDislike)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(CallbackData::parse(""), None);
        assert_eq!(CallbackData::parse("rate_9"), None);
        assert_eq!(CallbackData::parse("rate_x"), None);
        assert_eq!(CallbackData::parse("menu_unknown"), None);
        assert_eq!(CallbackData::parse("deep2_next"), None);
    }

    #[test]
    fn test_deep_toggle_is_not_a_detail_toggle() {
        // "deep_toggle::" must not be read as "toggle::" with a "deep_" prefix
        assert!(matches!(
            CallbackData::parse("deep_toggle::Добрый"),
            Some(CallbackData::ToggleDeep(_))
        ));
    }

    #[test]
    fn test_encode_parse_agree() {
        let samples = [
            CallbackData::Menu(MenuChoice::About),
            CallbackData::Rate(Rating::Like),
            CallbackData::DetailsNext,
            CallbackData::City(CityChoice::Other),
            CallbackData::Invite { accepted: false },
            CallbackData::BodyType("Крепкий".to_string()),
        ];
        for sample in samples {
            assert_eq!(CallbackData::parse(&sample.encode()), Some(sample));
        }
    }
}
