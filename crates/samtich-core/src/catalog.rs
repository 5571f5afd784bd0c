//! Static option data for every survey step

use serde::{Deserialize, Serialize};

/// Photo rating, stored by its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "❤️ Нравится")]
    Like,
    #[serde(rename = "💛 Скорее нравится")]
    SomewhatLike,
    #[serde(rename = "💙 Скорее не нравится")]
    SomewhatDislike,
    #[serde(rename = "💔 Не нравится")]
    Dislike,
}

impl Rating {
    pub const ALL: [Rating; 4] = [
        Rating::Like,
        Rating::SomewhatLike,
        Rating::SomewhatDislike,
        Rating::Dislike,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Rating::Like => "❤️ Нравится",
            Rating::SomewhatLike => "💛 Скорее нравится",
            Rating::SomewhatDislike => "💙 Скорее не нравится",
            Rating::Dislike => "💔 Не нравится",
        }
    }

    /// Button code, `1..=4`.
    pub fn code(self) -> u8 {
        match self {
            Rating::Like => 1,
            Rating::SomewhatLike => 2,
            Rating::SomewhatDislike => 3,
            Rating::Dislike => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.code() == code)
    }

    pub fn is_positive(self) -> bool {
        matches!(self, Rating::Like | Rating::SomewhatLike)
    }

    /// Detail tags offered after this rating.
    pub fn detail_options(self) -> &'static [&'static str] {
        if self.is_positive() {
            POSITIVE_DETAILS
        } else {
            NEGATIVE_DETAILS
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

pub const POSITIVE_DETAILS: &[&str] = &[
    "🙂 Улыбка",
    "👀 Глаза",
    "🌿 Вайб / энергетика",
    "👔 Стиль одежды",
    "🙂 Черты лица",
    "💪 Телосложение",
    "🧍‍♂️ Осанка",
    "⭐️ Просто понравился",
];

pub const NEGATIVE_DETAILS: &[&str] = &[
    "👔 Стиль",
    "🙂 Лицо / мимика",
    "🧍‍♂️ Осанка",
    "🧢 Прическа / волосы",
    "🤷 Не мой типаж",
    "🔞 Слишком молодой",
    "📅 Слишком взрослый",
    "❌ Просто не зашёл",
];

pub const CITIES: &[&str] = &["Минск", "Гродно", "Гомель", "Могилёв", "Брест"];

/// Payload value of the "other city" button.
pub const OTHER_CITY: &str = "OTHER";

/// The four blocks of the optional "ideal type" questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeepBlock {
    /// Facial features, multi-select
    Face,
    /// Body type, single choice
    Body,
    /// Clothing style, multi-select
    Style,
    /// Personality vibe, multi-select
    Vibe,
}

impl DeepBlock {
    pub fn options(self) -> &'static [&'static str] {
        match self {
            DeepBlock::Face => &[
                "Мягкие черты",
                "Выраженные скулы",
                "Широкая челюсть",
                "Узкое лицо",
                "Круглое лицо",
                "Светлая кожа",
                "Тёмная кожа",
                "Волосы: короткие",
                "Волосы: длинные",
                "Не важно",
            ],
            DeepBlock::Body => &["Худощавый", "Средний", "Спортивный", "Крепкий", "Не важно"],
            DeepBlock::Style => &[
                "Кежуал",
                "Спортивный",
                "Офисный (рубашка/пиджак)",
                "Уличный / streetwear",
                "Минимализм",
                "Творческий",
                "Гранж / рок",
                "Брутальный",
                "Аккуратный, ухоженный",
                "Не важно",
            ],
            DeepBlock::Vibe => &[
                "Добрый",
                "Уверенный",
                "Спокойный",
                "Харизматичный",
                "Заботливый",
                "Дерзкий / хулиган",
                "Интеллектуальный",
                "Весёлый / лёгкий",
                "Серьёзный",
                "Интровертный",
                "Экстравертный",
            ],
        }
    }

    pub fn question(self) -> &'static str {
        match self {
            DeepBlock::Face => "Какие черты лица тебе нравятся? Выбери всё, что подходит.",
            DeepBlock::Body => "Какое телосложение тебе ближе?",
            DeepBlock::Style => "В каком стиле парень выглядит привлекательнее?",
            DeepBlock::Vibe => "Какой вайб (атмосфера) тебя привлекает больше всего?",
        }
    }

    pub fn is_multi_select(self) -> bool {
        !matches!(self, DeepBlock::Body)
    }

    pub fn offers(self, option: &str) -> bool {
        self.options().contains(&option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_codes_round_trip() {
        for rating in Rating::ALL {
            assert_eq!(Rating::from_code(rating.code()), Some(rating));
        }
        assert_eq!(Rating::from_code(0), None);
        assert_eq!(Rating::from_code(5), None);
    }

    #[test]
    fn test_rating_serializes_as_label() {
        let json = serde_json::to_string(&Rating::SomewhatDislike).unwrap();
        assert_eq!(json, "\"💙 Скорее не нравится\"");
        let parsed: Rating = serde_json::from_str("\"❤️ Нравится\"").unwrap();
        assert_eq!(parsed, Rating::Like);
    }

    #[test]
    fn test_branch_selection() {
        assert_eq!(Rating::Like.detail_options(), POSITIVE_DETAILS);
        assert_eq!(Rating::SomewhatLike.detail_options(), POSITIVE_DETAILS);
        assert_eq!(Rating::SomewhatDislike.detail_options(), NEGATIVE_DETAILS);
        assert_eq!(Rating::Dislike.detail_options(), NEGATIVE_DETAILS);
    }

    #[test]
    fn test_only_body_block_is_single_choice() {
        assert!(DeepBlock::Face.is_multi_select());
        assert!(!DeepBlock::Body.is_multi_select());
        assert!(DeepBlock::Style.is_multi_select());
        assert!(DeepBlock::Vibe.is_multi_select());
        assert_eq!(CITIES.len(), 5);
    }
}
