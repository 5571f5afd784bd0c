//! User-facing texts and keyboards

use crate::catalog::{DeepBlock, Rating, CITIES};
use crate::event::{CallbackData, CityChoice, MenuChoice};
use crate::messenger::{Button, Keyboard};
use crate::toggle::ToggleSet;

pub const START_TEXT: &str = "Привет! Это эксперимент «Самцыч».\n\n\
Здесь ты можешь анонимно оценить фото и помочь собрать\n\n\
портрет идеального парня для разных городов.";

pub const ABOUT_TEXT: &str = "Егор (Самцыч) изучает, какие типажи нравятся девушкам в разных городах.\n\
Ты кликаешь — мы собираем статистику — в канале появляются выводы и «портреты идеалов».\n\n\
Всё анонимно и занимает меньше минуты.";

pub const ALBUM_CAPTION: &str = "Оцени фото 👇\n\nТвой выбор анонимен.";
pub const RATING_PROMPT: &str = "Выбери:";
pub const CITY_PROMPT: &str =
    "Спасибо! Теперь, из какого ты города? Это нужно, чтобы собрать карту предпочтений.";
pub const OTHER_CITY_PROMPT: &str = "Напиши, пожалуйста, название твоего города (текстово).";
pub const INVITE_PROMPT: &str = "Можешь помочь составить образ своего идеального парня?✨\n\
Мини-опрос — 20–30 секунд. Можно выбрать несколько вариантов.";
pub const THANKS_DECLINED: &str = "Спасибо! Твои ответы уйдут в «Самцыч» и помогут создать портрет\n\n\
идеального парня в твоём городе.";
pub const THANKS_COMPLETED: &str = "Спасибо!\n\
Твои ответы уйдут в «Самцыч» и помогут создать портрет идеального парня в твоём городе.";
pub const SELECTION_UPDATED: &str = "Обновлено.";
pub const USE_MENU: &str = "Используй меню для начала или /start.";
pub const UNKNOWN_COMMAND: &str = "Команда не распознана. Используй /start чтобы начать.";

const CHANNEL_BUTTON: &str = "📊 Перейти в канал";
const NEXT_BUTTON: &str = "➡️ Дальше";
const SKIP_BUTTON: &str = "➡️ Пропустить";
const SELECTED_MARK: &str = "✅ ";

pub fn details_prompt(rating: Rating) -> String {
    let question = if rating.is_positive() {
        "А что понравилось больше всего?"
    } else {
        "А что больше всего не зашло?"
    };
    format!(
        "Ты выбрал: {}\n\n{} Можно выбрать несколько вариантов.",
        rating.label(),
        question
    )
}

pub fn photo_ids_reply(file_id: &str, file_unique_id: &str) -> String {
    format!("file_id: {}\nfile_unique_id: {}", file_id, file_unique_id)
}

pub fn menu_keyboard() -> Keyboard {
    Keyboard::new()
        .single(Button::callback(
            "🔥 Оценить фото",
            CallbackData::Menu(MenuChoice::Rate).encode(),
        ))
        .single(Button::callback(
            "❓ Что за эксперимент?",
            CallbackData::Menu(MenuChoice::About).encode(),
        ))
}

pub fn about_keyboard() -> Keyboard {
    Keyboard::new().single(Button::callback(
        "🔙 Назад",
        CallbackData::Menu(MenuChoice::Back).encode(),
    ))
}

pub fn rating_keyboard() -> Keyboard {
    let button = |r: Rating| Button::callback(r.label(), CallbackData::Rate(r).encode());
    Keyboard::new()
        .row(vec![button(Rating::Like), button(Rating::SomewhatLike)])
        .row(vec![button(Rating::SomewhatDislike), button(Rating::Dislike)])
}

fn multi_select(
    options: &[&str],
    selected: &ToggleSet,
    payload: impl Fn(&str) -> CallbackData,
    done: CallbackData,
    done_label: &str,
) -> Keyboard {
    let mut kb = Keyboard::new();
    for opt in options {
        let mark = if selected.contains(opt) { SELECTED_MARK } else { "" };
        kb = kb.single(Button::callback(format!("{}{}", mark, opt), payload(opt).encode()));
    }
    kb.single(Button::callback(done_label, done.encode()))
}

/// Detail tags; the bottom button lets the user skip without picking any.
pub fn details_keyboard(options: &[&str], selected: &ToggleSet) -> Keyboard {
    multi_select(
        options,
        selected,
        |opt| CallbackData::ToggleDetail(opt.to_string()),
        CallbackData::DetailsNext,
        SKIP_BUTTON,
    )
}

pub fn city_keyboard() -> Keyboard {
    let mut kb = Keyboard::new();
    for city in CITIES {
        kb = kb.single(Button::callback(
            *city,
            CallbackData::City(CityChoice::Fixed(city.to_string())).encode(),
        ));
    }
    kb.single(Button::callback(
        "Другой город",
        CallbackData::City(CityChoice::Other).encode(),
    ))
}

pub fn invite_keyboard() -> Keyboard {
    Keyboard::new().row(vec![
        Button::callback("🔥 Да, хочу", CallbackData::Invite { accepted: true }.encode()),
        Button::callback("❌ Нет, спасибо", CallbackData::Invite { accepted: false }.encode()),
    ])
}

pub fn deep_keyboard(block: DeepBlock, selected: &ToggleSet) -> Keyboard {
    if block.is_multi_select() {
        multi_select(
            block.options(),
            selected,
            |opt| CallbackData::ToggleDeep(opt.to_string()),
            CallbackData::DeepNext,
            NEXT_BUTTON,
        )
    } else {
        let mut kb = Keyboard::new();
        for opt in block.options() {
            kb = kb.single(Button::callback(
                *opt,
                CallbackData::BodyType(opt.to_string()).encode(),
            ));
        }
        kb
    }
}

pub fn channel_keyboard(channel_url: &str) -> Keyboard {
    Keyboard::new().single(Button::url(CHANNEL_BUTTON, channel_url))
}
