//! Survey conversation state machine
//!
//! [`accept`] decides whether the current state takes a button press; the
//! engine then applies the transition, renders the next prompt, and on a
//! terminal branch assembles, stores and announces the response.

use std::sync::Arc;

use crate::catalog::{DeepBlock, Rating, CITIES};
use crate::event::{CallbackData, ChatId, CityChoice, InboundEvent, MenuChoice, MessageRef, Origin};
use crate::messenger::{edit_markup_or_send, edit_or_send, Keyboard, Messenger};
use crate::notify::{AdminNotifier, DeliveryReport};
use crate::prompts;
use crate::record::ResponseRecord;
use crate::session::{Session, SessionStore, SurveyState};
use crate::store::ResponseStore;
use crate::toggle::ToggleSet;

/// Command that (re)starts the conversation
pub const START_COMMAND: &str = "start";

/// Number of pool photos shown in the album
const ALBUM_SIZE: usize = 2;

/// Engine settings supplied by configuration
#[derive(Debug, Clone)]
pub struct SurveySettings {
    /// Photo references, the album uses the first two
    pub photo_pool: Vec<String>,
    pub admins: Vec<ChatId>,
    pub channel_url: String,
    /// Reply to photo messages with their file ids
    pub echo_photo_ids: bool,
}

/// A button press accepted by the current state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    ShowAbout,
    ShowStart,
    BeginRating,
    Rate(Rating),
    ToggleDetail(String),
    DetailsDone,
    AskCity,
    PickCity(String),
    Decline,
    AcceptDeep,
    ToggleDeep(String),
    DeepNext,
    PickBodyType(String),
}

/// Button presses accepted in the session's current state.
///
/// Option payloads must name an option offered at that step; anything else
/// is rejected and leaves the session untouched.
pub fn accept(session: &Session, data: &CallbackData) -> Option<Transition> {
    let state = session.state;
    match (state, data) {
        (SurveyState::StartMenu, CallbackData::Menu(MenuChoice::About)) => Some(Transition::ShowAbout),
        (SurveyState::StartMenu, CallbackData::Menu(MenuChoice::Back)) => Some(Transition::ShowStart),
        (SurveyState::StartMenu, CallbackData::Menu(MenuChoice::Rate)) => Some(Transition::BeginRating),

        (SurveyState::RatePhoto, CallbackData::Rate(rating)) => Some(Transition::Rate(*rating)),

        (SurveyState::AfterRating, CallbackData::ToggleDetail(opt))
            if session
                .rating
                .is_some_and(|r| r.detail_options().contains(&opt.as_str())) =>
        {
            Some(Transition::ToggleDetail(opt.clone()))
        }
        (SurveyState::AfterRating, CallbackData::DetailsNext) => Some(Transition::DetailsDone),

        (SurveyState::CityChoice, CallbackData::City(CityChoice::Other)) => Some(Transition::AskCity),
        (SurveyState::CityChoice, CallbackData::City(CityChoice::Fixed(city)))
            if CITIES.contains(&city.as_str()) =>
        {
            Some(Transition::PickCity(city.clone()))
        }

        (SurveyState::InviteDeep, CallbackData::Invite { accepted: false }) => Some(Transition::Decline),
        (SurveyState::InviteDeep, CallbackData::Invite { accepted: true }) => Some(Transition::AcceptDeep),

        (
            SurveyState::DeepBlock1 | SurveyState::DeepBlock3 | SurveyState::DeepBlock4,
            CallbackData::ToggleDeep(opt),
        ) if state.deep_block().is_some_and(|b| b.offers(opt)) => {
            Some(Transition::ToggleDeep(opt.clone()))
        }
        (
            SurveyState::DeepBlock1 | SurveyState::DeepBlock3 | SurveyState::DeepBlock4,
            CallbackData::DeepNext,
        ) => Some(Transition::DeepNext),

        (SurveyState::DeepBlock2, CallbackData::BodyType(opt)) if DeepBlock::Body.offers(opt) => {
            Some(Transition::PickBodyType(opt.clone()))
        }

        _ => None,
    }
}

/// What handling one event did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Conversation (re)started at the menu
    Started,
    /// Session moved between (or stayed in) non-terminal states
    Transitioned { from: SurveyState, to: SurveyState },
    /// Terminal branch reached; the session is gone
    Finalized {
        record: ResponseRecord,
        stored: bool,
        notified: DeliveryReport,
    },
    /// Not accepted in the current state; acknowledged only
    Ignored { state: Option<SurveyState> },
    /// Session discarded without a record
    Abandoned,
    /// Reply outside the conversation
    Replied,
}

enum Step {
    Continue,
    Finished(Outcome),
}

/// Survey engine - drives one conversation per chat participant
pub struct SurveyEngine {
    sessions: SessionStore,
    messenger: Arc<dyn Messenger>,
    store: Arc<ResponseStore>,
    notifier: AdminNotifier,
    settings: SurveySettings,
}

impl SurveyEngine {
    pub fn new(messenger: Arc<dyn Messenger>, store: Arc<ResponseStore>, settings: SurveySettings) -> Self {
        let notifier = AdminNotifier::new(messenger.clone(), settings.admins.clone());
        Self {
            sessions: SessionStore::new(),
            messenger,
            store,
            notifier,
            settings,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn store(&self) -> &Arc<ResponseStore> {
        &self.store
    }

    /// Handle one inbound event.
    ///
    /// Events of one chat must be handed in one at a time.
    pub async fn handle(&self, event: InboundEvent) -> Outcome {
        tracing::debug!("Event from {}: {}", event.origin(), event.kind());
        match event {
            InboundEvent::Command { origin, name } if name == START_COMMAND => self.start(origin).await,
            InboundEvent::Command { origin, name } => {
                tracing::debug!("Unknown command /{} from {}", name, origin);
                self.reply(origin.chat_id, prompts::UNKNOWN_COMMAND).await;
                Outcome::Replied
            }
            InboundEvent::Button {
                origin,
                callback_id,
                message,
                data,
            } => self.on_button(origin, &callback_id, message, &data).await,
            InboundEvent::Text { origin, text } => self.on_text(origin, &text).await,
            InboundEvent::Photo {
                origin,
                file_id,
                file_unique_id,
            } => {
                if !self.settings.echo_photo_ids {
                    return Outcome::Ignored {
                        state: self.sessions.get(&origin).map(|s| s.state),
                    };
                }
                self.reply(origin.chat_id, &prompts::photo_ids_reply(&file_id, &file_unique_id))
                    .await;
                Outcome::Replied
            }
        }
    }

    async fn start(&self, origin: Origin) -> Outcome {
        self.sessions.create(origin);
        tracing::info!("Survey started for {}", origin);
        self.reply_with(origin.chat_id, prompts::START_TEXT, &prompts::menu_keyboard())
            .await;
        Outcome::Started
    }

    async fn on_button(
        &self,
        origin: Origin,
        callback_id: &str,
        message: Option<MessageRef>,
        data: &str,
    ) -> Outcome {
        let Some(mut session) = self.sessions.take(&origin) else {
            tracing::debug!("Button {:?} from {} without a session", data, origin);
            self.acknowledge(callback_id).await;
            return Outcome::Ignored { state: None };
        };

        let transition = CallbackData::parse(data).and_then(|d| accept(&session, &d));
        self.acknowledge(callback_id).await;

        let Some(transition) = transition else {
            tracing::debug!("Button {:?} not accepted in {} for {}", data, session.state, origin);
            let state = session.state;
            self.sessions.put(session);
            return Outcome::Ignored { state: Some(state) };
        };

        let from = session.state;
        session.touch();
        match self.apply(&mut session, transition, message.as_ref()).await {
            Step::Continue => {
                let to = session.state;
                tracing::debug!("{}: {} -> {}", origin, from, to);
                self.sessions.put(session);
                Outcome::Transitioned { from, to }
            }
            Step::Finished(outcome) => outcome,
        }
    }

    async fn on_text(&self, origin: Origin, text: &str) -> Outcome {
        let Some(mut session) = self.sessions.take(&origin) else {
            tracing::debug!("Text from {} without a session, ignoring", origin);
            return Outcome::Ignored { state: None };
        };

        if session.state != SurveyState::OtherCity {
            tracing::info!("Free text in {} from {}, ending conversation", session.state, origin);
            self.reply(origin.chat_id, prompts::USE_MENU).await;
            return Outcome::Abandoned;
        }

        let city = text.trim();
        if city.is_empty() {
            self.reply(origin.chat_id, prompts::OTHER_CITY_PROMPT).await;
            self.sessions.put(session);
            return Outcome::Ignored {
                state: Some(SurveyState::OtherCity),
            };
        }

        session.touch();
        session.city = Some(city.to_string());
        session.details = std::mem::take(&mut session.details_selected).into_vec();
        session.state = SurveyState::InviteDeep;
        self.reply_with(origin.chat_id, prompts::INVITE_PROMPT, &prompts::invite_keyboard())
            .await;
        self.sessions.put(session);

        Outcome::Transitioned {
            from: SurveyState::OtherCity,
            to: SurveyState::InviteDeep,
        }
    }

    async fn apply(&self, session: &mut Session, transition: Transition, message: Option<&MessageRef>) -> Step {
        let chat = session.origin.chat_id;

        match transition {
            Transition::ShowAbout => {
                self.render(chat, message, prompts::ABOUT_TEXT, &prompts::about_keyboard())
                    .await;
            }
            Transition::ShowStart => {
                self.render(chat, message, prompts::START_TEXT, &prompts::menu_keyboard())
                    .await;
            }
            Transition::BeginRating => {
                let photos: Vec<String> = self
                    .settings
                    .photo_pool
                    .iter()
                    .take(ALBUM_SIZE)
                    .cloned()
                    .collect();
                let Some(first) = photos.first().cloned() else {
                    tracing::error!("Photo pool is empty, cannot start rating");
                    return Step::Continue;
                };

                if let Some(menu) = message {
                    if let Err(e) = self.messenger.delete_message(menu).await {
                        tracing::debug!("Could not delete menu message: {}", e);
                    }
                }

                match self
                    .messenger
                    .send_photo_album(chat, &photos, prompts::ALBUM_CAPTION)
                    .await
                {
                    Ok(sent) => session.photo_message = sent.first().copied(),
                    Err(e) => tracing::warn!("Failed to send photo album to {}: {}", chat, e),
                }
                session.current_photo = Some(first);

                self.reply_with(chat, prompts::RATING_PROMPT, &prompts::rating_keyboard())
                    .await;
                session.state = SurveyState::RatePhoto;
            }
            Transition::Rate(rating) => {
                session.rating = Some(rating);
                session.details_selected = ToggleSet::new();
                let kb = prompts::details_keyboard(rating.detail_options(), &session.details_selected);
                self.render(chat, message, &prompts::details_prompt(rating), &kb)
                    .await;
                session.state = SurveyState::AfterRating;
            }
            Transition::ToggleDetail(option) => {
                session.details_selected.toggle(&option);
                let options = session.rating.map(Rating::detail_options).unwrap_or_default();
                let kb = prompts::details_keyboard(options, &session.details_selected);
                self.rerender(chat, message, &kb).await;
            }
            Transition::DetailsDone => {
                self.render(chat, message, prompts::CITY_PROMPT, &prompts::city_keyboard())
                    .await;
                session.state = SurveyState::CityChoice;
            }
            Transition::AskCity => {
                self.report(
                    edit_or_send(self.messenger.as_ref(), chat, message, prompts::OTHER_CITY_PROMPT, None).await,
                    "free-text city prompt",
                );
                session.state = SurveyState::OtherCity;
            }
            Transition::PickCity(city) => {
                session.city = Some(city);
                session.details = std::mem::take(&mut session.details_selected).into_vec();
                self.render(chat, message, prompts::INVITE_PROMPT, &prompts::invite_keyboard())
                    .await;
                session.state = SurveyState::InviteDeep;
            }
            Transition::Decline => {
                session.deep = None;
                return Step::Finished(self.finalize(session, message, prompts::THANKS_DECLINED).await);
            }
            Transition::AcceptDeep => {
                session.deep = Some(Default::default());
                self.open_deep_block(session, message, SurveyState::DeepBlock1).await;
            }
            Transition::ToggleDeep(option) => {
                let Some(block) = session.state.deep_block() else {
                    return Step::Continue;
                };
                let buffer = session.deep_buffer.get_or_insert_with(ToggleSet::new);
                buffer.toggle(&option);
                let kb = prompts::deep_keyboard(block, buffer);
                self.rerender(chat, message, &kb).await;
            }
            Transition::PickBodyType(choice) => {
                session.deep.get_or_insert_with(Default::default).block2 = Some(choice);
                self.open_deep_block(session, message, SurveyState::DeepBlock3).await;
            }
            Transition::DeepNext => {
                let selected = session.deep_buffer.take().unwrap_or_default().into_vec();
                let deep = session.deep.get_or_insert_with(Default::default);
                match session.state {
                    SurveyState::DeepBlock1 => {
                        deep.block1 = Some(selected);
                        self.open_deep_block(session, message, SurveyState::DeepBlock2).await;
                    }
                    SurveyState::DeepBlock3 => {
                        deep.block3 = Some(selected);
                        self.open_deep_block(session, message, SurveyState::DeepBlock4).await;
                    }
                    SurveyState::DeepBlock4 => {
                        deep.block4 = Some(selected);
                        return Step::Finished(
                            self.finalize(session, message, prompts::THANKS_COMPLETED).await,
                        );
                    }
                    other => tracing::warn!("deep_next accepted in unexpected state {}", other),
                }
            }
        }

        Step::Continue
    }

    /// Enter a questionnaire block with an empty selection
    async fn open_deep_block(&self, session: &mut Session, message: Option<&MessageRef>, next: SurveyState) {
        let Some(block) = next.deep_block() else {
            return;
        };
        let selected = ToggleSet::new();
        let kb = prompts::deep_keyboard(block, &selected);
        session.deep_buffer = block.is_multi_select().then_some(selected);
        self.render(session.origin.chat_id, message, block.question(), &kb)
            .await;
        session.state = next;
    }

    /// Assemble, persist and announce the response. The session is not put
    /// back afterwards.
    async fn finalize(&self, session: &mut Session, message: Option<&MessageRef>, thanks: &str) -> Outcome {
        session.state = SurveyState::Completed;
        session.deep_buffer = None;
        let origin = session.origin;

        let record = match ResponseRecord::assemble(session) {
            Ok(record) => record,
            Err(e) => {
                tracing::error!("Cannot finalize survey for {}: {}", origin, e);
                self.reply(origin.chat_id, prompts::USE_MENU).await;
                return Outcome::Abandoned;
            }
        };

        let stored = match self.store.append(&record).await {
            Ok(total) => {
                tracing::info!("Response from {} stored ({} total)", origin, total);
                true
            }
            Err(e) => {
                tracing::error!("Failed to store response from {}: {}", origin, e);
                false
            }
        };

        let notified = self.notifier.notify(&record).await;

        let kb = prompts::channel_keyboard(&self.settings.channel_url);
        if let Err(e) = edit_or_send(self.messenger.as_ref(), origin.chat_id, message, thanks, Some(&kb)).await {
            tracing::debug!("Thank-you message to {} not delivered: {}", origin, e);
        }

        Outcome::Finalized {
            record,
            stored,
            notified,
        }
    }

    async fn render(&self, chat: ChatId, message: Option<&MessageRef>, text: &str, keyboard: &Keyboard) {
        self.report(
            edit_or_send(self.messenger.as_ref(), chat, message, text, Some(keyboard)).await,
            "prompt",
        );
    }

    async fn rerender(&self, chat: ChatId, message: Option<&MessageRef>, keyboard: &Keyboard) {
        self.report(
            edit_markup_or_send(self.messenger.as_ref(), chat, message, keyboard, prompts::SELECTION_UPDATED)
                .await,
            "selection update",
        );
    }

    async fn reply(&self, chat: ChatId, text: &str) {
        self.report(self.messenger.send_message(chat, text, None).await.map(|_| ()), "reply");
    }

    async fn reply_with(&self, chat: ChatId, text: &str, keyboard: &Keyboard) {
        self.report(
            self.messenger.send_message(chat, text, Some(keyboard)).await.map(|_| ()),
            "reply",
        );
    }

    async fn acknowledge(&self, callback_id: &str) {
        if let Err(e) = self.messenger.acknowledge(callback_id, None).await {
            tracing::debug!("Failed to acknowledge callback {}: {}", callback_id, e);
        }
    }

    fn report(&self, result: crate::Result<()>, what: &str) {
        if let Err(e) = result {
            tracing::warn!("Failed to deliver {}: {}", what, e);
        }
    }
}
