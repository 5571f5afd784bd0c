//! Finalized survey responses

use serde::{Deserialize, Serialize};

use crate::catalog::{DeepBlock, Rating};
use crate::event::UserId;
use crate::session::Session;
use crate::{Result, SurveyError};

/// Answers to all four questionnaire blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepAnswers {
    pub block1: Vec<String>,
    pub block2: String,
    pub block3: Vec<String>,
    pub block4: Vec<String>,
}

/// Completed survey response, as persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub user_id: UserId,
    pub photo: String,
    pub rating: Rating,
    pub details: Vec<String>,
    pub city: String,
    /// `null` when the questionnaire was declined
    pub deep: Option<DeepAnswers>,
}

impl ResponseRecord {
    /// Build the record from a session that reached a terminal branch.
    ///
    /// A session that accepted the questionnaire must have all four blocks.
    pub fn assemble(session: &Session) -> Result<Self> {
        let deep = match &session.deep {
            None => None,
            Some(draft) => Some(draft.finish().ok_or(SurveyError::IncompleteSession("deep"))?),
        };

        Ok(Self {
            user_id: session.origin.user_id,
            photo: session
                .current_photo
                .clone()
                .ok_or(SurveyError::IncompleteSession("photo"))?,
            rating: session.rating.ok_or(SurveyError::IncompleteSession("rating"))?,
            details: session.details.clone(),
            city: session
                .city
                .clone()
                .ok_or(SurveyError::IncompleteSession("city"))?,
            deep,
        })
    }

    /// Details belong to the rating's branch and deep answers come from the
    /// offered options.
    pub fn is_consistent(&self) -> bool {
        let branch = self.rating.detail_options();
        let details_ok = self.details.iter().all(|d| branch.contains(&d.as_str()));
        let deep_ok = self.deep.as_ref().map_or(true, |deep| {
            deep.block1.iter().all(|o| DeepBlock::Face.offers(o))
                && DeepBlock::Body.offers(&deep.block2)
                && deep.block3.iter().all(|o| DeepBlock::Style.offers(o))
                && deep.block4.iter().all(|o| DeepBlock::Vibe.offers(o))
        });
        details_ok && deep_ok
    }

    /// Human-readable summary sent to administrators
    pub fn summary(&self) -> String {
        let deep = serde_json::to_string(&self.deep).unwrap_or_else(|_| "null".to_string());
        format!(
            "Новый ответ:\n\
             Пользователь ID: {}\n\n\
             Фото: {}\n\
             Оценка: {}\n\
             Детали: {}\n\
             Город: {}\n\
             Глубокие ответы: {}",
            self.user_id,
            self.photo,
            self.rating,
            self.details.join(", "),
            self.city,
            deep
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Origin;
    use crate::session::DeepDraft;

    fn finished_session() -> Session {
        let mut session = Session::new(Origin::new(7, 42));
        session.current_photo = Some("photo-a".into());
        session.rating = Some(Rating::Like);
        session.details = vec!["👀 Глаза".into()];
        session.city = Some("Минск".into());
        session
    }

    #[test]
    fn test_assemble_declined() {
        let record = ResponseRecord::assemble(&finished_session()).unwrap();
        assert_eq!(record.user_id, UserId(42));
        assert!(record.deep.is_none());
        assert!(record.is_consistent());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["deep"], serde_json::Value::Null);
        assert_eq!(json["user_id"], 42);
        assert_eq!(json["rating"], "❤️ Нравится");
    }

    #[test]
    fn test_assemble_rejects_partial_deep() {
        let mut session = finished_session();
        session.deep = Some(DeepDraft {
            block1: Some(vec![]),
            ..Default::default()
        });
        assert!(matches!(
            ResponseRecord::assemble(&session),
            Err(SurveyError::IncompleteSession("deep"))
        ));
    }

    #[test]
    fn test_assemble_requires_city() {
        let mut session = finished_session();
        session.city = None;
        assert!(ResponseRecord::assemble(&session).is_err());
    }

    #[test]
    fn test_wrong_branch_details_are_inconsistent() {
        let mut record = ResponseRecord::assemble(&finished_session()).unwrap();
        record.details = vec!["🤷 Не мой типаж".into()];
        assert!(!record.is_consistent());
    }

    #[test]
    fn test_summary_lists_fields() {
        let record = ResponseRecord::assemble(&finished_session()).unwrap();
        let summary = record.summary();
        assert!(summary.contains("Пользователь ID: 42"));
        assert!(summary.contains("Город: Минск"));
        assert!(summary.ends_with("Глубокие ответы: null"));
    }
}
