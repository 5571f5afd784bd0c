//! Best-effort fan-out of new responses to administrators

use std::sync::Arc;

use crate::event::ChatId;
use crate::messenger::Messenger;
use crate::record::ResponseRecord;

/// Outcome of one fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

pub struct AdminNotifier {
    messenger: Arc<dyn Messenger>,
    admins: Vec<ChatId>,
}

impl AdminNotifier {
    pub fn new(messenger: Arc<dyn Messenger>, admins: Vec<ChatId>) -> Self {
        Self { messenger, admins }
    }

    pub fn admins(&self) -> &[ChatId] {
        &self.admins
    }

    /// Send the record summary to every admin. No retries; one failing admin
    /// does not stop the others.
    pub async fn notify(&self, record: &ResponseRecord) -> DeliveryReport {
        let text = record.summary();
        let mut report = DeliveryReport::default();

        for admin in &self.admins {
            match self.messenger.send_message(*admin, &text, None).await {
                Ok(_) => report.delivered += 1,
                Err(e) => {
                    tracing::error!("Failed to notify admin {}: {}", admin, e);
                    report.failed += 1;
                }
            }
        }

        report
    }
}
