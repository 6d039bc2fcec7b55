use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};

use chirp_core::RadioEvent;
use chirp_db::{ChirpDb, Contact, Message};
use chirp_radio::RadioLink;

use crate::error::{Result, WorkerError};
use crate::events::WorkerEvent;
use crate::ingest;

/// The service layer: owns the store, the radio and the event bus. Front
/// ends talk to this and to nothing below it.
pub struct ChirpWorker {
    db: Arc<ChirpDb>,
    radio: Arc<RwLock<RadioLink>>,
    event_tx: mpsc::Sender<WorkerEvent>,
    event_rx: Option<mpsc::Receiver<WorkerEvent>>,
}

impl ChirpWorker {
    pub fn new(db: ChirpDb, radio: RadioLink) -> Self {
        let (event_tx, event_rx) = mpsc::channel(1000);
        Self {
            db: Arc::new(db),
            radio: Arc::new(RwLock::new(radio)),
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    /// The bus receiver. Can only be taken once.
    pub fn take_event_receiver(&mut self) -> Option<mpsc::Receiver<WorkerEvent>> {
        self.event_rx.take()
    }

    /// Starts the modem daemon and the pump that feeds its deliveries into
    /// the ingestion path.
    pub async fn start(&self) -> Result<()> {
        let mut radio = self.radio.write().await;
        radio.start()?;

        if let Some(mut rx) = radio.take_event_receiver() {
            let db = self.db.clone();
            let event_tx = self.event_tx.clone();

            tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    match event {
                        RadioEvent::Ready => tracing::info!("modem ready"),
                        RadioEvent::Deliver { pdus } => {
                            let batch = decode_hex_batch(&pdus);
                            ingest::ingest_pdu_batch(&db, &event_tx, &batch).await;
                        }
                        RadioEvent::Fault { detail } => {
                            tracing::warn!("modem fault: {detail}");
                        }
                    }
                }
            });
        }

        Ok(())
    }

    pub async fn stop(&self) -> Result<()> {
        self.radio.write().await.stop().await?;
        Ok(())
    }

    pub async fn add_contact(&self, contact: &Contact) -> Result<i64> {
        Ok(self.db.add_contact(contact).await?)
    }

    pub async fn update_contact(&self, contact: &Contact) -> Result<()> {
        Ok(self.db.update_contact(contact).await?)
    }

    pub async fn delete_contact(&self, id: i64) -> Result<()> {
        Ok(self.db.delete_contact(id).await?)
    }

    pub async fn contact(&self, id: i64) -> Result<Option<Contact>> {
        Ok(self.db.get_contact(id).await?)
    }

    pub async fn contacts(&self) -> Result<Vec<Contact>> {
        Ok(self.db.all_contacts().await?)
    }

    /// One contact's thread, oldest first. Storage promises no order, so the
    /// chronological sort happens here.
    pub async fn conversation(&self, contact_id: i64) -> Result<Vec<Message>> {
        let mut messages = self.db.messages_for_contact(contact_id).await?;
        messages.sort_by_key(|m| m.date);
        Ok(messages)
    }

    /// Stores the outbound message, then hands it to the radio. The radio's
    /// outcome is only logged: the stored row says "sent" even when
    /// transmission failed.
    pub async fn send_sms(&self, contact_id: i64, text: &str) -> Result<Message> {
        let contact = self
            .db
            .get_contact(contact_id)
            .await?
            .ok_or(WorkerError::ContactNotFound(contact_id))?;

        let mut message = Message {
            id: 0,
            contact_id,
            body: text.to_string(),
            date: ingest::now_millis(),
            is_sent: true,
        };
        message.id = self.db.add_message(&message).await?;

        let radio = self.radio.read().await;
        if let Err(e) = radio.send_text(&contact.tel_number, text) {
            tracing::warn!("radio send to {} failed: {e}", contact.tel_number);
        }

        Ok(message)
    }

    /// Feeds a raw PDU batch straight into ingestion, bypassing the radio.
    pub async fn ingest_batch(&self, pdus: &[Vec<u8>]) {
        ingest::ingest_pdu_batch(&self.db, &self.event_tx, pdus).await;
    }
}

/// What a contact is called in a thread header or a listing.
pub fn display_name(contact: &Contact) -> String {
    let full = format!("{} {}", contact.firstname, contact.lastname);
    let full = full.trim();
    if full.is_empty() {
        contact.tel_number.clone()
    } else {
        full.to_string()
    }
}

fn decode_hex_batch(pdus: &[String]) -> Vec<Vec<u8>> {
    pdus.iter()
        .filter_map(|h| match hex::decode(h) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!("dropping pdu with a bad hex payload: {e}");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    async fn worker() -> ChirpWorker {
        let db = ChirpDb::open_in_memory().await.unwrap();
        let radio = RadioLink::new(PathBuf::from("/nonexistent/modemd"));
        ChirpWorker::new(db, radio)
    }

    #[tokio::test]
    async fn send_persists_even_when_the_radio_is_dead() {
        let w = worker().await;
        let id = w.add_contact(&Contact::placeholder("0612345678")).await.unwrap();

        let sent = w.send_sms(id, "on my way").await.unwrap();
        assert!(sent.is_sent);
        assert!(sent.id > 0);

        let thread = w.conversation(id).await.unwrap();
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].body, "on my way");
        assert!(thread[0].is_sent);
    }

    #[tokio::test]
    async fn send_to_a_missing_contact_is_a_not_found_error() {
        let w = worker().await;
        assert!(matches!(
            w.send_sms(42, "hello?").await,
            Err(WorkerError::ContactNotFound(42))
        ));
    }

    #[tokio::test]
    async fn conversation_is_sorted_by_date() {
        let w = worker().await;
        let id = w.add_contact(&Contact::placeholder("0612345678")).await.unwrap();

        for (date, body) in [(300, "late"), (100, "early"), (200, "middle")] {
            w.db
                .add_message(&Message {
                    id: 0,
                    contact_id: id,
                    body: body.into(),
                    date,
                    is_sent: false,
                })
                .await
                .unwrap();
        }

        let bodies: Vec<_> = w
            .conversation(id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.body)
            .collect();
        assert_eq!(bodies, ["early", "middle", "late"]);
    }

    #[test]
    fn hex_batch_drops_bad_elements_only() {
        let decoded = decode_hex_batch(&[
            "0004".to_string(),
            "zz".to_string(),
            "ff".to_string(),
        ]);
        assert_eq!(decoded, vec![vec![0x00, 0x04], vec![0xFF]]);
    }

    #[test]
    fn display_name_falls_back_to_the_number() {
        let named = Contact {
            id: 1,
            firstname: "Ada".into(),
            lastname: "Lovelace".into(),
            email: String::new(),
            address: String::new(),
            tel_number: "0612345678".into(),
            picture: String::new(),
        };
        assert_eq!(display_name(&named), "Ada Lovelace");

        let first_only = Contact {
            lastname: String::new(),
            ..named.clone()
        };
        assert_eq!(display_name(&first_only), "Ada");

        let anonymous = Contact {
            firstname: String::new(),
            lastname: String::new(),
            ..named
        };
        assert_eq!(display_name(&anonymous), "0612345678");
    }
}
