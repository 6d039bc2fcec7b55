use tokio::sync::mpsc;

use chirp_core::{DeliverPdu, normalize_number};
use chirp_db::ChirpDb;

use crate::events::WorkerEvent;

/// Handles one OS-level delivery: a batch of raw SMS-DELIVER PDUs.
///
/// Each PDU is processed on its own: decoded, matched to a contact
/// (creating one for an unknown sender), stored, then announced on the bus. A
/// malformed or address-less PDU is skipped and the rest of the batch still
/// lands; each insert commits independently, so there is nothing to roll
/// back across PDUs.
pub(crate) async fn ingest_pdu_batch(
    db: &ChirpDb,
    event_tx: &mpsc::Sender<WorkerEvent>,
    pdus: &[Vec<u8>],
) {
    for raw in pdus {
        if let Err(e) = ingest_one(db, event_tx, raw).await {
            tracing::error!("failed to store incoming sms: {e}");
        }
    }
}

async fn ingest_one(
    db: &ChirpDb,
    event_tx: &mpsc::Sender<WorkerEvent>,
    raw: &[u8],
) -> Result<(), chirp_db::DbError> {
    let pdu = match DeliverPdu::parse(raw) {
        Ok(pdu) => pdu,
        Err(e) => {
            tracing::warn!("dropping undecodable pdu: {e}");
            return Ok(());
        }
    };

    let Some(sender) = pdu.sender else {
        tracing::debug!("dropping pdu without an originating address");
        return Ok(());
    };

    let number = normalize_number(&sender);
    let record = db.record_incoming(&number, &pdu.body, now_millis()).await?;

    if record.created {
        tracing::info!(number = %record.contact.tel_number, "created contact for unknown sender");
        let _ = event_tx.send(WorkerEvent::UnknownSmsReceived).await;
    }
    let _ = event_tx
        .send(WorkerEvent::SmsReceived {
            contact_id: record.contact.id,
        })
        .await;

    Ok(())
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal SMS-DELIVER builder: numeric sender (international when it
    /// starts with '+'), 7-bit body, no UDH, no SMSC prefix.
    pub(crate) fn deliver_pdu(sender: &str, body: &str) -> Vec<u8> {
        let (digits, toa) = match sender.strip_prefix('+') {
            Some(rest) => (rest, 0x91u8),
            None => (sender, 0x81u8),
        };

        let mut pdu = vec![0x00, 0x04];
        pdu.push(digits.len() as u8);
        pdu.push(toa);
        pdu.extend(digits.as_bytes().chunks(2).map(|pair| {
            let lo = pair[0] - b'0';
            let hi = if pair.len() == 2 { pair[1] - b'0' } else { 0xF };
            (hi << 4) | lo
        }));
        pdu.extend([0x00, 0x00]);
        pdu.extend([0x52, 0x30, 0x52, 0x12, 0x43, 0x21, 0x00]);

        let mut acc: u32 = 0;
        let mut bits = 0;
        let mut packed = Vec::new();
        for c in body.chars() {
            acc |= ((c as u8 & 0x7F) as u32) << bits;
            bits += 7;
            while bits >= 8 {
                packed.push((acc & 0xFF) as u8);
                acc >>= 8;
                bits -= 8;
            }
        }
        if bits > 0 {
            packed.push((acc & 0xFF) as u8);
        }
        pdu.push(body.len() as u8);
        pdu.extend(packed);
        pdu
    }

    async fn setup() -> (ChirpDb, mpsc::Sender<WorkerEvent>, mpsc::Receiver<WorkerEvent>) {
        let db = ChirpDb::open_in_memory().await.unwrap();
        let (tx, rx) = mpsc::channel(64);
        (db, tx, rx)
    }

    #[tokio::test]
    async fn unknown_sender_creates_one_contact_and_both_events() {
        let (db, tx, mut rx) = setup().await;

        ingest_pdu_batch(&db, &tx, &[deliver_pdu("+33612345678", "salut")]).await;

        let contacts = db.all_contacts().await.unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].tel_number, "0612345678");
        assert_eq!(contacts[0].firstname, "0612345678");

        assert_eq!(rx.try_recv().unwrap(), WorkerEvent::UnknownSmsReceived);
        assert_eq!(
            rx.try_recv().unwrap(),
            WorkerEvent::SmsReceived {
                contact_id: contacts[0].id
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn known_sender_reuses_the_contact_without_the_unknown_event() {
        let (db, tx, mut rx) = setup().await;

        ingest_pdu_batch(&db, &tx, &[deliver_pdu("0612345678", "first")]).await;
        while rx.try_recv().is_ok() {}

        ingest_pdu_batch(&db, &tx, &[deliver_pdu("+33612345678", "second")]).await;

        let contacts = db.all_contacts().await.unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(
            rx.try_recv().unwrap(),
            WorkerEvent::SmsReceived {
                contact_id: contacts[0].id
            }
        );
        assert!(rx.try_recv().is_err());

        let thread = db.messages_for_contact(contacts[0].id).await.unwrap();
        assert_eq!(thread.len(), 2);
        assert!(thread.iter().all(|m| !m.is_sent));
    }

    #[tokio::test]
    async fn stored_body_matches_the_decoded_text() {
        let (db, tx, _rx) = setup().await;

        ingest_pdu_batch(&db, &tx, &[deliver_pdu("0611111111", "see you at 8")]).await;

        let contact = db.get_contact_by_number("0611111111").await.unwrap().unwrap();
        let thread = db.messages_for_contact(contact.id).await.unwrap();
        assert_eq!(thread[0].body, "see you at 8");
    }

    #[tokio::test]
    async fn address_less_pdu_is_skipped_but_batch_survives() {
        let (db, tx, mut rx) = setup().await;

        let batch = vec![
            deliver_pdu("0611111111", "one"),
            deliver_pdu("", "from nobody"),
            deliver_pdu("0633333333", "three"),
        ];
        ingest_pdu_batch(&db, &tx, &batch).await;

        let contacts = db.all_contacts().await.unwrap();
        assert_eq!(contacts.len(), 2);

        let first = db.get_contact_by_number("0611111111").await.unwrap().unwrap();
        let third = db.get_contact_by_number("0633333333").await.unwrap().unwrap();
        assert_eq!(db.messages_for_contact(first.id).await.unwrap().len(), 1);
        assert_eq!(db.messages_for_contact(third.id).await.unwrap().len(), 1);

        // Four events: two unknown-contact, two new-message. None for the
        // dropped middle PDU.
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events.len(), 4);
    }

    #[tokio::test]
    async fn undecodable_pdu_is_skipped_but_batch_survives() {
        let (db, tx, _rx) = setup().await;

        let batch = vec![
            deliver_pdu("0611111111", "good"),
            vec![0x00, 0x04, 0x0A], // truncated mid-header
            deliver_pdu("0622222222", "also good"),
        ];
        ingest_pdu_batch(&db, &tx, &batch).await;

        assert_eq!(db.all_contacts().await.unwrap().len(), 2);
    }
}
