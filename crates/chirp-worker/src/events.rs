/// Topics on the in-process bus. Front ends reload from storage when one of
/// these arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    /// A message was stored for this contact; its thread is stale.
    SmsReceived { contact_id: i64 },

    /// An unrecognized sender produced a fresh placeholder contact; any
    /// contact listing is stale. Carries no payload.
    UnknownSmsReceived,
}
