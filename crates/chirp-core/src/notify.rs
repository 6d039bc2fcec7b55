/// Port for transient user-facing notices.
///
/// Non-UI layers that need to surface something to the user (the lifecycle
/// tracker, mainly) get one of these injected instead of reaching for a
/// global. Front ends provide the real implementation.
pub trait UserNotice: Send + Sync {
    fn notify(&self, text: &str);
}

/// Discards every notice. Default for library code and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotice;

impl UserNotice for SilentNotice {
    fn notify(&self, _text: &str) {}
}
