use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chirp_core::UserNotice;

/// Tracks foreground/background transitions for the whole app.
///
/// Owned by the composition root and passed to whoever drives the front
/// end; nothing here is global. On return to the foreground the injected
/// notice port is told how long the app was away.
pub struct AppLifecycle {
    notice: Arc<dyn UserNotice>,
    state: Mutex<LifecycleState>,
}

#[derive(Default)]
struct LifecycleState {
    background_since: Option<Instant>,
    was_in_background: bool,
}

impl AppLifecycle {
    pub fn new(notice: Arc<dyn UserNotice>) -> Self {
        Self {
            notice,
            state: Mutex::new(LifecycleState::default()),
        }
    }

    pub fn on_background(&self) {
        tracing::debug!("application moved to the background");
        let mut state = self.lock();
        state.background_since = Some(Instant::now());
        state.was_in_background = true;
    }

    pub fn on_foreground(&self) {
        let since = self.lock().background_since.take();
        if let Some(since) = since {
            let away = since.elapsed();
            tracing::debug!("application back after {} sec", away.as_secs());
            self.notice.notify(&format!("Back after {} sec", away.as_secs()));
        }
    }

    /// True when the app went to the background since the last call; the
    /// flag resets on read.
    pub fn was_in_background(&self) -> bool {
        std::mem::take(&mut self.lock().was_in_background)
    }

    /// Time spent in the background so far, `None` while in the foreground.
    pub fn background_elapsed(&self) -> Option<Duration> {
        self.lock().background_since.map(|since| since.elapsed())
    }

    fn lock(&self) -> MutexGuard<'_, LifecycleState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingNotice {
        seen: Mutex<Vec<String>>,
    }

    impl UserNotice for RecordingNotice {
        fn notify(&self, text: &str) {
            self.seen.lock().unwrap().push(text.to_string());
        }
    }

    #[test]
    fn flag_resets_on_read() {
        let lifecycle = AppLifecycle::new(Arc::new(chirp_core::SilentNotice));
        assert!(!lifecycle.was_in_background());

        lifecycle.on_background();
        assert!(lifecycle.was_in_background());
        assert!(!lifecycle.was_in_background());
    }

    #[test]
    fn elapsed_only_while_backgrounded() {
        let lifecycle = AppLifecycle::new(Arc::new(chirp_core::SilentNotice));
        assert!(lifecycle.background_elapsed().is_none());

        lifecycle.on_background();
        std::thread::sleep(Duration::from_millis(10));
        let elapsed = lifecycle.background_elapsed().expect("backgrounded");
        assert!(elapsed >= Duration::from_millis(10));

        lifecycle.on_foreground();
        assert!(lifecycle.background_elapsed().is_none());
    }

    #[test]
    fn returning_to_foreground_raises_one_notice() {
        let notice = Arc::new(RecordingNotice::default());
        let lifecycle = AppLifecycle::new(notice.clone());

        lifecycle.on_background();
        lifecycle.on_foreground();
        // A second foreground without a background in between stays quiet.
        lifecycle.on_foreground();

        let seen = notice.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].starts_with("Back after"));
    }
}
