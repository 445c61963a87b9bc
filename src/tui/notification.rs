//! Transient status-line messages.
//!
//! A newer notification always replaces the shown one. Every notification
//! gets a generation number when it is shown; its expiry timer carries that
//! number, and an expiry for an older generation is ignored.

use std::time::Duration;

use crate::tui::command::{Command, Message};

pub const DEFAULT_DURATION: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub text: String,
    /// `None` falls back to the navigator's default duration.
    pub duration: Option<Duration>,
}

impl Notification {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            duration: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// The notification currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shown {
    pub text: String,
    pub generation: u64,
}

/// Owns the generation counter and the shown notification.
#[derive(Debug, Default)]
pub struct Notifier {
    generation: u64,
    shown: Option<Shown>,
}

impl Notifier {
    /// Shows `notification` and returns the single expiry command for it.
    pub fn show(&mut self, notification: Notification, default: Duration) -> Command {
        self.generation += 1;
        let generation = self.generation;
        self.shown = Some(Shown {
            text: notification.text,
            generation,
        });
        let duration = notification.duration.unwrap_or(default);
        Command::Perform(Box::pin(async move {
            tokio::time::sleep(duration).await;
            Some(Message::NotificationExpired(generation))
        }))
    }

    /// Clears the notification if `generation` is still the shown one.
    /// Returns whether anything was cleared.
    pub fn expire(&mut self, generation: u64) -> bool {
        match &self.shown {
            Some(shown) if shown.generation == generation => {
                self.shown = None;
                true
            }
            _ => false,
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.shown.as_ref().map(|s| s.text.as_str())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_expiry_does_not_clear_newer_notification() {
        let mut notifier = Notifier::default();
        let _ = notifier.show(Notification::new("first"), DEFAULT_DURATION);
        let first = notifier.generation();
        let _ = notifier.show(Notification::new("second"), DEFAULT_DURATION);

        assert!(!notifier.expire(first));
        assert_eq!(notifier.current(), Some("second"));

        assert!(notifier.expire(notifier.generation()));
        assert_eq!(notifier.current(), None);
    }

    #[test]
    fn test_generations_increase_monotonically() {
        let mut notifier = Notifier::default();
        let mut last = 0;
        for i in 0..5 {
            let _ = notifier.show(Notification::new(format!("n{i}")), DEFAULT_DURATION);
            assert!(notifier.generation() > last);
            last = notifier.generation();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_command_yields_its_generation() {
        let mut notifier = Notifier::default();
        let cmd = notifier.show(
            Notification::new("saved").with_duration(Duration::from_millis(300)),
            DEFAULT_DURATION,
        );
        let Command::Perform(fut) = cmd else {
            panic!("expected a timer command");
        };
        match fut.await {
            Some(Message::NotificationExpired(generation)) => assert_eq!(generation, 1),
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
