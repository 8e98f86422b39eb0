//! Single-slot notification service.
//!
//! At most one notification is visible at a time: showing a new one replaces
//! the current one. A shown notification expires after the configured delay
//! unless dismissed earlier.

use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Increases by one for every shown notification.
    pub seq: u64,
    pub kind: NotificationKind,
    pub message: String,
    pub shown_at: Instant,
}

type DisplayHook = Box<dyn FnMut(&Notification)>;

pub struct Notifier {
    slot: Option<Notification>,
    next_seq: u64,
    dismiss_after: Duration,
    on_show: Option<DisplayHook>,
}

impl Notifier {
    pub fn new(dismiss_after: Duration) -> Self {
        Self {
            slot: None,
            next_seq: 1,
            dismiss_after,
            on_show: None,
        }
    }

    /// Install a hook called for every shown notification.
    pub fn with_display(mut self, hook: impl FnMut(&Notification) + 'static) -> Self {
        self.on_show = Some(Box::new(hook));
        self
    }

    /// Show `message`, replacing whatever is currently displayed.
    pub fn notify(&mut self, message: impl Into<String>, kind: NotificationKind) {
        let notification = Notification {
            seq: self.next_seq,
            kind,
            message: message.into(),
            shown_at: Instant::now(),
        };
        self.next_seq += 1;
        if let Some(hook) = self.on_show.as_mut() {
            hook(&notification);
        }
        self.slot = Some(notification);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.notify(message, NotificationKind::Info);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.notify(message, NotificationKind::Success);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.notify(message, NotificationKind::Warning);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.notify(message, NotificationKind::Error);
    }

    /// Explicit user dismissal.
    pub fn dismiss(&mut self) {
        self.slot = None;
    }

    /// The visible notification, if it has not expired.
    pub fn current(&self) -> Option<&Notification> {
        self.current_at(Instant::now())
    }

    pub fn current_at(&self, now: Instant) -> Option<&Notification> {
        self.slot
            .as_ref()
            .filter(|n| now.saturating_duration_since(n.shown_at) < self.dismiss_after)
    }

    /// The most recently shown notification, ignoring expiry.
    pub fn last(&self) -> Option<&Notification> {
        self.slot.as_ref()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn new_notification_replaces_previous() {
        let mut n = Notifier::default();
        n.info("first");
        n.error("second");
        let current = n.current().unwrap();
        assert_eq!(current.message, "second");
        assert_eq!(current.kind, NotificationKind::Error);
        assert_eq!(current.seq, 2);
    }

    #[test]
    fn expires_after_delay() {
        let mut n = Notifier::new(Duration::from_secs(5));
        n.success("saved");
        let shown = n.last().unwrap().shown_at;
        assert!(n.current_at(shown + Duration::from_secs(4)).is_some());
        assert!(n.current_at(shown + Duration::from_secs(5)).is_none());
        // Still recorded for callers that inspect history.
        assert_eq!(n.last().unwrap().message, "saved");
    }

    #[test]
    fn dismiss_clears_slot() {
        let mut n = Notifier::default();
        n.warning("careful");
        n.dismiss();
        assert!(n.current().is_none());
        assert!(n.last().is_none());
    }

    #[test]
    fn empty_message_is_still_shown() {
        let mut n = Notifier::default();
        n.info("");
        assert_eq!(n.current().unwrap().message, "");
    }

    #[test]
    fn display_hook_sees_every_notification() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut n = Notifier::default().with_display(move |note| {
            sink.borrow_mut().push(note.message.clone());
        });
        n.info("a");
        n.success("b");
        assert_eq!(*seen.borrow(), vec!["a".to_string(), "b".to_string()]);
    }
}
