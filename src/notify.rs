// Transient, dismissible notifications raised by page controllers

use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// How long a toast stays visible unless dismissed earlier.
pub const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    #[default]
    Default,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub variant: Variant,
    pub shown_at: Instant,
}

#[derive(Debug, Default)]
struct Queue {
    next_id: u64,
    toasts: Vec<Toast>,
}

#[derive(Debug, Default)]
pub struct Notifier {
    queue: Mutex<Queue>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&self, title: &str, description: Option<&str>, variant: Variant) -> u64 {
        let mut queue = self.queue.lock();
        queue.next_id += 1;
        let id = queue.next_id;
        queue.toasts.push(Toast {
            id,
            title: title.to_string(),
            description: description.map(str::to_string),
            variant,
            shown_at: Instant::now(),
        });
        id
    }

    pub fn success(&self, title: &str, description: &str) -> u64 {
        self.show(title, Some(description), Variant::Success)
    }

    /// Error toasts always carry the generic "Error" title.
    pub fn error(&self, description: &str) -> u64 {
        self.show("Error", Some(description), Variant::Error)
    }

    pub fn info(&self, title: &str, description: &str) -> u64 {
        self.show(title, Some(description), Variant::Default)
    }

    pub fn dismiss(&self, id: u64) {
        self.queue.lock().toasts.retain(|t| t.id != id);
    }

    /// Toasts still visible at `now`; expired ones are dropped.
    pub fn visible_at(&self, now: Instant) -> Vec<Toast> {
        let mut queue = self.queue.lock();
        queue
            .toasts
            .retain(|t| now.saturating_duration_since(t.shown_at) < TOAST_TTL);
        queue.toasts.clone()
    }

    pub fn visible(&self) -> Vec<Toast> {
        self.visible_at(Instant::now())
    }

    /// Remove and return everything queued, expired or not.
    pub fn drain(&self) -> Vec<Toast> {
        std::mem::take(&mut self.queue.lock().toasts)
    }
}
