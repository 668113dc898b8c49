use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::logging::{json_log, obj, v_num};

#[derive(Clone)]
pub struct Config {
    pub docs_base: String,
    pub http_timeout_secs: u64,
    pub fetch_retries: u32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            docs_base: std::env::var("DOCS_BASE").unwrap_or_else(|_| "http://127.0.0.1:8080".to_string()),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(30),
            fetch_retries: std::env::var("FETCH_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(3),
        }
    }
}

pub fn now_ts() -> u64 {
    chrono::Utc::now().timestamp() as u64
}

pub fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}

/// The single shared details region. Every async view task (endpoint detail,
/// markdown view, simulation result) gets an invocation id up front and
/// writes its output unconditionally on completion: whichever task resolves
/// last owns the panel, regardless of start order.
pub struct DetailPanel {
    next_invocation: AtomicU64,
    slot: Mutex<PanelSlot>,
}

#[derive(Clone, Default)]
struct PanelSlot {
    invocation: u64,
    content: String,
}

impl DetailPanel {
    pub fn new() -> Self {
        Self {
            next_invocation: AtomicU64::new(1),
            slot: Mutex::new(PanelSlot::default()),
        }
    }

    /// Allocate an id for a view task about to start.
    pub fn begin(&self) -> u64 {
        self.next_invocation.fetch_add(1, Ordering::SeqCst)
    }

    pub fn publish(&self, invocation: u64, content: String) {
        println!("{}", content);
        if let Ok(mut slot) = self.slot.lock() {
            slot.invocation = invocation;
            slot.content = content;
        }
        json_log("panel", obj(&[("invocation_id", v_num(invocation as f64))]));
    }

    /// Invocation id and content of the latest write.
    pub fn current(&self) -> (u64, String) {
        let slot = self.slot.lock().map(|s| s.clone()).unwrap_or_default();
        (slot.invocation, slot.content)
    }
}

impl Default for DetailPanel {
    fn default() -> Self {
        Self::new()
    }
}
