#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod achievements;
pub mod app;
pub mod capabilities;
pub mod event;
pub mod fallback;
pub mod model;
pub mod queue;
pub mod samples;
pub mod storage;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use app::{App, ViewModel};
pub use capabilities::{Capabilities, Effect};
pub use event::Event;
pub use model::Model;

// Queue lifecycle tuning. The queue size is a soft target: refills trigger
// below the low-water mark but consumption never waits on them.
pub const INITIAL_FETCH_COUNT: usize = 4;
pub const REFILL_COUNT: usize = 3;
pub const MIN_QUEUE_SIZE: usize = 3;
pub const MAX_FALLBACK_DRIPS: usize = 10;

// Settle delays; the pop/clear happens only when the shell's timer fires.
pub const ADVANCE_SETTLE_MS: u64 = 300;
pub const REFRESH_SETTLE_MS: u64 = 500;
pub const TOAST_DURATION_MS: u64 = 4000;

// Input limits.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const MIN_USERNAME_CHARS: usize = 3;
pub const MAX_USERNAME_CHARS: usize = 20;

pub const DEFAULT_REGION: &str = "United States";
pub const DEFAULT_USERNAME: &str = "CuriousMind";
pub const GEO_ENDPOINT: &str = "https://ipapi.co/json/";

pub const THINKING_PLACEHOLDER: &str = "Thinking...";
pub const HARD_FAILURE_MESSAGE: &str =
    "The AI couldn't generate content and no fallback is available. Please check your connection.";
pub const EXPLAIN_APOLOGY: &str = "Sorry, the AI couldn't dive deeper on this topic. It might be too obscure or there was a connection issue. Please try another one.";

/// Topics offered on the preferences screen.
pub const TOPICS: &[&str] = &[
    "Science & Tech",
    "History",
    "Geopolitics",
    "Art & Culture",
    "Nature & Animals",
    "Sports",
    "Pop Culture",
    "Crypto & Finance",
    "Weird Facts",
    "Philosophy",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Generation,
    Network,
    Storage,
    Validation,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Generation => "GENERATION_ERROR",
            Self::Network => "NETWORK_ERROR",
            Self::Storage => "STORAGE_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

/// Mode-level error carried in the model; `message` is user-facing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.code(), self.message)
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_the_code() {
        let e = AppError::new(ErrorKind::Generation, "nothing came back");
        assert_eq!(e.to_string(), "[GENERATION_ERROR] nothing came back");
    }

    #[test]
    fn refill_threshold_is_below_initial_fetch() {
        assert!(MIN_QUEUE_SIZE < INITIAL_FETCH_COUNT);
        assert!(REFILL_COUNT >= 1);
    }
}
