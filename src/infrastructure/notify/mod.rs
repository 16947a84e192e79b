//! Notifier implementations

mod http;
mod memory;

pub use http::HttpNotifier;
pub use memory::{RecordingNotifier, SentMessage};
