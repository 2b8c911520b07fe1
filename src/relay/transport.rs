//! Transport-neutral outbound surface.
//!
//! The engine only ever talks to this trait, so tests can drive it with a
//! recording mock instead of a live Telegram connection.

use std::future::Future;

/// A keyboard specification attached to an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// A persistent reply keyboard: rows of plain labels.
    Reply { rows: Vec<Vec<String>>, resize: bool },
    /// An inline keyboard: rows of label/callback-data buttons.
    Inline { rows: Vec<Vec<InlineButton>> },
    /// Remove a previously sent reply keyboard.
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub data: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self { label: label.into(), data: data.into() }
    }
}

/// Outbound messaging operations the engine depends on.
///
/// Recipients are strings: a numeric chat id or an `@channelusername`.
/// Failures carry an operator-facing description; callers decide what, if
/// anything, to tell the chat.
pub trait Transport: Send + Sync {
    fn send_message(
        &self,
        recipient: &str,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> impl Future<Output = Result<i64, String>> + Send;

    fn answer_callback(&self, callback_id: &str) -> impl Future<Output = Result<(), String>> + Send;
}
