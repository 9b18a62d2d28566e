//! User-facing notifications.
//!
//! Every editor operation reports its outcome through a [`Notifier`] exactly
//! once. How the message is shown (toast, coloured terminal line, log) is up
//! to the implementation.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

pub trait Notifier {
    fn notify(&mut self, message: &str, level: MessageLevel);
}

/// Collects messages in order. The CLI drains it after each command.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Vec<CmdMessage>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[CmdMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&CmdMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn drain(&mut self) -> Vec<CmdMessage> {
        std::mem::take(&mut self.messages)
    }
}

impl Notifier for MessageLog {
    fn notify(&mut self, message: &str, level: MessageLevel) {
        self.messages.push(CmdMessage {
            level,
            content: message.to_string(),
        });
    }
}
