//! # Client Deliveries

use shared_types::Message;

/// Item yielded to a client subscription stream.
///
/// `Terminated` lets a client tell "the server closed this subscription"
/// apart from "no more messages right now".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// A matched message.
    Message(Message),
    /// The subscription was invalidated; nothing follows.
    Terminated,
}

impl Delivery {
    /// The message, if this is a message delivery.
    #[must_use]
    pub fn into_message(self) -> Option<Message> {
        match self {
            Self::Message(message) => Some(message),
            Self::Terminated => None,
        }
    }

    /// Whether this is the termination notice.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated)
    }
}
