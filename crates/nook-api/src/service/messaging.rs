use nook_store::Collection;
use nook_types::Message;

use crate::error::{ApiError, ApiResult};

/// Direct messages over `messages.json`, in send order.
pub struct Messaging {
    messages: Collection<Message>,
}

impl Messaging {
    pub fn new(messages: Collection<Message>) -> Self {
        Self { messages }
    }

    pub fn collection(&self) -> &Collection<Message> {
        &self.messages
    }

    /// Sender and recipient are not checked against the user directory.
    pub fn send(&self, from: &str, to: &str, text: String) -> ApiResult<Message> {
        if from.is_empty() {
            return Err(ApiError::MissingField("from"));
        }
        if to.is_empty() {
            return Err(ApiError::MissingField("to"));
        }

        let msg = Message::new(from, to, text);
        self.messages.update(|messages| {
            messages.push(msg.clone());
            Ok::<_, ApiError>(())
        })?;
        Ok(msg)
    }

    /// Every message sent or received by `login`, across all counterparts.
    pub fn list_conversation(&self, login: &str) -> Vec<Message> {
        self.messages
            .load()
            .into_iter()
            .filter(|m| m.involves(login))
            .collect()
    }

    /// Messages exchanged between `login` and `other`, both directions.
    pub fn list_between(&self, login: &str, other: &str) -> Vec<Message> {
        self.messages
            .load()
            .into_iter()
            .filter(|m| {
                (m.from == login && m.to == other) || (m.from == other && m.to == login)
            })
            .collect()
    }
}
