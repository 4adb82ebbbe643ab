/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric). Channels and supergroups are `-100...`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

impl MessageRef {
    pub fn new(chat_id: ChatId, message_id: MessageId) -> Self {
        Self {
            chat_id,
            message_id,
        }
    }
}

/// Interpret a persisted stored-message reference.
///
/// Only a positive integer that fits a message id is a reference; zero,
/// negatives, strings, floats and nulls mean "nothing stored".
pub fn parse_stored_id(raw: &serde_json::Value) -> Option<MessageId> {
    let n = raw.as_i64()?;
    if n <= 0 {
        return None;
    }
    i32::try_from(n).ok().map(MessageId)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stored_id_accepts_positive_integers_only() {
        assert_eq!(parse_stored_id(&json!(42)), Some(MessageId(42)));
        assert_eq!(parse_stored_id(&json!(0)), None);
        assert_eq!(parse_stored_id(&json!(-3)), None);
        assert_eq!(parse_stored_id(&json!("x")), None);
        assert_eq!(parse_stored_id(&json!("42")), None);
        assert_eq!(parse_stored_id(&json!(1.5)), None);
        assert_eq!(parse_stored_id(&serde_json::Value::Null), None);
        assert_eq!(parse_stored_id(&json!(i64::MAX)), None);
    }
}
