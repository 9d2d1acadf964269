//! Wire format: one byte for the `MessageKind`, followed by the `bincode` encoding of the
//! announced payload or the replied value.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{Error, Result};
use crate::tree_aggregate::{Message, MessageKind};

/// Encodes `message` into a frame.
pub fn encode<P, V>(message: &Message<P, V>) -> Result<Vec<u8>>
where
    P: Serialize,
    V: Serialize,
{
    let mut bytes = vec![message.kind().tag()];
    match message {
        Message::Announce(payload) => bincode::serialize_into(&mut bytes, payload)?,
        Message::Reply(value) => bincode::serialize_into(&mut bytes, value)?,
    }
    Ok(bytes)
}

/// Returns the kind of the message in `bytes`, without decoding its content.
pub fn peek_kind(bytes: &[u8]) -> Result<MessageKind> {
    let tag = *bytes.first().ok_or(Error::EmptyFrame)?;
    MessageKind::from_tag(tag).ok_or(Error::UnknownMessageKind(tag))
}

/// Decodes a frame produced by `encode`.
pub fn decode<P, V>(bytes: &[u8]) -> Result<Message<P, V>>
where
    P: DeserializeOwned,
    V: DeserializeOwned,
{
    let kind = peek_kind(bytes)?;
    let body = &bytes[1..];
    match kind {
        MessageKind::Announce => Ok(Message::Announce(bincode::deserialize(body)?)),
        MessageKind::Reply => Ok(Message::Reply(bincode::deserialize(body)?)),
    }
}
