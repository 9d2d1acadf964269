use std::fmt;

use serde::{Deserialize, Serialize};

/// The two kinds of message exchanged along the edges of the tree.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum Message<P, V> {
    /// The application payload, sent from a parent to each of its children.
    Announce(P),
    /// The aggregate of the sender's subtree, sent from a child to its parent.
    Reply(V),
}

impl<P, V> Message<P, V> {
    /// Returns the kind of this message.
    pub fn kind(&self) -> MessageKind {
        match *self {
            Message::Announce(_) => MessageKind::Announce,
            Message::Reply(_) => MessageKind::Reply,
        }
    }
}

/// The kind of a `Message`, without its content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKind {
    /// An `Announce`, wire tag `0`.
    Announce,
    /// A `Reply`, wire tag `1`.
    Reply,
}

impl MessageKind {
    /// The byte identifying this kind on the wire.
    pub fn tag(self) -> u8 {
        match self {
            MessageKind::Announce => 0,
            MessageKind::Reply => 1,
        }
    }

    /// The kind identified by `tag`, if any.
    pub fn from_tag(tag: u8) -> Option<MessageKind> {
        match tag {
            0 => Some(MessageKind::Announce),
            1 => Some(MessageKind::Reply),
            _ => None,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MessageKind::Announce => write!(f, "Announce"),
            MessageKind::Reply => write!(f, "Reply"),
        }
    }
}
