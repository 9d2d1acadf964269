use std::io;
use std::time::Duration;

use failure::Fail;

use crate::tree_aggregate;

/// A runtime error.
#[derive(Debug, Fail)]
pub enum Error {
    /// Sending a message failed.
    #[fail(display = "Transport error: {}", _0)]
    Transport(#[cause] TransportError),
    /// The algorithm rejected the input.
    #[fail(display = "Protocol error: {}", _0)]
    Protocol(#[cause] tree_aggregate::Error),
    /// A frame without even a kind tag.
    #[fail(display = "Empty message frame")]
    EmptyFrame,
    /// A frame whose kind tag is neither `Announce` nor `Reply`.
    #[fail(display = "Unknown message kind {}", _0)]
    UnknownMessageKind(u8),
    /// A message body that could not be encoded or decoded.
    #[fail(display = "Codec error: {}", _0)]
    Codec(#[cause] bincode::Error),
    /// No protocol is registered under the name.
    #[fail(display = "Unknown protocol {:?}", _0)]
    UnknownProtocol(String),
    /// A protocol is already registered under the name.
    #[fail(display = "Protocol {:?} is already registered", _0)]
    DuplicateProtocol(String),
    /// The node has no instance in this run.
    #[fail(display = "Node {} is not part of the tree", _0)]
    UnknownNode(String),
    /// The root did not output in time.
    #[fail(display = "No completion value within {:?}", _0)]
    Timeout(Duration),
    /// The dispatcher thread is gone.
    #[fail(display = "The dispatcher has stopped")]
    Stopped,
    /// The dispatcher thread could not be created.
    #[fail(display = "Failed to spawn the dispatcher thread: {}", _0)]
    Spawn(#[cause] io::Error),
    /// The dispatcher thread panicked.
    #[fail(display = "The dispatcher thread panicked")]
    Panicked,
}

/// A runtime result.
pub type Result<T> = ::std::result::Result<T, Error>;

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Error {
        Error::Transport(err)
    }
}

impl From<tree_aggregate::Error> for Error {
    fn from(err: tree_aggregate::Error) -> Error {
        Error::Protocol(err)
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Error {
        Error::Codec(err)
    }
}

/// A failure to send a message to an adjacent node. These are never retried.
///
/// Peers are named by the `Debug` rendering of their ID.
#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum TransportError {
    /// The peer is not reachable from this endpoint.
    #[fail(display = "No route to peer {}", _0)]
    UnknownPeer(String),
    /// The peer received the message but refused it.
    #[fail(display = "Peer {} rejected the message: {}", _0, _1)]
    Rejected(String, String),
}
