//! Envelopes pairing a protocol message with its sender or its recipient.
//!
//! All traffic in a tree travels along a single edge, so there is no multicast target: every
//! outgoing message names exactly one adjacent node.

/// Message sent by a given source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourcedMessage<M, N> {
    /// The node the message came from.
    pub source: N,
    /// The message itself.
    pub message: M,
}

impl<M, N> SourcedMessage<M, N> {
    /// Wraps `message`, received from `source`.
    pub fn new(source: N, message: M) -> Self {
        SourcedMessage { source, message }
    }
}

/// Message with a designated recipient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetedMessage<M, N> {
    /// The tree-adjacent node the message is addressed to.
    pub target: N,
    /// The message itself.
    pub message: M,
}

impl<M, N> TargetedMessage<M, N> {
    /// Addresses `message` to `target`.
    pub fn new(target: N, message: M) -> Self {
        TargetedMessage { target, message }
    }
}
