//! # Tree Aggregation
//!
//! The root of a spanning tree _announces_ a payload, which travels down to every leaf. Every
//! node then _replies_ towards the root with a value that summarizes its whole subtree, so that
//! the root ends up with a single aggregate over all other nodes: by default, their number.
//!
//! ## How it works
//!
//! * The root's input is the payload. It sends `Announce(payload)` to each of its children.
//!
//! * A node that receives `Announce` from its parent stores the payload. If it has children, it
//!   forwards the same `Announce` to each of them, in order. A leaf instead immediately sends
//!   `Reply(v)` to its parent, where `v` is its own contribution (`1` when counting nodes).
//!
//! * An inner node waits until it has received exactly one `Reply` from every child. Only then
//!   does it merge its own contribution with all of their values and send a single `Reply` to
//!   its parent. Replies from different children may arrive in any order; the `Aggregator`'s
//!   merge must therefore be commutative and associative.
//!
//! * Once the root has a `Reply` from every child, it outputs the merge of their values. The root
//!   does not add its own contribution, so a counting run over _N_ nodes outputs _N - 1_.
//!
//! Each edge carries exactly one `Announce` downwards and one `Reply` upwards per run. Messages
//! that break this pattern are not processed: the sender is reported in the step's fault log.

mod aggregator;
mod message;
mod tree_aggregate;

use failure::Fail;

pub use self::aggregator::{Aggregator, NodeCount, SubtreeIds};
pub use self::message::{Message, MessageKind};
pub use self::tree_aggregate::{Step, TreeAggregate};

/// A tree aggregation error.
#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum Error {
    /// `start` was called on a node with a parent.
    #[fail(display = "Only the root can start a run")]
    NotRoot,
    /// The tree consists of the root alone.
    #[fail(display = "The root has no children to announce to")]
    NoChildren,
    /// `start` was called more than once.
    #[fail(display = "The run has already been started")]
    AlreadyStarted,
}

/// A tree aggregation result.
pub type Result<T> = ::std::result::Result<T, Error>;

/// Represents each reason why a tree aggregation message could be faulty.
#[derive(Clone, Debug, Fail, PartialEq, Eq)]
pub enum FaultKind {
    /// An `Announce` came from a node other than our parent.
    #[fail(display = "`TreeAggregate` received an `Announce` from a node other than the parent.")]
    AnnounceFromNonParent,
    /// The parent announced a different payload a second time.
    #[fail(display = "`TreeAggregate` received multiple different `Announce`s from the parent.")]
    DuplicateAnnounce,
    /// A `Reply` came from a node that is not one of our children.
    #[fail(display = "`TreeAggregate` received a `Reply` from a node other than a child.")]
    ReplyFromNonChild,
    /// A child replied more than once.
    #[fail(display = "`TreeAggregate` received multiple `Reply`s from the same child.")]
    DuplicateReply,
    /// A `Reply` arrived before we received the `Announce`.
    #[fail(display = "`TreeAggregate` received a `Reply` before the `Announce`.")]
    ReplyBeforeAnnounce,
}
