//! Common supertraits for tree protocols.

use std::fmt::Debug;
use std::hash::Hash;
use std::iter::once;

use failure::Fail;

use crate::fault_log::{Fault, FaultLog};
use crate::TargetedMessage;

/// A peer node's unique identifier.
pub trait NodeIdT: Eq + Ord + Clone + Debug + Hash + Send + Sync {}
impl<N> NodeIdT for N where N: Eq + Ord + Clone + Debug + Hash + Send + Sync {}

/// Messages.
pub trait Message: Debug + Send + Sync {}
impl<M> Message for M where M: Debug + Send + Sync {}

/// Single algorithm step outcome.
///
/// Each time input (the root's start payload or an incoming message) is provided to an instance,
/// a `Step` is produced, potentially containing output values, a fault log, and messages for
/// adjacent nodes.
///
/// Any `Step` **must always be used** by the caller; at the very least the resulting messages
/// must be sent, in order. Senders stop at the first failed message.
#[must_use = "The algorithm step result must be used."]
#[derive(Debug)]
pub struct Step<D>
where
    D: DistAlgorithm,
{
    /// Values the algorithm produced.
    pub output: Vec<D::Output>,
    /// Protocol violations detected while processing.
    pub fault_log: FaultLog<D::NodeId, D::FaultKind>,
    /// Messages to send, in order.
    pub messages: Vec<TargetedMessage<D::Message, D::NodeId>>,
}

impl<D> Default for Step<D>
where
    D: DistAlgorithm,
{
    fn default() -> Step<D> {
        Step {
            output: Vec::default(),
            fault_log: FaultLog::default(),
            messages: Vec::default(),
        }
    }
}

impl<D: DistAlgorithm> Step<D> {
    /// Returns the same step, with the given additional output.
    pub fn with_output<T: Into<Option<D::Output>>>(mut self, output: T) -> Self {
        self.output.extend(output.into());
        self
    }

    /// Returns `true` if there are no messages, faults or outputs.
    pub fn is_empty(&self) -> bool {
        self.output.is_empty() && self.fault_log.is_empty() && self.messages.is_empty()
    }
}

impl<D: DistAlgorithm> From<Fault<D::NodeId, D::FaultKind>> for Step<D> {
    fn from(fault: Fault<D::NodeId, D::FaultKind>) -> Self {
        Step {
            fault_log: fault.into(),
            ..Step::default()
        }
    }
}

impl<D: DistAlgorithm> From<TargetedMessage<D::Message, D::NodeId>> for Step<D> {
    fn from(msg: TargetedMessage<D::Message, D::NodeId>) -> Self {
        Step {
            messages: once(msg).collect(),
            ..Step::default()
        }
    }
}

/// A distributed algorithm that defines a message flow.
pub trait DistAlgorithm: Send + Sync {
    /// Unique node identifier.
    type NodeId: NodeIdT;
    /// The input provided by the user.
    type Input;
    /// The output type. Tree aggregation outputs exactly once, at the root.
    type Output;
    /// The messages that need to be exchanged between the instances in the participating nodes.
    type Message: Message;
    /// The errors that can occur during execution.
    type Error: Fail;
    /// The kinds of protocol violation this algorithm detects.
    type FaultKind: Fail;

    /// Handles an input provided by the user, and returns the resulting step.
    fn handle_input(&mut self, input: Self::Input) -> Result<Step<Self>, Self::Error>
    where
        Self: Sized;

    /// Handles a message received from node `sender_id`.
    fn handle_message(
        &mut self,
        sender_id: &Self::NodeId,
        message: Self::Message,
    ) -> Result<Step<Self>, Self::Error>
    where
        Self: Sized;

    /// Returns `true` if execution has completed and this instance can be dropped.
    fn terminated(&self) -> bool;

    /// Returns this node's own ID.
    fn our_id(&self) -> &Self::NodeId;
}
