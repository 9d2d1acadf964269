use std::collections::BTreeSet;
use std::sync::Arc;
use std::{fmt, mem, result};

use log::{debug, warn};

use super::{Aggregator, Error, FaultKind, Message, Result};
use crate::fault_log::Fault;
use crate::{DistAlgorithm, NodeIdT, TargetedMessage, TreeInfo};

/// A `TreeAggregate` step, containing at most one output, at the root.
pub type Step<N, A> = crate::Step<TreeAggregate<N, A>>;

/// The message type of a `TreeAggregate` instance.
type AggregateMessage<N, A> =
    Message<<A as Aggregator<N>>::Payload, <A as Aggregator<N>>::Value>;

/// The progress of a single run, as seen by one node.
#[derive(Debug)]
enum Phase<N, V> {
    /// No `Announce` received yet. At the root: not started yet.
    Idle,
    /// Announced, and collecting one `Reply` per child.
    AwaitingReplies {
        /// The children that have replied so far.
        replied: BTreeSet<N>,
        /// Our own contribution merged with the replies so far. At the root, only the replies.
        accumulated: V,
    },
    /// The aggregate has been sent to the parent or, at the root, output.
    Done,
}

/// Tree aggregation instance of a single node, for a single run.
#[derive(Debug)]
pub struct TreeAggregate<N, A: Aggregator<N>> {
    /// Our position in the tree.
    tree_info: Arc<TreeInfo<N>>,
    /// What the run collects.
    aggregator: A,
    /// The most recently announced payload.
    payload: Option<A::Payload>,
    /// How far the run has progressed.
    phase: Phase<N, A::Value>,
}

impl<N, A> DistAlgorithm for TreeAggregate<N, A>
where
    N: NodeIdT,
    A: Aggregator<N>,
{
    type NodeId = N;
    type Input = A::Payload;
    type Output = A::Value;
    type Message = AggregateMessage<N, A>;
    type Error = Error;
    type FaultKind = FaultKind;

    fn handle_input(&mut self, input: Self::Input) -> Result<Step<N, A>> {
        self.start(input)
    }

    fn handle_message(
        &mut self,
        sender_id: &Self::NodeId,
        message: Self::Message,
    ) -> Result<Step<N, A>> {
        self.handle_message(sender_id, message)
    }

    fn terminated(&self) -> bool {
        match self.phase {
            Phase::Done => true,
            Phase::Idle | Phase::AwaitingReplies { .. } => false,
        }
    }

    fn our_id(&self) -> &N {
        self.tree_info.our_id()
    }
}

impl<N, A> TreeAggregate<N, A>
where
    N: NodeIdT,
    A: Aggregator<N>,
{
    /// Creates a new instance for the node described by `tree_info`.
    pub fn new(tree_info: Arc<TreeInfo<N>>, aggregator: A) -> Self {
        TreeAggregate {
            tree_info,
            aggregator,
            payload: None,
            phase: Phase::Idle,
        }
    }

    /// Starts the run by announcing `payload` to all children. This must only be called in the
    /// root node, and only once.
    pub fn start(&mut self, payload: A::Payload) -> Result<Step<N, A>> {
        if !self.tree_info.is_root() {
            return Err(Error::NotRoot);
        }
        match self.phase {
            Phase::Idle => (),
            Phase::AwaitingReplies { .. } | Phase::Done => return Err(Error::AlreadyStarted),
        }
        if self.tree_info.is_leaf() {
            return Err(Error::NoChildren);
        }
        debug!("{}: Starting run with {:?}", self, payload);
        self.payload = Some(payload.clone());
        self.phase = Phase::AwaitingReplies {
            replied: BTreeSet::new(),
            accumulated: self.aggregator.empty(),
        };
        Ok(self.announce_to_children(payload))
    }

    /// Handles a message received from `sender_id`.
    ///
    /// This must be called with every message we receive from an adjacent node.
    pub fn handle_message(
        &mut self,
        sender_id: &N,
        message: AggregateMessage<N, A>,
    ) -> Result<Step<N, A>> {
        match message {
            Message::Announce(payload) => self.handle_announce(sender_id, payload),
            Message::Reply(value) => self.handle_reply(sender_id, value),
        }
    }

    /// Returns this node's position in the tree.
    pub fn tree_info(&self) -> &Arc<TreeInfo<N>> {
        &self.tree_info
    }

    /// Returns the most recently announced payload, if any.
    pub fn payload(&self) -> Option<&A::Payload> {
        self.payload.as_ref()
    }

    /// Returns the number of children that have replied in the current phase.
    pub fn replies_received(&self) -> usize {
        match self.phase {
            Phase::Idle => 0,
            Phase::AwaitingReplies { ref replied, .. } => replied.len(),
            Phase::Done => self.tree_info.children().len(),
        }
    }

    /// Handles an `Announce` message: forwards it to the children, or replies if we are a leaf.
    fn handle_announce(&mut self, sender_id: &N, payload: A::Payload) -> Result<Step<N, A>> {
        if !self.tree_info.is_parent(sender_id) {
            let fault_kind = FaultKind::AnnounceFromNonParent;
            return Ok(Fault::new(sender_id.clone(), fault_kind).into());
        }
        match self.phase {
            Phase::Idle => (),
            Phase::AwaitingReplies { .. } | Phase::Done => {
                // The payload is overwritten, but nothing is sent again: every edge carries a
                // single `Announce` and a single `Reply` per run.
                let repeated = self.payload.as_ref() == Some(&payload);
                self.payload = Some(payload);
                if repeated {
                    warn!(
                        "{}: Received the same Announce multiple times from {:?}.",
                        self, sender_id
                    );
                    return Ok(Step::default());
                }
                let fault_kind = FaultKind::DuplicateAnnounce;
                return Ok(Fault::new(sender_id.clone(), fault_kind).into());
            }
        }

        self.payload = Some(payload.clone());
        let accumulated = self.aggregator.local(self.our_id(), &payload);
        if self.tree_info.is_leaf() {
            debug!("{}: Leaf received {:?}, replying", self, payload);
            self.phase = Phase::Done;
            return Ok(self.send_to_parent(accumulated));
        }
        debug!("{}: Forwarding {:?} to children", self, payload);
        self.phase = Phase::AwaitingReplies {
            replied: BTreeSet::new(),
            accumulated,
        };
        Ok(self.announce_to_children(payload))
    }

    /// Handles a `Reply` message: merges the value, and once every child has replied, sends the
    /// aggregate to the parent or, at the root, outputs it.
    fn handle_reply(&mut self, sender_id: &N, value: A::Value) -> Result<Step<N, A>> {
        if !self.tree_info.is_child(sender_id) {
            let fault_kind = FaultKind::ReplyFromNonChild;
            return Ok(Fault::new(sender_id.clone(), fault_kind).into());
        }
        let num_children = self.tree_info.children().len();
        let complete = match self.phase {
            Phase::Idle => {
                let fault_kind = FaultKind::ReplyBeforeAnnounce;
                return Ok(Fault::new(sender_id.clone(), fault_kind).into());
            }
            Phase::Done => {
                let fault_kind = FaultKind::DuplicateReply;
                return Ok(Fault::new(sender_id.clone(), fault_kind).into());
            }
            Phase::AwaitingReplies {
                ref mut replied,
                ref mut accumulated,
            } => {
                if !replied.insert(sender_id.clone()) {
                    let fault_kind = FaultKind::DuplicateReply;
                    return Ok(Fault::new(sender_id.clone(), fault_kind).into());
                }
                self.aggregator.merge(accumulated, value);
                replied.len() == num_children
            }
        };
        if !complete {
            debug!(
                "{}: Received Reply from {:?}, {} of {} children replied",
                self,
                sender_id,
                self.replies_received(),
                num_children
            );
            return Ok(Step::default());
        }

        match mem::replace(&mut self.phase, Phase::Done) {
            Phase::AwaitingReplies { accumulated, .. } => match self.tree_info.parent() {
                Some(_) => {
                    debug!("{}: All children replied, forwarding {:?}", self, accumulated);
                    Ok(self.send_to_parent(accumulated))
                }
                None => {
                    debug!("{}: All children replied, output {:?}", self, accumulated);
                    Ok(Step::default().with_output(accumulated))
                }
            },
            // We only get here if `complete`, which is only set while awaiting replies.
            Phase::Idle | Phase::Done => unreachable!(),
        }
    }

    /// Returns a step with one `Announce` per child, in order. Shared by the root's `start` and
    /// by inner nodes forwarding an announcement.
    fn announce_to_children(&self, payload: A::Payload) -> Step<N, A> {
        let mut step = Step::default();
        for child in self.tree_info.children() {
            let msg = Message::Announce(payload.clone());
            step.messages.push(TargetedMessage::new(child.clone(), msg));
        }
        step
    }

    /// Returns a step with a single `Reply` to our parent.
    fn send_to_parent(&self, value: A::Value) -> Step<N, A> {
        match self.tree_info.parent() {
            Some(parent) => TargetedMessage::new(parent.clone(), Message::Reply(value)).into(),
            None => Step::default(),
        }
    }
}

impl<N: NodeIdT, A: Aggregator<N>> fmt::Display for TreeAggregate<N, A> {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "{:?} TreeAggregate", self.our_id())
    }
}
