//! A test network.
//!
//! Test networks pass messages between `DistAlgorithm` instances without any threads or I/O. An
//! adversary controls the delivery order.
//!
//! Networks are "cranked" to move things forward; each crank of a network causes one message to be
//! delivered to a node.

pub mod adversary;
pub mod err;
pub mod proptest;

use std::collections::{BTreeMap, VecDeque};
use std::mem;

use treecast::{DistAlgorithm, Fault, Step};

pub use self::adversary::{Adversary, NullAdversary, ReorderingAdversary};
pub use self::err::CrankError;

/// A node in the test network, together with everything its steps produced.
pub struct Node<D: DistAlgorithm> {
    algorithm: D,
    outputs: Vec<D::Output>,
    faults: Vec<Fault<D::NodeId, D::FaultKind>>,
}

impl<D: DistAlgorithm> Node<D> {
    #[inline]
    pub fn new(algorithm: D) -> Self {
        Node {
            algorithm,
            outputs: Vec::new(),
            faults: Vec::new(),
        }
    }

    #[inline]
    pub fn algorithm(&self) -> &D {
        &self.algorithm
    }

    #[inline]
    pub fn id(&self) -> &D::NodeId {
        self.algorithm.our_id()
    }

    /// All outputs so far.
    #[inline]
    pub fn outputs(&self) -> &[D::Output] {
        &self.outputs
    }

    /// All faults this node detected so far.
    #[inline]
    pub fn faults(&self) -> &[Fault<D::NodeId, D::FaultKind>] {
        &self.faults
    }
}

/// A message in transit.
#[derive(Clone, Debug)]
pub struct NetworkMessage<M, N> {
    from: N,
    to: N,
    payload: M,
}

impl<M, N> NetworkMessage<M, N> {
    fn new(from: N, payload: M, to: N) -> NetworkMessage<M, N> {
        NetworkMessage { from, to, payload }
    }

    #[inline]
    pub fn from(&self) -> &N {
        &self.from
    }

    #[inline]
    pub fn to(&self) -> &N {
        &self.to
    }

    #[inline]
    pub fn payload(&self) -> &M {
        &self.payload
    }
}

pub type NetMessage<D> =
    NetworkMessage<<D as DistAlgorithm>::Message, <D as DistAlgorithm>::NodeId>;

pub struct VirtualNet<D>
where
    D: DistAlgorithm,
{
    /// Maps node IDs to actual node instances.
    nodes: BTreeMap<D::NodeId, Node<D>>,
    /// All network messages queued up for delivery.
    messages: VecDeque<NetMessage<D>>,
    /// Every message delivered so far, in order.
    delivered: Vec<NetMessage<D>>,
    /// Controls the delivery schedule. Messages are delivered in order if there is none.
    adversary: Option<Box<dyn Adversary<D>>>,
}

impl<D> VirtualNet<D>
where
    D: DistAlgorithm,
{
    pub fn new<I>(algorithms: I) -> Self
    where
        I: IntoIterator<Item = D>,
    {
        let nodes = algorithms
            .into_iter()
            .map(|algorithm| (algorithm.our_id().clone(), Node::new(algorithm)))
            .collect();
        VirtualNet {
            nodes,
            messages: VecDeque::new(),
            delivered: Vec::new(),
            adversary: None,
        }
    }

    #[inline]
    pub fn set_adversary(&mut self, adversary: Box<dyn Adversary<D>>) {
        self.adversary = Some(adversary);
    }

    #[inline]
    pub fn nodes(&self) -> impl Iterator<Item = &Node<D>> {
        self.nodes.values()
    }

    #[inline]
    pub fn get(&self, id: &D::NodeId) -> Option<&Node<D>> {
        self.nodes.get(id)
    }

    /// The messages waiting for delivery. The next crank delivers the front one.
    #[inline]
    pub fn queue_mut(&mut self) -> &mut VecDeque<NetMessage<D>> {
        &mut self.messages
    }

    /// Every message delivered so far, in order of delivery.
    #[inline]
    pub fn delivered(&self) -> &[NetMessage<D>] {
        &self.delivered
    }

    /// Records the step's outputs and faults, and queues its messages.
    fn process_step(&mut self, id: &D::NodeId, step: Step<D>) -> Result<(), CrankError<D>> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| CrankError::NodeDisappeared(id.clone()))?;
        node.outputs.extend(step.output);
        node.faults.extend(step.fault_log);
        for tmsg in step.messages {
            self.messages
                .push_back(NetworkMessage::new(id.clone(), tmsg.message, tmsg.target));
        }
        Ok(())
    }

    pub fn send_input(&mut self, id: D::NodeId, input: D::Input) -> Result<(), CrankError<D>> {
        let step = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| CrankError::NodeDisappeared(id.clone()))?
            .algorithm
            .handle_input(input)
            .map_err(|err| CrankError::HandleInput {
                id: id.clone(),
                err,
            })?;
        self.process_step(&id, step)
    }
}

impl<D> VirtualNet<D>
where
    D: DistAlgorithm,
    D::Message: Clone,
{
    /// Delivers a single message. Returns the receiver's ID, or `None` if the queue is empty.
    pub fn crank(&mut self) -> Option<Result<D::NodeId, CrankError<D>>> {
        // Take the adversary out, so it can borrow the network.
        let mut adv = self.adversary.take();
        if let Some(ref mut adversary) = adv {
            adversary.pre_crank(self);
        }
        let _ = mem::replace(&mut self.adversary, adv);

        let msg = self.messages.pop_front()?;
        self.delivered.push(msg.clone());
        let NetworkMessage { from, to, payload } = msg;
        let result = match self.nodes.get_mut(&to) {
            None => Err(CrankError::NodeDisappeared(to.clone())),
            Some(node) => node
                .algorithm
                .handle_message(&from, payload.clone())
                .map_err(|err| CrankError::HandleMessage {
                    msg: NetworkMessage::new(from.clone(), payload, to.clone()),
                    err,
                }),
        };
        Some(
            result
                .and_then(|step| self.process_step(&to, step))
                .map(|()| to),
        )
    }

    /// Cranks until no messages are left. Returns the number of messages delivered.
    pub fn crank_to_completion(&mut self, limit: usize) -> Result<usize, CrankError<D>> {
        let mut cranks = 0;
        while let Some(result) = self.crank() {
            result?;
            cranks += 1;
            if cranks > limit {
                return Err(CrankError::CrankLimitExceeded(limit));
            }
        }
        Ok(cranks)
    }
}
