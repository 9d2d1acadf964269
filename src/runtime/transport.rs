use std::collections::BTreeMap;
use std::result;
use std::sync::{Arc, PoisonError, RwLock};

use super::{Inbox, TransportError};
use crate::NodeIdT;

/// Point-to-point delivery of encoded messages to tree-adjacent nodes.
///
/// Each node owns its own endpoint, so the sender's identity is implicit. Delivery must be
/// reliable and ordered per peer. Errors are reported to the protocol's caller and not retried.
pub trait Transport<N>: Send {
    /// Sends the encoded message `bytes` to `target`.
    fn send_to(&self, target: &N, bytes: Vec<u8>) -> result::Result<(), TransportError>;
}

impl<N, T: Transport<N> + ?Sized> Transport<N> for Box<T> {
    fn send_to(&self, target: &N, bytes: Vec<u8>) -> result::Result<(), TransportError> {
        (**self).send_to(target, bytes)
    }
}

/// An in-process network connecting the inboxes of local dispatchers.
pub struct LocalNetwork<N> {
    inboxes: Arc<RwLock<BTreeMap<N, Arc<dyn Inbox<N>>>>>,
}

impl<N> Clone for LocalNetwork<N> {
    fn clone(&self) -> Self {
        LocalNetwork {
            inboxes: self.inboxes.clone(),
        }
    }
}

impl<N: NodeIdT + 'static> Default for LocalNetwork<N> {
    fn default() -> Self {
        LocalNetwork::new()
    }
}

impl<N: NodeIdT + 'static> LocalNetwork<N> {
    /// Creates a network without any nodes.
    pub fn new() -> Self {
        LocalNetwork {
            inboxes: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Makes node `id` reachable, delivering to `inbox`. Returns the inbox previously attached
    /// under that ID, if any.
    pub fn attach(&self, id: N, inbox: Arc<dyn Inbox<N>>) -> Option<Arc<dyn Inbox<N>>> {
        let mut inboxes = self.inboxes.write().unwrap_or_else(PoisonError::into_inner);
        inboxes.insert(id, inbox)
    }

    /// Makes node `id` unreachable. Returns `false` if it wasn't attached.
    pub fn detach(&self, id: &N) -> bool {
        let mut inboxes = self.inboxes.write().unwrap_or_else(PoisonError::into_inner);
        inboxes.remove(id).is_some()
    }

    /// Returns `true` if node `id` is reachable.
    pub fn is_attached(&self, id: &N) -> bool {
        let inboxes = self.inboxes.read().unwrap_or_else(PoisonError::into_inner);
        inboxes.contains_key(id)
    }

    /// Returns the transport endpoint through which node `our_id` sends.
    pub fn endpoint(&self, our_id: N) -> LocalEndpoint<N> {
        LocalEndpoint {
            our_id,
            network: self.clone(),
        }
    }

    fn inbox(&self, id: &N) -> Option<Arc<dyn Inbox<N>>> {
        let inboxes = self.inboxes.read().unwrap_or_else(PoisonError::into_inner);
        inboxes.get(id).cloned()
    }
}

/// A node's sending side of a `LocalNetwork`.
pub struct LocalEndpoint<N> {
    our_id: N,
    network: LocalNetwork<N>,
}

impl<N: NodeIdT + 'static> Transport<N> for LocalEndpoint<N> {
    fn send_to(&self, target: &N, bytes: Vec<u8>) -> result::Result<(), TransportError> {
        // The lock is released before delivering: a bounded inbox may block.
        let inbox = self
            .network
            .inbox(target)
            .ok_or_else(|| TransportError::UnknownPeer(format!("{:?}", target)))?;
        inbox
            .deliver_raw(self.our_id.clone(), &bytes)
            .map_err(|err| TransportError::Rejected(format!("{:?}", target), err.to_string()))
    }
}
