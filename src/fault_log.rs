//! Functionality for logging protocol violations by peer nodes.
//!
//! A violation never aborts an instance: the offending message is dropped and the node that sent
//! it is blamed in the `FaultLog` of the returned step. The dispatcher logs and counts these.

use failure::Fail;

/// A single protocol violation: which node misbehaved (`node_id`) and how (`kind`).
#[derive(Clone, Debug, PartialEq)]
pub struct Fault<N, F: Fail> {
    /// The offending node's ID.
    pub node_id: N,
    /// The kind of violation the node is blamed for.
    pub kind: F,
}

impl<N, F> Fault<N, F>
where
    F: Fail,
{
    /// Creates a new fault, blaming `node_id` for the `kind`.
    pub fn new(node_id: N, kind: F) -> Self {
        Fault { node_id, kind }
    }
}

impl<N, F: Fail> From<Fault<N, F>> for FaultLog<N, F> {
    fn from(fault: Fault<N, F>) -> Self {
        FaultLog(vec![fault])
    }
}

/// A list of protocol violations, in the order they were detected.
#[derive(Debug, PartialEq)]
pub struct FaultLog<N, F: Fail>(pub Vec<Fault<N, F>>);

impl<N, F> FaultLog<N, F>
where
    F: Fail,
{
    /// Returns `true` if there are no entries in the log.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns an iterator over the entries.
    pub fn iter(&self) -> std::slice::Iter<'_, Fault<N, F>> {
        self.0.iter()
    }
}

impl<N, F> Default for FaultLog<N, F>
where
    F: Fail,
{
    fn default() -> Self {
        FaultLog(vec![])
    }
}

impl<N, F> IntoIterator for FaultLog<N, F>
where
    F: Fail,
{
    type Item = Fault<N, F>;
    type IntoIter = std::vec::IntoIter<Fault<N, F>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
