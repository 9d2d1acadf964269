use std::collections::BTreeSet;
use std::fmt::Debug;
use std::marker::PhantomData;

use crate::NodeIdT;

/// Defines what a run collects: each node's own contribution, and how contributions combine.
///
/// `merge` must be commutative and associative: replies from siblings are merged in whatever
/// order they arrive.
pub trait Aggregator<N>: Debug + Send + Sync {
    /// The announced payload.
    type Payload: Clone + Debug + PartialEq + Send + Sync;
    /// The aggregated value.
    type Value: Clone + Debug + Send + Sync;

    /// The value node `our_id` contributes for itself, after receiving `payload`.
    fn local(&self, our_id: &N, payload: &Self::Payload) -> Self::Value;

    /// The value the root starts merging its children's replies into.
    fn empty(&self) -> Self::Value;

    /// Merges `other` into `acc`.
    fn merge(&self, acc: &mut Self::Value, other: Self::Value);
}

/// Counts the nodes. The root outputs the number of nodes other than itself.
///
/// Counts saturate at `u64::MAX`: a reply can carry any value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NodeCount;

impl<N: NodeIdT> Aggregator<N> for NodeCount {
    type Payload = String;
    type Value = u64;

    fn local(&self, _our_id: &N, _payload: &String) -> u64 {
        1
    }

    fn empty(&self) -> u64 {
        0
    }

    fn merge(&self, acc: &mut u64, other: u64) {
        *acc = acc.saturating_add(other);
    }
}

/// Collects node IDs. The root outputs the IDs of all nodes other than itself.
#[derive(Debug)]
pub struct SubtreeIds<P> {
    _phantom: PhantomData<fn(P)>,
}

impl<P> SubtreeIds<P> {
    /// Creates a collector for runs announcing payloads of type `P`.
    pub fn new() -> Self {
        SubtreeIds {
            _phantom: PhantomData,
        }
    }
}

impl<P> Default for SubtreeIds<P> {
    fn default() -> Self {
        SubtreeIds::new()
    }
}

impl<P> Clone for SubtreeIds<P> {
    fn clone(&self) -> Self {
        SubtreeIds::new()
    }
}

impl<N, P> Aggregator<N> for SubtreeIds<P>
where
    N: NodeIdT,
    P: Clone + Debug + PartialEq + Send + Sync,
{
    type Payload = P;
    type Value = BTreeSet<N>;

    fn local(&self, our_id: &N, _payload: &P) -> BTreeSet<N> {
        let mut ids = BTreeSet::new();
        ids.insert(our_id.clone());
        ids
    }

    fn empty(&self) -> BTreeSet<N> {
        BTreeSet::new()
    }

    fn merge(&self, acc: &mut BTreeSet<N>, mut other: BTreeSet<N>) {
        acc.append(&mut other);
    }
}
