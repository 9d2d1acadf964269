//! Network adversaries
//!
//! An adversary may reorder the queued messages before each crank. The tree protocols only
//! require per-edge ordering, and carry at most one message per edge and direction, so any order
//! is legal.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use treecast::DistAlgorithm;

use super::VirtualNet;

pub trait Adversary<D>
where
    D: DistAlgorithm,
{
    fn pre_crank(&mut self, _net: &mut VirtualNet<D>) {
        // The default implementation does not alter anything.
    }
}

/// Delivers messages in the order they were sent.
pub struct NullAdversary;

impl<D: DistAlgorithm> Adversary<D> for NullAdversary {}

/// Delivers a randomly chosen queued message next.
pub struct ReorderingAdversary {
    rng: StdRng,
}

impl ReorderingAdversary {
    pub fn new(seed: u64) -> Self {
        ReorderingAdversary {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<D: DistAlgorithm> Adversary<D> for ReorderingAdversary {
    fn pre_crank(&mut self, net: &mut VirtualNet<D>) {
        let queue = net.queue_mut();
        if queue.len() > 1 {
            let idx = self.rng.gen_range(0..queue.len());
            queue.swap(0, idx);
        }
    }
}
