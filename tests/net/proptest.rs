//! Proptest helpers and strategies.

use proptest::prelude::*;
use proptest::sample::Index;

use treecast::Tree;

/// Creates a strategy for trees with node IDs `0..size`, where `size` is in `min_size..=max_size`.
///
/// Node `0` is the root. Every other node `i` is attached to a random node with a lower ID, so
/// both deep chains and wide stars are generated.
pub fn arb_tree(min_size: usize, max_size: usize) -> impl Strategy<Value = Tree<usize>> {
    assert!(min_size >= 1, "a tree has at least a root");
    (min_size..=max_size)
        .prop_flat_map(|size| prop::collection::vec(any::<Index>(), size - 1))
        .prop_map(|parents| {
            let edges = parents
                .into_iter()
                .enumerate()
                .map(|(i, parent)| (parent.index(i + 1), i + 1));
            Tree::from_edges(0, edges).expect("parents always precede their children")
        })
}
