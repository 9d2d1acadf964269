//! Spanning tree topology: a whole `Tree`, and each node's local `TreeInfo` view of it.

use std::collections::BTreeMap;
use std::sync::Arc;

use failure::Fail;

use crate::NodeIdT;

/// A tree construction error.
#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum Error {
    /// The given parent has not been added yet.
    #[fail(display = "Parent node {} is not part of the tree", _0)]
    UnknownParent(String),
    /// A node can only be added once.
    #[fail(display = "Node {} is already part of the tree", _0)]
    DuplicateNode(String),
}

/// A tree construction result.
pub type Result<T> = ::std::result::Result<T, Error>;

/// One node's position in the spanning tree for a single protocol run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeInfo<N> {
    /// This node's ID.
    our_id: N,
    /// The parent's ID. `None` at the root.
    parent: Option<N>,
    /// The children's IDs, in the order messages are sent to them.
    children: Vec<N>,
}

impl<N: NodeIdT> TreeInfo<N> {
    /// Creates the view of node `our_id`, with the given neighbors.
    pub fn new(our_id: N, parent: Option<N>, children: Vec<N>) -> Self {
        TreeInfo {
            our_id,
            parent,
            children,
        }
    }

    /// The ID of the node the algorithm runs on.
    #[inline]
    pub fn our_id(&self) -> &N {
        &self.our_id
    }

    /// The parent's ID, or `None` if we are the root.
    #[inline]
    pub fn parent(&self) -> Option<&N> {
        self.parent.as_ref()
    }

    /// The children's IDs, in order. Empty for a leaf.
    #[inline]
    pub fn children(&self) -> &[N] {
        &self.children
    }

    /// Returns `true` if this node has no parent.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Returns `true` if this node has no children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns `true` if `id` is our parent.
    #[inline]
    pub fn is_parent(&self, id: &N) -> bool {
        self.parent.as_ref() == Some(id)
    }

    /// Returns `true` if `id` is one of our children.
    #[inline]
    pub fn is_child(&self, id: &N) -> bool {
        self.children.contains(id)
    }
}

/// A rooted tree.
///
/// Nodes can only be added below a node that is already present, so the tree is always connected
/// and acyclic.
#[derive(Debug, Clone)]
pub struct Tree<N> {
    root: N,
    parents: BTreeMap<N, Option<N>>,
    children: BTreeMap<N, Vec<N>>,
}

impl<N: NodeIdT> Tree<N> {
    /// Creates a tree consisting only of `root`.
    pub fn new(root: N) -> Self {
        let mut parents = BTreeMap::new();
        parents.insert(root.clone(), None);
        let mut children = BTreeMap::new();
        children.insert(root.clone(), Vec::new());
        Tree {
            root,
            parents,
            children,
        }
    }

    /// Creates a tree from `(parent, child)` edges. Each parent must be added before its own
    /// children.
    pub fn from_edges<I>(root: N, edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, N)>,
    {
        let mut tree = Tree::new(root);
        for (parent, child) in edges {
            tree.add_child(&parent, child)?;
        }
        Ok(tree)
    }

    /// Appends `child` to the children of `parent`.
    pub fn add_child(&mut self, parent: &N, child: N) -> Result<&mut Self> {
        if self.parents.contains_key(&child) {
            return Err(Error::DuplicateNode(format!("{:?}", child)));
        }
        self.children
            .get_mut(parent)
            .ok_or_else(|| Error::UnknownParent(format!("{:?}", parent)))?
            .push(child.clone());
        self.parents.insert(child.clone(), Some(parent.clone()));
        self.children.insert(child, Vec::new());
        Ok(self)
    }

    /// The root's ID.
    #[inline]
    pub fn root(&self) -> &N {
        &self.root
    }

    /// The total number of nodes, including the root.
    #[inline]
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Always `false`: a tree has at least its root.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns `true` if `id` is part of the tree.
    #[inline]
    pub fn contains(&self, id: &N) -> bool {
        self.parents.contains_key(id)
    }

    /// IDs of all nodes, in ascending order.
    pub fn node_ids(&self) -> impl Iterator<Item = &N> + Clone {
        self.parents.keys()
    }

    /// The parent of `id`. `None` for the root and for unknown nodes.
    pub fn parent(&self, id: &N) -> Option<&N> {
        self.parents.get(id).and_then(Option::as_ref)
    }

    /// The children of `id`, or `None` if `id` is not part of the tree.
    pub fn children(&self, id: &N) -> Option<&[N]> {
        self.children.get(id).map(Vec::as_slice)
    }

    /// The number of edges on the longest path from the root to a leaf.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut level = vec![&self.root];
        loop {
            let next: Vec<&N> = level
                .iter()
                .filter_map(|id| self.children.get(*id))
                .flatten()
                .collect();
            if next.is_empty() {
                return depth;
            }
            depth += 1;
            level = next;
        }
    }

    /// The local view of node `id`, or `None` if `id` is not part of the tree.
    pub fn tree_info(&self, id: &N) -> Option<TreeInfo<N>> {
        let parent = self.parents.get(id)?.clone();
        let children = self.children.get(id)?.clone();
        Some(TreeInfo::new(id.clone(), parent, children))
    }

    /// The local views of all nodes, by ID.
    pub fn tree_infos(&self) -> BTreeMap<N, Arc<TreeInfo<N>>> {
        self.node_ids()
            .filter_map(|id| Some((id.clone(), Arc::new(self.tree_info(id)?))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, Tree};

    #[test]
    fn test_tree_views() {
        let tree = Tree::from_edges(0, vec![(0, 1), (1, 2), (1, 3)]).expect("valid tree");
        assert_eq!(4, tree.len());
        assert_eq!(2, tree.depth());

        let root = tree.tree_info(&0).expect("root");
        assert!(root.is_root());
        assert_eq!(&[1], root.children());

        let inner = tree.tree_info(&1).expect("inner node");
        assert!(inner.is_parent(&0));
        assert!(inner.is_child(&3));
        assert!(!inner.is_leaf());
        assert_eq!(&[2, 3], inner.children());

        let leaf = tree.tree_info(&3).expect("leaf");
        assert!(leaf.is_leaf());
        assert_eq!(Some(&1), leaf.parent());
        assert_eq!(Some(&1), tree.parent(&3));
        assert_eq!(Some(&[2, 3][..]), tree.children(&1));
        assert!(tree.contains(&2));
        assert!(!tree.contains(&4));
        assert!(tree.tree_info(&4).is_none());
    }

    #[test]
    fn test_invalid_edges() {
        assert_eq!(
            Err(Error::UnknownParent("7".to_string())),
            Tree::from_edges(0, vec![(7, 1)]).map(|_| ())
        );
        assert_eq!(
            Err(Error::DuplicateNode("0".to_string())),
            Tree::from_edges(0, vec![(0, 1), (1, 0)]).map(|_| ())
        );
    }

    #[test]
    fn test_single_node_depth() {
        let tree = Tree::new("root");
        assert_eq!(0, tree.depth());
        assert!(tree.tree_info(&"root").expect("root").is_leaf());
    }
}
