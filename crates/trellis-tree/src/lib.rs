//! Widget ownership for the Trellis layout engine.
//!
//! # Design
//!
//! Widgets live in a generational arena. A [`NodeId`] stays valid while the
//! node exists and is never reused for a different node afterwards, so a
//! stale id is detected instead of silently aliasing a newer widget. The
//! arena only records parent links; each container owns the order of its
//! own children (see [`Sequence`]).

mod sequence;

pub use sequence::Sequence;

use slotmap::SlotMap;

slotmap::new_key_type! {
    /// A generational handle to a node in a [`Tree`].
    pub struct NodeId;
}

/// Errors raised by parent/child bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The id does not refer to a live node.
    #[error("node {0:?} does not exist")]
    NoSuchNode(NodeId),
    /// The child already belongs to a parent.
    #[error("node {child:?} already has parent {parent:?}")]
    AlreadyParented {
        /// The node being parented.
        child: NodeId,
        /// Its current parent.
        parent: NodeId,
    },
    /// The node has no parent to be removed from.
    #[error("node {0:?} has no parent")]
    NotParented(NodeId),
    /// Parenting would make a node its own ancestor.
    #[error("node {child:?} is an ancestor of {parent:?}")]
    Cycle {
        /// The node being parented.
        child: NodeId,
        /// The requested parent.
        parent: NodeId,
    },
    /// A node cannot be destroyed while it is still parented.
    #[error("node {0:?} is still attached to a parent")]
    StillParented(NodeId),
}

/// A node with its payload and parent link.
#[derive(Debug, Clone)]
struct Node<T> {
    data: T,
    parent: Option<NodeId>,
}

/// Arena of parent-linked nodes.
#[derive(Debug, Clone)]
pub struct Tree<T> {
    nodes: SlotMap<NodeId, Node<T>>,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Tree<T> {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
        }
    }

    /// Allocate a new unparented node.
    pub fn insert(&mut self, data: T) -> NodeId {
        self.nodes.insert(Node { data, parent: None })
    }

    /// Destroy an unparented node and return its payload.
    ///
    /// # Errors
    ///
    /// Fails if the node does not exist or still has a parent.
    pub fn remove(&mut self, id: NodeId) -> Result<T, TreeError> {
        match self.nodes.get(id) {
            None => Err(TreeError::NoSuchNode(id)),
            Some(node) if node.parent.is_some() => Err(TreeError::StillParented(id)),
            Some(_) => self
                .nodes
                .remove(id)
                .map(|node| node.data)
                .ok_or(TreeError::NoSuchNode(id)),
        }
    }

    /// Whether `id` refers to a live node.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Borrow a node's payload.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&T> {
        self.nodes.get(id).map(|node| &node.data)
    }

    /// Mutably borrow a node's payload.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.nodes.get_mut(id).map(|node| &mut node.data)
    }

    /// The parent of `id`, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    /// Attach `child` to `parent`.
    ///
    /// # Errors
    ///
    /// Fails if either node is missing, the child is already parented, or
    /// the child is an ancestor of (or equal to) the parent.
    pub fn set_parent(&mut self, child: NodeId, parent: NodeId) -> Result<(), TreeError> {
        if !self.contains(parent) {
            return Err(TreeError::NoSuchNode(parent));
        }
        let current = self
            .nodes
            .get(child)
            .ok_or(TreeError::NoSuchNode(child))?
            .parent;
        if let Some(current) = current {
            return Err(TreeError::AlreadyParented {
                child,
                parent: current,
            });
        }
        if child == parent || self.ancestors(parent).any(|id| id == child) {
            return Err(TreeError::Cycle { child, parent });
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        Ok(())
    }

    /// Detach `child` from its parent, returning the former parent.
    ///
    /// # Errors
    ///
    /// Fails if the node is missing or has no parent.
    pub fn unparent(&mut self, child: NodeId) -> Result<NodeId, TreeError> {
        let node = self.nodes.get_mut(child).ok_or(TreeError::NoSuchNode(child))?;
        node.parent.take().ok_or(TreeError::NotParented(child))
    }

    /// Iterate over the ancestors of `id`, nearest first.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_, T> {
        Ancestors {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Iterate over every live node.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &T)> {
        self.nodes.iter().map(|(id, node)| (id, &node.data))
    }
}

/// Iterator over the ancestors of a node.
///
/// Created by [`Tree::ancestors`].
pub struct Ancestors<'a, T> {
    tree: &'a Tree<T>,
    current: Option<NodeId>,
}

impl<T> Iterator for Ancestors<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}
