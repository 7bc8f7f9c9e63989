//! Arena-backed binary tree for the bracket.
//!
//! Nodes live in one `Vec` and refer to each other by [`NodeId`]. Children are owning
//! edges, `parent` is a non-owning back-reference, so the tree has no cyclic ownership.
//! Nodes are never removed individually; the whole arena is dropped with the tournament.

use crate::models::node::{BracketNode, NodeId};
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Clone, Debug, Serialize)]
pub struct BracketTree<P> {
    nodes: Vec<BracketNode<P>>,
    root: NodeId,
}

impl<P: Copy + Eq> BracketTree<P> {
    /// New tree consisting of a single root leaf.
    pub fn new(root_occupant: Option<P>) -> Self {
        Self {
            nodes: vec![BracketNode::new(root_occupant)],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes in the arena, reachable or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a detached node.
    pub fn add_node(&mut self, occupant: Option<P>) -> NodeId {
        self.nodes.push(BracketNode::new(occupant));
        NodeId(self.nodes.len() - 1)
    }

    pub fn get(&self, id: NodeId) -> Option<&BracketNode<P>> {
        self.nodes.get(id.0)
    }

    /// Node by id. Ids are only handed out by this tree, so a miss is a caller bug.
    pub fn node(&self, id: NodeId) -> &BracketNode<P> {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut BracketNode<P> {
        &mut self.nodes[id.0]
    }

    /// Replace the children of `id`. Old children lose their parent pointer before the new
    /// pair is attached, so no stale back-reference survives a rewire.
    pub fn set_children(&mut self, id: NodeId, children: Option<[NodeId; 2]>) {
        if let Some(old) = self.nodes[id.0].children.take() {
            for child in old {
                self.nodes[child.0].parent = None;
            }
        }
        if let Some(new) = children {
            debug_assert!(new[0] != new[1] && new[0] != id && new[1] != id);
            for child in new {
                self.nodes[child.0].parent = Some(id);
            }
        }
        self.nodes[id.0].children = children;
    }

    /// Breadth-first walk from the root. Visits each reachable node once; leaves simply
    /// contribute no children, so partially built trees are fine.
    pub fn traverse<F>(&self, mut visitor: F)
    where
        F: FnMut(NodeId, &BracketNode<P>),
    {
        let mut queue = VecDeque::from([self.root]);
        while let Some(id) = queue.pop_front() {
            let node = &self.nodes[id.0];
            visitor(id, node);
            if let Some(children) = node.children {
                queue.extend(children);
            }
        }
    }

    /// Breadth-first search returning the first `Some` the predicate produces.
    pub fn find<T, F>(&self, mut predicate: F) -> Option<T>
    where
        F: FnMut(NodeId, &BracketNode<P>) -> Option<T>,
    {
        let mut queue = VecDeque::from([self.root]);
        while let Some(id) = queue.pop_front() {
            let node = &self.nodes[id.0];
            if let Some(found) = predicate(id, node) {
                return Some(found);
            }
            if let Some(children) = node.children {
                queue.extend(children);
            }
        }
        None
    }

    /// Edges between `id` and the root.
    pub fn depth(&self, id: NodeId) -> u32 {
        let mut depth = 0;
        let mut current = self.nodes[id.0].parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.nodes[parent.0].parent;
        }
        depth
    }

    /// Occupants of both children, if `id` is internal.
    pub fn child_occupants(&self, id: NodeId) -> Option<[Option<P>; 2]> {
        self.nodes[id.0]
            .children
            .map(|[a, b]| [self.nodes[a.0].occupant, self.nodes[b.0].occupant])
    }

    /// Whether `id` is internal and both of its children have a decided occupant.
    pub fn children_decided(&self, id: NodeId) -> bool {
        matches!(self.child_occupants(id), Some([Some(_), Some(_)]))
    }
}
