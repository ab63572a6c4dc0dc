use crate::model::Rect;
use serde::{Deserialize, Serialize};

/// Index of a node inside a [`RegionTree`] arena.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// A rectangle of the region tree.
///
/// A leaf with `used == false` is free space. A used node has been split into
/// `right` and `down`, which tile its rectangle exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Node {
    pub rect: Rect,
    pub used: bool,
    pub right: Option<NodeId>,
    pub down: Option<NodeId>,
}

impl Node {
    fn free(rect: Rect) -> Self {
        Self {
            rect,
            used: false,
            right: None,
            down: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.right.is_none() && self.down.is_none()
    }
}

/// Binary partition of the atlas into used and free rectangles.
///
/// Nodes live in a growable arena and refer to each other by index. Nodes are
/// only ever appended; growth pushes a new root whose children are existing
/// indices, so no node is rewritten or merged back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegionTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl RegionTree {
    /// A tree with a single free `w x h` root at the origin.
    pub fn new(w: u32, h: u32) -> Self {
        Self {
            nodes: vec![Node::free(Rect::new(0, 0, w, h))],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_rect(&self) -> Rect {
        self.nodes[self.root.0].rect
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Depth-first search from `start` (right subtree before down subtree) for
    /// the first free leaf that can hold `w x h`.
    pub fn find(&self, start: NodeId, w: u32, h: u32) -> Option<NodeId> {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if node.used {
                if let Some(down) = node.down {
                    stack.push(down);
                }
                if let Some(right) = node.right {
                    stack.push(right);
                }
            } else if w <= node.rect.w && h <= node.rect.h {
                return Some(id);
            }
        }
        None
    }

    /// Marks free leaf `id` used by a `w x h` block at its top-left corner and
    /// splits the remainder into `right` and `down` leaves.
    /// Returns the block's origin.
    pub fn split(&mut self, id: NodeId, w: u32, h: u32) -> (u32, u32) {
        let r = self.nodes[id.0].rect;
        debug_assert!(!self.nodes[id.0].used, "split of a used node");
        debug_assert!(w <= r.w && h <= r.h, "split larger than node");
        let down = self.push(Node::free(Rect::new(r.x, r.y + h, r.w, r.h - h)));
        let right = self.push(Node::free(Rect::new(r.x + w, r.y, r.w - w, h)));
        let node = &mut self.nodes[id.0];
        node.used = true;
        node.down = Some(down);
        node.right = Some(right);
        (r.x, r.y)
    }

    /// Widens the tree by `w`. The old root becomes the `down` child of a new
    /// root; the new free column on the right is returned.
    ///
    /// Returns `None`, leaving the tree untouched, if the width would overflow.
    pub fn grow_right(&mut self, w: u32) -> Option<NodeId> {
        let old = self.root_rect();
        let width = old.w.checked_add(w)?;
        let free = self.push(Node::free(Rect::new(old.w, 0, w, old.h)));
        self.root = self.push(Node {
            rect: Rect::new(0, 0, width, old.h),
            used: true,
            right: Some(free),
            down: Some(self.root),
        });
        Some(free)
    }

    /// Heightens the tree by `h`. The old root becomes the `right` child of a
    /// new root; the new free row at the bottom is returned.
    ///
    /// Returns `None`, leaving the tree untouched, if the height would overflow.
    pub fn grow_down(&mut self, h: u32) -> Option<NodeId> {
        let old = self.root_rect();
        let height = old.h.checked_add(h)?;
        let free = self.push(Node::free(Rect::new(0, old.h, old.w, h)));
        self.root = self.push(Node {
            rect: Rect::new(0, 0, old.w, height),
            used: true,
            right: Some(self.root),
            down: Some(free),
        });
        Some(free)
    }

    /// Free leaves reachable from the current root, in search order.
    pub fn free_leaves(&self) -> Vec<Rect> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if node.used {
                if let Some(down) = node.down {
                    stack.push(down);
                }
                if let Some(right) = node.right {
                    stack.push(right);
                }
            } else {
                out.push(node.rect);
            }
        }
        out
    }
}
