use super::tree::{NodeId, RegionTree};
use crate::error::{AtlasError, Result};
use crate::model::{Block, Rect};
use tracing::debug;

/// Direction in which the atlas is enlarged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Growth {
    Right,
    Down,
}

/// Picks a growth direction for a pending `w x h` block given the current
/// root `rw x rh`, keeping the atlas roughly square.
///
/// Returns `None` when neither direction can admit the block, i.e. it is
/// larger than the root in both dimensions.
pub fn choose_growth(rw: u32, rh: u32, w: u32, h: u32) -> Option<Growth> {
    let can_grow_down = w <= rw;
    let can_grow_right = h <= rh;
    let should_grow_right = can_grow_right && rh as u64 >= rw as u64 + w as u64;
    let should_grow_down = can_grow_down && rw as u64 >= rh as u64 + h as u64;

    if should_grow_right {
        Some(Growth::Right)
    } else if should_grow_down {
        Some(Growth::Down)
    } else if can_grow_right {
        Some(Growth::Right)
    } else if can_grow_down {
        Some(Growth::Down)
    } else {
        None
    }
}

/// Binary-tree packer whose bounding box grows on demand.
///
/// The first block sizes the root unless an initial size is given. Each block
/// is placed in the first free leaf that fits; when none does, the root is
/// extended to the right or downward by exactly the block's size. A block
/// that exceeds the root both ways first stretches one side to match it.
/// Placed origins never move.
#[derive(Debug, Clone, Default)]
pub struct GrowingPacker {
    tree: Option<RegionTree>,
}

impl GrowingPacker {
    pub fn new() -> Self {
        Self { tree: None }
    }

    /// Starts from a free `w x h` root instead of sizing it from the first block.
    pub fn with_initial_size(w: u32, h: u32) -> Self {
        Self {
            tree: Some(RegionTree::new(w, h)),
        }
    }

    /// Places every block in order, assigning `fit`. Ordering is the caller's choice.
    ///
    /// Fails with [`AtlasError::TooLarge`] if the atlas would outgrow `u32`.
    /// Blocks placed before the failure keep their `fit`.
    ///
    /// # Panics
    ///
    /// If growth is needed while the block or the root has a zero side.
    pub fn fit(&mut self, blocks: &mut [Block]) -> Result<()> {
        for block in blocks.iter_mut() {
            let (x, y) = self.place(block.w, block.h)?;
            block.fit = Some((x, y));
        }
        Ok(())
    }

    /// Places a single `w x h` rectangle and returns its origin.
    pub fn place(&mut self, w: u32, h: u32) -> Result<(u32, u32)> {
        let tree = self.tree.get_or_insert_with(|| RegionTree::new(w, h));
        if let Some(id) = tree.find(tree.root(), w, h) {
            return Ok(tree.split(id, w, h));
        }
        let root = tree.root_rect();
        let free = grow(tree, w, h)?;
        match tree.find(free, w, h) {
            Some(id) => Ok(tree.split(id, w, h)),
            None => panic!(
                "grown region cannot hold block {}x{} (root was {}x{})",
                w, h, root.w, root.h
            ),
        }
    }

    pub fn width(&self) -> u32 {
        self.root_rect().w
    }

    pub fn height(&self) -> u32 {
        self.root_rect().h
    }

    /// Current bounding box; `0x0` before anything is placed.
    pub fn root_rect(&self) -> Rect {
        self.tree
            .as_ref()
            .map(|t| t.root_rect())
            .unwrap_or(Rect::new(0, 0, 0, 0))
    }

    pub fn tree(&self) -> Option<&RegionTree> {
        self.tree.as_ref()
    }

    pub fn into_tree(self) -> Option<RegionTree> {
        self.tree
    }
}

fn grow(tree: &mut RegionTree, w: u32, h: u32) -> Result<NodeId> {
    let root = tree.root_rect();
    let too_large = |width: u32, height: u32| AtlasError::TooLarge {
        width,
        height,
        max_width: u32::MAX,
        max_height: u32::MAX,
    };
    let direction = match choose_growth(root.w, root.h, w, h) {
        Some(d) => d,
        None if w == 0 || h == 0 || root.w == 0 || root.h == 0 => panic!(
            "no growth direction for block {}x{} in {}x{} atlas",
            w, h, root.w, root.h
        ),
        // Larger than the root both ways: stretch one side up to the block first.
        None => {
            let pad = pad_direction(root.w, root.h, w, h);
            debug!(w, h, from = ?(root.w, root.h), ?pad, "pad before growing");
            match pad {
                Growth::Down => {
                    tree.grow_down(h - root.h)
                        .ok_or_else(|| too_large(root.w, h))?;
                    Growth::Right
                }
                Growth::Right => {
                    tree.grow_right(w - root.w)
                        .ok_or_else(|| too_large(w, root.h))?;
                    Growth::Down
                }
            }
        }
    };
    let root = tree.root_rect();
    match direction {
        Growth::Right => {
            debug!(w, h, from = ?(root.w, root.h), "grow right");
            tree.grow_right(w)
                .ok_or_else(|| too_large(root.w.saturating_add(w), root.h))
        }
        Growth::Down => {
            debug!(w, h, from = ?(root.w, root.h), "grow down");
            tree.grow_down(h)
                .ok_or_else(|| too_large(root.w, root.h.saturating_add(h)))
        }
    }
}

/// Which side to stretch when a `w x h` block exceeds an `rw x rh` root in
/// both directions. Padding down ends at `(rw + w) x h`, padding right at
/// `w x (rh + h)`; the one with the shorter long side wins, down on a tie.
fn pad_direction(rw: u32, rh: u32, w: u32, h: u32) -> Growth {
    let down = (rw as u64 + w as u64).max(h as u64);
    let right = (w as u64).max(rh as u64 + h as u64);
    if right < down { Growth::Right } else { Growth::Down }
}
