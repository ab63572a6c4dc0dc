pub mod growing;
pub mod tree;

pub use growing::{choose_growth, GrowingPacker, Growth};
pub use tree::{Node, NodeId, RegionTree};
