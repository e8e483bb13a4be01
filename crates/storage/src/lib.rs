//! Sparse spatial storage for the voxide world: a location-keyed hashmap,
//! the auto-deepening octree that owns node data, and the live list the
//! scheduler iterates.

mod live;
mod map;
mod store;
mod tree;

pub use map::LocationMap;
pub use store::{NodeData, NodeStore};
pub use tree::LEAF_WIDTH;
