pub mod block;
pub mod node;

pub use block::{Block, BlockData};
pub use node::Node;
