pub mod bulk_loader;
pub mod cursor;
pub mod node;

pub use bulk_loader::bulk_load;
pub use cursor::Cursor;
pub use node::{InternalNode, LeafNode, NodeLayout, RootHeader};
