pub mod cache;
pub mod sim;

pub use cache::{DragDebouncer, PositionCache};
pub use sim::{LayoutConfig, LayoutNode, Position, layout};
