pub mod cart;
pub mod filter;
pub mod item;
pub mod pagination;

pub use cart::*;
pub use filter::*;
pub use item::*;
pub use pagination::*;
