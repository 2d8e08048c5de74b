pub mod api_types;
pub mod coin;
pub mod index;

pub use api_types::*;
pub use coin::*;
pub use index::*;
