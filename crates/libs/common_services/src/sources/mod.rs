mod drive;
mod error;
mod local;

pub use drive::*;
pub use error::*;
pub use local::*;
