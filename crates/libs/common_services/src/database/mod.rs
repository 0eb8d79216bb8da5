mod error;
mod photo_repository;
mod photo_store;
mod utils;

pub use error::*;
pub use photo_repository::*;
pub use photo_store::*;
pub use utils::*;
