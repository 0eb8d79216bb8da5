mod cleanup;
mod error;
mod interfaces;
mod pipeline;

pub use cleanup::*;
pub use error::*;
pub use interfaces::*;
pub use pipeline::*;
