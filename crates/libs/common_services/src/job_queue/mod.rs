mod registry;
mod scheduler;
mod worker;

pub use registry::*;
pub use scheduler::*;
