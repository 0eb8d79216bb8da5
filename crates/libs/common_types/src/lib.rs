#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap
)]

mod error_info;
mod job;
mod media_metadata;
mod photo;
mod remote_file;

pub use error_info::*;
pub use job::*;
pub use media_metadata::*;
pub use photo::*;
pub use remote_file::*;
