#![deny(clippy::unwrap_used)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::cast_sign_loss,
    clippy::module_inception,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap
)]

pub mod database;
pub mod ingest;
pub mod job_queue;
pub mod metadata;
pub mod sources;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
