//! Process-wide observability setup.

mod tracing;

pub use tracing::init;
