pub mod loader;
pub mod queue;
pub mod schema;

pub use queue::{IngestJob, IngestQueue};
