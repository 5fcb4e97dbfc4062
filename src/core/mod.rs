// Listing orchestration and the data-access contract it drives

pub mod context;
pub mod traits;

// Re-export commonly used items
pub use context::QueryContext;
pub use traits::{COUNT_OPERATION, EntitySource, FIND_OPERATION, RecordSource, Unbound};
