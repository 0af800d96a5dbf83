pub mod severity;
pub mod store;
pub mod types;

pub use severity::Severity;
pub use store::{InvocationStore, StatusSummary, StoreChange, StoreObserver};
pub use types::{Invocation, InvocationMap, InvocationRecord, Status};
