pub mod client;
pub mod stream;
pub mod types;

pub use client::{FeedClient, INVOCATIONS_PATH};
pub use stream::{InvocationSubscription, STREAM_PATH};
pub use types::{InvocationUpdate, InvocationsResponse};
