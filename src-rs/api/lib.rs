pub mod handlers;
pub mod server;

pub use server::{FeedServer, FeedServerError, FeedState, PublishedUpdate};
