pub mod config;
pub mod dashboard;
pub mod endpoint;
pub mod error;
pub mod view;

#[path = "invocation/lib.rs"]
pub mod invocation;
#[path = "feed/lib.rs"]
pub mod feed;
#[path = "api/lib.rs"]
pub mod api;

pub use config::DashboardConfig;
pub use dashboard::{Dashboard, DashboardEvent};
pub use endpoint::{derive_stream_endpoint, stream_endpoint_for};
pub use error::DashboardError;
pub use view::{CardDescriptor, Notice, RenderPass};
