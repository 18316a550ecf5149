pub mod api_types;
pub mod cache;
pub mod client;
pub mod coordinator;
pub mod types;

pub use client::NewsClient;
pub use coordinator::{FetchCoordinator, WarmSummary};
pub use types::{Article, ArticlePage, DateRange, SourceCount};

