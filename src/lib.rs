pub mod collect;
pub mod config;
pub mod credentials;
pub mod github;
pub mod render;
pub mod sink;
pub mod traffic;

// Re-export commonly used types
pub use collect::{RunStats, Target};
pub use credentials::Credentials;
pub use github::GitHubClient;
pub use traffic::{ApiResponse, MetricKind, Report};
