pub mod github;

pub use github::{GitHubApi, GitHubClient, UpstreamError};
