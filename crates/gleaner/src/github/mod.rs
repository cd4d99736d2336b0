//! GitHub REST client.
//!
//! [`GitHubClient`] is the production [`crate::platform::PlatformClient`].
//! It speaks plain REST over [`crate::http::HttpTransport`] so tests can
//! script responses with a mock transport.

mod client;
mod error;
mod pagination;
mod types;

pub use client::{DEFAULT_API_BASE, GitHubClient};
pub use error::GitHubError;
pub use pagination::{LinkPagination, parse_link_header};
pub use types::{GitHubRateLimitResponse, GitHubRateLimits, RateLimitResource};
