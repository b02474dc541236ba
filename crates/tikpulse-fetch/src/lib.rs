//! Page fetching for public TikTok video and profile pages.

pub mod client;
pub mod error;
pub mod rate_limit;
pub mod user_agents;
pub mod username;

pub use client::{FetchMethod, FetchMode, FetchedPage, PageFetcher, ProxyConfig, MIN_HTML_BYTES};
pub use error::FetchError;
pub use rate_limit::retry_with_backoff;
pub use user_agents::USER_AGENTS;
pub use username::{
    extract_username, is_valid_username, profile_url, username_from_video_url,
    validate_page_url, validate_username, UNKNOWN_USERNAME,
};
