pub mod client;
pub mod fetcher;
pub mod metadata;
pub mod rate_limit;
pub mod transport;
pub mod types;

pub use client::HttpTransport;
pub use fetcher::{FetchOutcome, PaginatedFetcher, StopReason, PAGE_LIMIT};
pub use metadata::ChannelMetadataResolver;
pub use rate_limit::RateLimitState;
pub use transport::{ApiRequest, ApiResponse, Transport};
pub use types::{ChannelInfo, Message, DM_GUILD, UNKNOWN};
