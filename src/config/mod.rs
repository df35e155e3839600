pub mod channels;
pub mod schema;

pub use channels::{extract_channel_id, parse_channel_list};
pub use schema::{Config, DiscordConfig, FilterConfig, SheetsConfig, SinkConfig, SqliteSinkConfig};
