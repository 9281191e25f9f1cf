//! YouTube augmentation: intent detection plus Data API search.

pub mod client;
pub mod query;

pub use client::{Video, YoutubeClient};
pub use query::extract_youtube_query;
