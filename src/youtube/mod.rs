pub mod client;
pub mod models;

pub use client::YouTubeClient;
pub use models::{parse_video_id, split_artist_title};
