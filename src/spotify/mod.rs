pub mod client;
pub mod models;

pub use client::SpotifyClient;
pub use models::{parse_playlist_id, parse_track_id};
