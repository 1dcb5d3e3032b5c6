use std::path::PathBuf;

use crate::error::{AppError, Result};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
const MAX_PAGE_SIZE: u32 = 50;
const DEFAULT_RESULTS_DIR: &str = "migration_results";

#[derive(Debug, Clone)]
pub struct Config {
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub spotify_refresh_token: String,
    pub youtube_client_id: String,
    pub youtube_client_secret: String,
    pub youtube_refresh_token: String,
    pub page_size: u32,
    pub results_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Absent credentials become empty strings so
    /// `get_missing_config` can report all of them at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).unwrap_or_default().trim().to_string();

        let page_size = match lookup("PLAYLIST_BRIDGE_PAGE_SIZE") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                AppError::Config(format!("PLAYLIST_BRIDGE_PAGE_SIZE is not a number: {}", raw))
            })?,
            None => DEFAULT_PAGE_SIZE,
        }
        .clamp(1, MAX_PAGE_SIZE);

        let results_dir = lookup("PLAYLIST_BRIDGE_RESULTS_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_DIR));

        Ok(Self {
            spotify_client_id: var("SPOTIFY_CLIENT_ID"),
            spotify_client_secret: var("SPOTIFY_CLIENT_SECRET"),
            spotify_refresh_token: var("SPOTIFY_REFRESH_TOKEN"),
            youtube_client_id: var("YOUTUBE_CLIENT_ID"),
            youtube_client_secret: var("YOUTUBE_CLIENT_SECRET"),
            youtube_refresh_token: var("YOUTUBE_REFRESH_TOKEN"),
            page_size,
            results_dir,
        })
    }

    pub fn get_missing_config(&self) -> Vec<String> {
        let mut missing = Vec::new();

        let required = [
            ("SPOTIFY_CLIENT_ID", &self.spotify_client_id),
            ("SPOTIFY_CLIENT_SECRET", &self.spotify_client_secret),
            ("SPOTIFY_REFRESH_TOKEN", &self.spotify_refresh_token),
            ("YOUTUBE_CLIENT_ID", &self.youtube_client_id),
            ("YOUTUBE_CLIENT_SECRET", &self.youtube_client_secret),
            ("YOUTUBE_REFRESH_TOKEN", &self.youtube_refresh_token),
        ];
        for (name, value) in required {
            if value.is_empty() {
                missing.push(name.to_string());
            }
        }

        missing
    }

    pub fn validate_spotify_config(&self) -> bool {
        !self.spotify_client_id.is_empty()
            && !self.spotify_client_secret.is_empty()
            && !self.spotify_refresh_token.is_empty()
    }

    pub fn validate_youtube_config(&self) -> bool {
        !self.youtube_client_id.is_empty()
            && !self.youtube_client_secret.is_empty()
            && !self.youtube_refresh_token.is_empty()
    }
}
