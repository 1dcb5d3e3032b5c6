use thiserror::Error;

use crate::platform::PlatformKind;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Spotify API error: {0}")]
    SpotifyApi(#[from] rspotify::ClientError),

    #[error("{platform} API error ({status}): {message}")]
    Api {
        platform: PlatformKind,
        status: u16,
        message: String,
    },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("{0} credential is missing or expired, reconnect the account")]
    CredentialExpired(PlatformKind),

    #[error("YouTube account has no channel; create one before making playlists")]
    NoPublishingChannel,

    #[error("Rate limited by {0}")]
    RateLimited(PlatformKind),

    #[error("Invalid transition: cannot {event} while {state}")]
    InvalidTransition { state: String, event: String },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Fatal failure to create the target playlist. Aborts a job before any track is touched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CreationError {
    #[error("the YouTube account has no channel yet")]
    MissingChannel,

    #[error("{0} credential is missing or expired")]
    CredentialExpired(PlatformKind),

    #[error("playlist creation failed: {0}")]
    Api(String),
}

impl CreationError {
    /// Where the user can fix the problem outside of this tool, if anywhere.
    pub fn remediation_url(&self) -> Option<&'static str> {
        match self {
            CreationError::MissingChannel => Some("https://www.youtube.com/create_channel"),
            CreationError::CredentialExpired(_) | CreationError::Api(_) => None,
        }
    }
}

impl From<AppError> for CreationError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::NoPublishingChannel => CreationError::MissingChannel,
            AppError::CredentialExpired(platform) => CreationError::CredentialExpired(platform),
            other => CreationError::Api(other.to_string()),
        }
    }
}
