use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::platform::PlatformKind;

const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Tokens this close to expiry are refreshed before use.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Supplies a bearer credential per platform.
///
/// Implementations refresh transparently and fail with
/// [`AppError::CredentialExpired`] when no valid credential can be obtained.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn access_token(&self, platform: PlatformKind) -> Result<String>;
}

/// Fixed, pre-minted tokens. Never refreshes.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    tokens: HashMap<PlatformKind, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, platform: PlatformKind, token: impl Into<String>) -> Self {
        self.tokens.insert(platform, token.into());
        self
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn access_token(&self, platform: PlatformKind) -> Result<String> {
        self.tokens
            .get(&platform)
            .filter(|token| !token.is_empty())
            .cloned()
            .ok_or(AppError::CredentialExpired(platform))
    }
}

#[derive(Debug, Clone)]
pub struct OAuthApp {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) > now
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Refresh-token grant against Spotify's accounts service and Google's OAuth endpoint.
pub struct RefreshingCredentials {
    http_client: Client,
    spotify: Option<OAuthApp>,
    youtube: Option<OAuthApp>,
    cache: Mutex<HashMap<PlatformKind, CachedToken>>,
}

impl RefreshingCredentials {
    pub fn new(http_client: Client, spotify: Option<OAuthApp>, youtube: Option<OAuthApp>) -> Self {
        Self {
            http_client,
            spotify,
            youtube,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(http_client: Client, config: &Config) -> Self {
        let spotify = config.validate_spotify_config().then(|| OAuthApp {
            client_id: config.spotify_client_id.clone(),
            client_secret: config.spotify_client_secret.clone(),
            refresh_token: config.spotify_refresh_token.clone(),
        });
        let youtube = config.validate_youtube_config().then(|| OAuthApp {
            client_id: config.youtube_client_id.clone(),
            client_secret: config.youtube_client_secret.clone(),
            refresh_token: config.youtube_refresh_token.clone(),
        });

        Self::new(http_client, spotify, youtube)
    }

    fn app(&self, platform: PlatformKind) -> Option<&OAuthApp> {
        match platform {
            PlatformKind::Spotify => self.spotify.as_ref(),
            PlatformKind::YouTube => self.youtube.as_ref(),
        }
    }

    async fn refresh(&self, platform: PlatformKind, app: &OAuthApp) -> Result<CachedToken> {
        debug!("Refreshing {} access token", platform);

        let request = match platform {
            PlatformKind::Spotify => self
                .http_client
                .post(SPOTIFY_TOKEN_URL)
                .basic_auth(&app.client_id, Some(&app.client_secret))
                .form(&[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", app.refresh_token.as_str()),
                ]),
            PlatformKind::YouTube => self.http_client.post(GOOGLE_TOKEN_URL).form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", app.refresh_token.as_str()),
                ("client_id", app.client_id.as_str()),
                ("client_secret", app.client_secret.as_str()),
            ]),
        };

        let response = request.send().await?;
        let status = response.status();

        if status.is_client_error() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("{} token refresh rejected ({}): {}", platform, status, error_text);
            return Err(AppError::CredentialExpired(platform));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Auth(format!(
                "{} token refresh failed ({}): {}",
                platform, status, error_text
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("Failed to parse token response: {}", e)))?;

        info!("Refreshed {} access token", platform);

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        })
    }
}

#[async_trait]
impl CredentialProvider for RefreshingCredentials {
    async fn access_token(&self, platform: PlatformKind) -> Result<String> {
        let app = self
            .app(platform)
            .ok_or(AppError::CredentialExpired(platform))?;

        // Held across the refresh: at most one refresh per platform in flight.
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.get(&platform) {
            if cached.is_fresh(Utc::now()) {
                return Ok(cached.access_token.clone());
            }
        }

        let token = self.refresh(platform, app).await?;
        let access_token = token.access_token.clone();
        cache.insert(platform, token);

        Ok(access_token)
    }
}
