use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::matcher::{build_query, is_low_confidence, similarity};
use crate::platform::{MusicPlatform, PlatformKind, SearchHit, Track};

pub const NOT_FOUND_MESSAGE: &str = "not found on target platform";

/// Best-effort match of one source track on the target platform.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub target_id: Option<String>,
    pub hit: Option<SearchHit>,
    pub score: Option<f64>,
    /// Why there is no match, or a note about a weak one.
    pub message: Option<String>,
    /// The target credential could not be obtained, so nothing was searched.
    pub expired_credential: Option<PlatformKind>,
}

impl Resolution {
    fn linked(target_id: String) -> Self {
        Self {
            target_id: Some(target_id),
            hit: None,
            score: None,
            message: None,
            expired_credential: None,
        }
    }

    fn unresolved(message: impl Into<String>) -> Self {
        Self {
            target_id: None,
            hit: None,
            score: None,
            message: Some(message.into()),
            expired_credential: None,
        }
    }

    fn credential_expired(platform: PlatformKind) -> Self {
        Self {
            expired_credential: Some(platform),
            ..Self::unresolved(AppError::CredentialExpired(platform).to_string())
        }
    }
}

pub struct TrackResolver {
    source: Arc<dyn MusicPlatform>,
    target: Arc<dyn MusicPlatform>,
}

impl TrackResolver {
    pub fn new(source: Arc<dyn MusicPlatform>, target: Arc<dyn MusicPlatform>) -> Self {
        Self { source, target }
    }

    /// Resolve a track to a target-platform id. Never fails: search errors and empty
    /// results come back as an unresolved [`Resolution`] carrying the reason. An expired
    /// target credential is flagged in `expired_credential`.
    pub async fn resolve(&self, track: &Track) -> Resolution {
        if let Some(id) = track
            .target_url
            .as_deref()
            .and_then(|url| self.target.native_id(url))
        {
            debug!("Using existing {} link for {}", self.target.kind(), track);
            return Resolution::linked(id);
        }

        let source_id = track
            .source_url
            .as_deref()
            .and_then(|url| self.source.native_id(url))
            .unwrap_or_else(|| track.id.clone());

        let query = build_query(track);
        if query.is_empty() {
            return Resolution::unresolved(NOT_FOUND_MESSAGE);
        }

        debug!(
            "Searching {} for {} ({}): {}",
            self.target.kind(),
            source_id,
            self.source.kind(),
            query
        );

        match self.target.search_match(&query).await {
            Ok(Some(hit)) => {
                let score = similarity(track, &hit);
                let message = if is_low_confidence(score) {
                    warn!(
                        "Low-confidence match for {}: \"{}\" by {} (score {:.2})",
                        track, hit.title, hit.artist, score
                    );
                    Some(format!(
                        "low-confidence match: \"{}\" by {}",
                        hit.title, hit.artist
                    ))
                } else {
                    None
                };

                Resolution {
                    target_id: Some(hit.id.clone()),
                    hit: Some(hit),
                    score: Some(score),
                    message,
                    expired_credential: None,
                }
            }
            Ok(None) => {
                debug!("No match found for track: {}", track);
                Resolution::unresolved(NOT_FOUND_MESSAGE)
            }
            Err(AppError::CredentialExpired(platform)) => {
                warn!("{} credential expired while searching for {}", platform, track);
                Resolution::credential_expired(platform)
            }
            Err(e) => {
                warn!("Search failed for {}: {}", track, e);
                Resolution::unresolved(format!("search failed: {}", e))
            }
        }
    }
}
