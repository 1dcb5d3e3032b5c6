use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{AppError, CreationError};
use crate::platform::{AppendOutcome, MusicPlatform, PlatformKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendStatus {
    Added,
    /// Already in the playlist. The desired end state holds, so this counts as success.
    AlreadyPresent,
    /// No credential for the target platform. The job cannot continue.
    CredentialExpired(PlatformKind),
    Failed(String),
}

/// Writes to the target platform one call at a time. A created playlist is never rolled
/// back, so a job with failed insertions leaves it partially filled.
pub struct PlaylistWriter {
    target: Arc<dyn MusicPlatform>,
}

impl PlaylistWriter {
    pub fn new(target: Arc<dyn MusicPlatform>) -> Self {
        Self { target }
    }

    pub fn platform(&self) -> PlatformKind {
        self.target.kind()
    }

    pub async fn create_playlist(
        &self,
        name: &str,
        description: &str,
    ) -> Result<String, CreationError> {
        match self.target.create_playlist(name, description).await {
            Ok(id) => {
                info!("Created {} playlist \"{}\" ({})", self.target.kind(), name, id);
                Ok(id)
            }
            Err(e) => {
                warn!(
                    "Failed to create {} playlist \"{}\": {}",
                    self.target.kind(),
                    name,
                    e
                );
                Err(CreationError::from(e))
            }
        }
    }

    pub async fn append_track(&self, playlist_id: &str, track_id: &str) -> AppendStatus {
        match self.target.append_track(playlist_id, track_id).await {
            Ok(AppendOutcome::Added) => {
                debug!("Added {} to {}", track_id, playlist_id);
                AppendStatus::Added
            }
            Ok(AppendOutcome::AlreadyPresent) => {
                debug!("{} already in {}", track_id, playlist_id);
                AppendStatus::AlreadyPresent
            }
            Err(AppError::CredentialExpired(platform)) => {
                warn!("{} credential expired while adding {}", platform, track_id);
                AppendStatus::CredentialExpired(platform)
            }
            Err(e) => {
                warn!("Failed to add {} to {}: {}", track_id, playlist_id, e);
                AppendStatus::Failed(e.to_string())
            }
        }
    }
}
