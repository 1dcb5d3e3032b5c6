use std::collections::HashSet;

use crate::error::{AppError, Result};
use crate::migrator::report::MigrationResult;
use crate::platform::{PlatformKind, PlaylistDescriptor, Track};

/// One user-initiated transfer. Lives in memory only; an interrupted job is lost.
#[derive(Debug, Clone)]
pub struct MigrationJob {
    pub source_platform: PlatformKind,
    pub target_platform: PlatformKind,
    pub source_playlist: PlaylistDescriptor,
    pub target_playlist_name: String,
    /// Set once the target playlist exists, before any insertion.
    pub target_playlist_id: Option<String>,
    pub cancelled: bool,
    /// Set when processing stopped because the credential for this platform ran out.
    pub credential_expired: Option<PlatformKind>,
    selected_tracks: Vec<Track>,
    results: Vec<MigrationResult>,
}

impl MigrationJob {
    /// Repeated selections of the same track id are kept once, in first-seen order.
    pub fn new(
        source_platform: PlatformKind,
        source_playlist: PlaylistDescriptor,
        selected_tracks: Vec<Track>,
        target_playlist_name: impl Into<String>,
    ) -> Self {
        let mut seen = HashSet::new();
        let selected_tracks = selected_tracks
            .into_iter()
            .filter(|t| seen.insert(t.id.clone()))
            .collect();

        Self {
            source_platform,
            target_platform: source_platform.other(),
            source_playlist,
            target_playlist_name: target_playlist_name.into(),
            target_playlist_id: None,
            cancelled: false,
            credential_expired: None,
            selected_tracks,
            results: Vec::new(),
        }
    }

    pub fn selected_tracks(&self) -> &[Track] {
        &self.selected_tracks
    }

    pub fn results(&self) -> &[MigrationResult] {
        &self.results
    }

    /// Append a result. Rejects a second result for the same track and any result past
    /// the size of the selection.
    pub fn record(&mut self, result: MigrationResult) -> Result<()> {
        if self.results.len() >= self.selected_tracks.len() {
            return Err(AppError::InvalidInput(format!(
                "job already has {} results for {} selected tracks",
                self.results.len(),
                self.selected_tracks.len()
            )));
        }
        if self.results.iter().any(|r| r.track.id == result.track.id) {
            return Err(AppError::InvalidInput(format!(
                "track {} already has a result",
                result.track.id
            )));
        }

        self.results.push(result);
        Ok(())
    }

    pub fn successes(&self) -> impl Iterator<Item = &MigrationResult> {
        self.results.iter().filter(|r| r.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &MigrationResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    pub fn is_complete(&self) -> bool {
        self.results.len() == self.selected_tracks.len()
    }

    /// Processing ended before every selected track got a result.
    pub fn was_interrupted(&self) -> bool {
        self.cancelled || self.credential_expired.is_some()
    }
}
