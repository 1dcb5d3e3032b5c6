#[cfg(test)]
pub(crate) mod fake;
pub mod models;

pub use models::{
    AppendOutcome, PageCursor, PlatformKind, PlaylistDescriptor, SearchHit, Track, TrackPage,
};

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;

/// Capabilities the migration pipeline needs from a music platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MusicPlatform: Send + Sync {
    fn kind(&self) -> PlatformKind;

    /// Playlists owned by the authenticated user.
    async fn list_playlists(&self) -> Result<Vec<PlaylistDescriptor>>;

    /// Fetch one page of a playlist. `cursor` is `None` on the first call.
    async fn fetch_tracks(
        &self,
        playlist_id: &str,
        cursor: Option<PageCursor>,
        page_size: u32,
    ) -> Result<TrackPage>;

    /// Text search against the catalog, returning only the top-ranked result.
    async fn search_match(&self, query: &str) -> Result<Option<SearchHit>>;

    /// Create a private playlist and return its id.
    async fn create_playlist(&self, name: &str, description: &str) -> Result<String>;

    async fn append_track(&self, playlist_id: &str, track_id: &str) -> Result<AppendOutcome>;

    /// Extract this platform's native track id from one of its links.
    fn native_id(&self, url: &str) -> Option<String>;

    fn track_url(&self, id: &str) -> String;
}

/// One client per platform. The source/target pair is chosen once per job.
#[derive(Clone)]
pub struct Platforms {
    pub spotify: Arc<dyn MusicPlatform>,
    pub youtube: Arc<dyn MusicPlatform>,
}

impl Platforms {
    pub fn new(spotify: Arc<dyn MusicPlatform>, youtube: Arc<dyn MusicPlatform>) -> Self {
        Self { spotify, youtube }
    }

    pub fn get(&self, kind: PlatformKind) -> Arc<dyn MusicPlatform> {
        match kind {
            PlatformKind::Spotify => Arc::clone(&self.spotify),
            PlatformKind::YouTube => Arc::clone(&self.youtube),
        }
    }

    /// Returns `(source, target)` for a migration out of `source`.
    pub fn pair(&self, source: PlatformKind) -> (Arc<dyn MusicPlatform>, Arc<dyn MusicPlatform>) {
        (self.get(source), self.get(source.other()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock(kind: PlatformKind) -> Arc<dyn MusicPlatform> {
        let mut platform = MockMusicPlatform::new();
        platform.expect_kind().return_const(kind);
        Arc::new(platform)
    }

    #[test]
    fn test_pair_selects_opposite_target() {
        let platforms = Platforms::new(mock(PlatformKind::Spotify), mock(PlatformKind::YouTube));

        let (source, target) = platforms.pair(PlatformKind::YouTube);
        assert_eq!(source.kind(), PlatformKind::YouTube);
        assert_eq!(target.kind(), PlatformKind::Spotify);
    }
}
