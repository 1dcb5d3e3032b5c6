//! In-memory platform for pipeline tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::error::{AppError, Result};
use crate::platform::{
    AppendOutcome, MusicPlatform, PageCursor, PlatformKind, PlaylistDescriptor, SearchHit, Track,
    TrackPage,
};

pub(crate) struct FakePlatform {
    kind: PlatformKind,
    playlist: Vec<Track>,
    catalog: HashMap<String, SearchHit>,
    failing_searches: HashSet<String>,
    rejected: HashSet<String>,
    duplicates: HashSet<String>,
    create_failure: Option<fn() -> AppError>,
    credential_expired: bool,
    calls: Mutex<Vec<String>>,
}

impl FakePlatform {
    pub fn new(kind: PlatformKind) -> Self {
        Self {
            kind,
            playlist: Vec::new(),
            catalog: HashMap::new(),
            failing_searches: HashSet::new(),
            rejected: HashSet::new(),
            duplicates: HashSet::new(),
            create_failure: None,
            credential_expired: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A playlist of `count` generated tracks.
    pub fn with_generated_playlist(mut self, count: usize) -> Self {
        self.playlist = (0..count)
            .map(|i| Track::new(format!("track-{}", i), format!("Song {}", i), "Artist"))
            .collect();
        self
    }

    /// Search for `query` returns a hit with `id`.
    pub fn with_hit(mut self, query: &str, id: &str, title: &str, artist: &str) -> Self {
        self.catalog.insert(
            query.to_string(),
            SearchHit {
                id: id.to_string(),
                title: title.to_string(),
                artist: artist.to_string(),
                url: None,
            },
        );
        self
    }

    pub fn with_failing_search(mut self, query: &str) -> Self {
        self.failing_searches.insert(query.to_string());
        self
    }

    pub fn with_rejected_track(mut self, id: &str) -> Self {
        self.rejected.insert(id.to_string());
        self
    }

    pub fn with_duplicate_track(mut self, id: &str) -> Self {
        self.duplicates.insert(id.to_string());
        self
    }

    pub fn with_create_failure(mut self, failure: fn() -> AppError) -> Self {
        self.create_failure = Some(failure);
        self
    }

    pub fn with_expired_credential(mut self) -> Self {
        self.credential_expired = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn offset_of(&self, cursor: Option<PageCursor>) -> Result<usize> {
        match (self.kind, cursor) {
            (_, None) => Ok(0),
            (PlatformKind::Spotify, Some(PageCursor::Offset(offset))) => Ok(offset as usize),
            (PlatformKind::YouTube, Some(PageCursor::Token(token))) => token
                .strip_prefix("page-")
                .and_then(|raw| raw.parse().ok())
                .ok_or_else(|| AppError::InvalidInput(format!("bad token {}", token))),
            (_, Some(other)) => Err(AppError::InvalidInput(format!("wrong cursor {:?}", other))),
        }
    }

    fn cursor_at(&self, offset: usize) -> PageCursor {
        match self.kind {
            PlatformKind::Spotify => PageCursor::Offset(offset as u32),
            PlatformKind::YouTube => PageCursor::Token(format!("page-{}", offset)),
        }
    }
}

#[async_trait]
impl MusicPlatform for FakePlatform {
    fn kind(&self) -> PlatformKind {
        self.kind
    }

    async fn list_playlists(&self) -> Result<Vec<PlaylistDescriptor>> {
        Ok(vec![PlaylistDescriptor {
            id: "fake-playlist".to_string(),
            display_name: "Fake".to_string(),
            item_count: self.playlist.len() as u32,
        }])
    }

    async fn fetch_tracks(
        &self,
        playlist_id: &str,
        cursor: Option<PageCursor>,
        page_size: u32,
    ) -> Result<TrackPage> {
        self.record(format!("fetch:{}", playlist_id));
        if self.credential_expired {
            return Err(AppError::CredentialExpired(self.kind));
        }

        let start = self.offset_of(cursor)?;
        let end = (start + page_size as usize).min(self.playlist.len());
        let tracks = self.playlist.get(start..end).unwrap_or_default().to_vec();
        let next_cursor = (end < self.playlist.len()).then(|| self.cursor_at(end));

        Ok(TrackPage { tracks, next_cursor })
    }

    async fn search_match(&self, query: &str) -> Result<Option<SearchHit>> {
        self.record(format!("search:{}", query));
        if self.failing_searches.contains(query) {
            return Err(AppError::RateLimited(self.kind));
        }
        Ok(self.catalog.get(query).cloned())
    }

    async fn create_playlist(&self, name: &str, _description: &str) -> Result<String> {
        self.record(format!("create:{}", name));
        match self.create_failure {
            Some(failure) => Err(failure()),
            None => Ok("created-playlist".to_string()),
        }
    }

    async fn append_track(&self, playlist_id: &str, track_id: &str) -> Result<AppendOutcome> {
        self.record(format!("append:{}:{}", playlist_id, track_id));
        if self.rejected.contains(track_id) {
            return Err(AppError::Api {
                platform: self.kind,
                status: 403,
                message: "forbidden".to_string(),
            });
        }
        if self.duplicates.contains(track_id) {
            return Ok(AppendOutcome::AlreadyPresent);
        }
        Ok(AppendOutcome::Added)
    }

    fn native_id(&self, url: &str) -> Option<String> {
        url.strip_prefix("fake://").map(str::to_string)
    }

    fn track_url(&self, id: &str) -> String {
        format!("fake://{}", id)
    }
}
