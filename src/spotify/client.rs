use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use rspotify::{
    AuthCodeSpotify, ClientError, Token,
    http::HttpError,
    model::{PlayableId, PlayableItem, PlaylistId, SearchResult, SearchType, TrackId},
    prelude::*,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::auth::CredentialProvider;
use crate::error::{AppError, Result};
use crate::platform::{
    AppendOutcome, MusicPlatform, PageCursor, PlatformKind, PlaylistDescriptor, SearchHit,
    TrackPage,
};
use crate::spotify::models::{parse_track_id, to_descriptor, to_search_hit, to_track, track_url};

const PLAYLIST_PAGE_LIMIT: u32 = 50;
/// Spotify caps playlist item pages at 100.
const MAX_ITEMS_PER_PAGE: u32 = 100;

pub struct SpotifyClient {
    credentials: Arc<dyn CredentialProvider>,
}

impl SpotifyClient {
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self { credentials }
    }

    /// A client carrying the current bearer token. Built per call so refreshed tokens
    /// from the credential provider are always used.
    async fn client(&self) -> Result<AuthCodeSpotify> {
        let access_token = self.credentials.access_token(PlatformKind::Spotify).await?;
        let lifetime = TimeDelta::seconds(3600);

        Ok(AuthCodeSpotify::from_token(Token {
            access_token,
            expires_in: lifetime,
            expires_at: Some(Utc::now() + lifetime),
            ..Default::default()
        }))
    }
}

/// Map rspotify failures onto the crate's taxonomy by HTTP status.
fn classify(err: ClientError) -> AppError {
    let status = match &err {
        ClientError::Http(http) => match http.as_ref() {
            HttpError::StatusCode(response) => Some(response.status().as_u16()),
            _ => None,
        },
        _ => None,
    };

    match status {
        Some(401) => AppError::CredentialExpired(PlatformKind::Spotify),
        Some(429) => AppError::RateLimited(PlatformKind::Spotify),
        Some(status) => AppError::Api {
            platform: PlatformKind::Spotify,
            status,
            message: err.to_string(),
        },
        None => AppError::SpotifyApi(err),
    }
}

#[async_trait]
impl MusicPlatform for SpotifyClient {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Spotify
    }

    async fn list_playlists(&self) -> Result<Vec<PlaylistDescriptor>> {
        let client = self.client().await?;
        let user_id = client.current_user().await.map_err(classify)?.id;

        let mut playlists = Vec::new();
        let mut offset = 0;

        loop {
            let page = client
                .current_user_playlists_manual(Some(PLAYLIST_PAGE_LIMIT), Some(offset))
                .await
                .map_err(classify)?;

            // Only playlists owned by the current user can be migrated into or out of.
            playlists.extend(
                page.items
                    .iter()
                    .filter(|p| p.owner.id == user_id)
                    .map(to_descriptor),
            );

            if page.next.is_none() {
                break;
            }
            offset += PLAYLIST_PAGE_LIMIT;
        }

        info!("Found {} Spotify playlists", playlists.len());
        Ok(playlists)
    }

    async fn fetch_tracks(
        &self,
        playlist_id: &str,
        cursor: Option<PageCursor>,
        page_size: u32,
    ) -> Result<TrackPage> {
        let offset = match cursor {
            None => 0,
            Some(PageCursor::Offset(offset)) => offset,
            Some(PageCursor::Token(_)) => {
                return Err(AppError::InvalidInput(
                    "Spotify pages by offset, got a page token".into(),
                ));
            }
        };
        let limit = page_size.clamp(1, MAX_ITEMS_PER_PAGE);

        let id = PlaylistId::from_id(playlist_id)
            .map_err(|e| AppError::InvalidInput(format!("Invalid playlist ID: {}", e)))?;

        let client = self.client().await?;
        let page = client
            .playlist_items_manual(id, None, None, Some(limit), Some(offset))
            .await
            .map_err(classify)?;

        let mut tracks = Vec::with_capacity(page.items.len());
        for item in &page.items {
            match &item.track {
                Some(PlayableItem::Track(track)) => match to_track(track) {
                    Some(t) => tracks.push(t),
                    None => debug!("Skipping local track: {}", track.name),
                },
                Some(_) => debug!("Skipping non-track playlist item"),
                None => debug!("Skipping unavailable playlist item"),
            }
        }

        let next_cursor = page.next.as_ref().map(|_| PageCursor::Offset(offset + limit));

        Ok(TrackPage { tracks, next_cursor })
    }

    async fn search_match(&self, query: &str) -> Result<Option<SearchHit>> {
        let client = self.client().await?;
        let result = client
            .search(query, SearchType::Track, None, None, Some(1), None)
            .await
            .map_err(classify)?;

        match result {
            SearchResult::Tracks(page) => Ok(page.items.iter().find_map(to_search_hit)),
            _ => Ok(None),
        }
    }

    async fn create_playlist(&self, name: &str, description: &str) -> Result<String> {
        let client = self.client().await?;
        let user_id = client.current_user().await.map_err(classify)?.id;

        let playlist = client
            .user_playlist_create(user_id, name, Some(false), Some(false), Some(description))
            .await
            .map_err(classify)?;

        info!("Created Spotify playlist: {}", name);
        Ok(playlist.id.id().to_string())
    }

    async fn append_track(&self, playlist_id: &str, track_id: &str) -> Result<AppendOutcome> {
        let playlist = PlaylistId::from_id(playlist_id)
            .map_err(|e| AppError::InvalidInput(format!("Invalid playlist ID: {}", e)))?;
        let track = TrackId::from_id(track_id)
            .map_err(|e| AppError::InvalidInput(format!("Invalid track ID: {}", e)))?;

        let client = self.client().await?;
        client
            .playlist_add_items(playlist, vec![PlayableId::Track(track)], None)
            .await
            .map_err(classify)?;

        // Spotify keeps duplicate items rather than rejecting them.
        Ok(AppendOutcome::Added)
    }

    fn native_id(&self, url: &str) -> Option<String> {
        parse_track_id(url)
    }

    fn track_url(&self, id: &str) -> String {
        track_url(id)
    }
}
