use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::auth::CredentialProvider;
use crate::error::{AppError, Result};
use crate::platform::{
    AppendOutcome, MusicPlatform, PageCursor, PlatformKind, PlaylistDescriptor, SearchHit, Track,
    TrackPage,
};
use crate::youtube::models::{
    ApiFailure, CreatedResource, ListResponse, Playlist, PlaylistItem, SearchResult,
    classify_error, parse_video_id, split_artist_title, unescape_html, watch_url,
};

const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const MAX_RESULTS: u32 = 50;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct YouTubeClient {
    http_client: Client,
    credentials: Arc<dyn CredentialProvider>,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        let http_client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_http_client(http_client, credentials))
    }

    pub fn with_http_client(http_client: Client, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            http_client,
            credentials,
            base_url: YOUTUBE_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> std::result::Result<T, ApiFailure> {
        let token = self.credentials.access_token(PlatformKind::YouTube).await?;
        let response = request.bearer_auth(token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            debug!("YouTube request failed ({}): {}", status, error_text);
            return Err(classify_error(status.as_u16(), &error_text));
        }

        Ok(response.json().await?)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http_client.get(format!("{}/{}", self.base_url, path))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http_client.post(format!("{}/{}", self.base_url, path))
    }
}

#[async_trait]
impl MusicPlatform for YouTubeClient {
    fn kind(&self) -> PlatformKind {
        PlatformKind::YouTube
    }

    async fn list_playlists(&self) -> Result<Vec<PlaylistDescriptor>> {
        let mut playlists = Vec::new();
        let mut page_token: Option<String> = None;

        let max_results = MAX_RESULTS.to_string();

        loop {
            let mut request = self.get("playlists").query(&[
                ("part", "snippet,contentDetails"),
                ("mine", "true"),
                ("maxResults", max_results.as_str()),
            ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let page: ListResponse<Playlist> = self.send(request).await?;
            playlists.extend(page.items.into_iter().map(|p| PlaylistDescriptor {
                id: p.id,
                display_name: p.snippet.title,
                item_count: p.content_details.map(|d| d.item_count).unwrap_or(0),
            }));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        info!("Found {} YouTube playlists", playlists.len());
        Ok(playlists)
    }

    async fn fetch_tracks(
        &self,
        playlist_id: &str,
        cursor: Option<PageCursor>,
        page_size: u32,
    ) -> Result<TrackPage> {
        let page_token = match cursor {
            None => None,
            Some(PageCursor::Token(token)) => Some(token),
            Some(PageCursor::Offset(offset)) => {
                return Err(AppError::InvalidInput(format!(
                    "YouTube pages by token, got offset {}",
                    offset
                )));
            }
        };

        let max_results = page_size.clamp(1, MAX_RESULTS).to_string();
        let mut request = self.get("playlistItems").query(&[
            ("part", "snippet"),
            ("playlistId", playlist_id),
            ("maxResults", max_results.as_str()),
        ]);
        if let Some(token) = &page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let page: ListResponse<PlaylistItem> = self.send(request).await?;

        let mut tracks = Vec::with_capacity(page.items.len());
        for item in page.items {
            let snippet = item.snippet;
            if snippet.is_unavailable() {
                debug!("Skipping unavailable video: {}", snippet.title);
                continue;
            }
            let Some(video_id) = snippet.resource_id.video_id else {
                debug!("Skipping playlist item without a video: {}", snippet.title);
                continue;
            };

            let (artist, title) =
                split_artist_title(&snippet.title, snippet.video_owner_channel_title.as_deref());
            tracks.push(
                Track::new(video_id.clone(), title, artist).with_source_url(watch_url(&video_id)),
            );
        }

        Ok(TrackPage {
            tracks,
            next_cursor: page.next_page_token.map(PageCursor::Token),
        })
    }

    async fn search_match(&self, query: &str) -> Result<Option<SearchHit>> {
        let request = self.get("search").query(&[
            ("part", "snippet"),
            ("type", "video"),
            ("maxResults", "1"),
            ("q", query),
        ]);

        let page: ListResponse<SearchResult> = self.send(request).await?;

        Ok(page.items.into_iter().find_map(|result| {
            let video_id = result.id.video_id?;
            Some(SearchHit {
                url: Some(watch_url(&video_id)),
                id: video_id,
                title: unescape_html(&result.snippet.title),
                artist: result
                    .snippet
                    .channel_title
                    .map(|c| unescape_html(&c))
                    .unwrap_or_default(),
            })
        }))
    }

    async fn create_playlist(&self, name: &str, description: &str) -> Result<String> {
        let body = json!({
            "snippet": { "title": name, "description": description },
            "status": { "privacyStatus": "private" },
        });
        let request = self
            .post("playlists")
            .query(&[("part", "snippet,status")])
            .json(&body);

        let created: CreatedResource = self.send(request).await?;

        info!("Created YouTube playlist: {}", name);
        Ok(created.id)
    }

    async fn append_track(&self, playlist_id: &str, track_id: &str) -> Result<AppendOutcome> {
        let body = json!({
            "snippet": {
                "playlistId": playlist_id,
                "resourceId": { "kind": "youtube#video", "videoId": track_id },
            }
        });
        let request = self
            .post("playlistItems")
            .query(&[("part", "snippet")])
            .json(&body);

        match self.send::<CreatedResource>(request).await {
            Ok(_) => Ok(AppendOutcome::Added),
            Err(ApiFailure::Duplicate) => {
                warn!("Video {} already in playlist {}", track_id, playlist_id);
                Ok(AppendOutcome::AlreadyPresent)
            }
            Err(ApiFailure::Failed(err)) => Err(err),
        }
    }

    fn native_id(&self, url: &str) -> Option<String> {
        parse_video_id(url)
    }

    fn track_url(&self, id: &str) -> String {
        watch_url(id)
    }
}
