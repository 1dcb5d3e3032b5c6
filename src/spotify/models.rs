use rspotify::model::{FullTrack, SimplifiedPlaylist};
use rspotify::prelude::*;
use url::Url;

use crate::error::{AppError, Result};
use crate::platform::{PlaylistDescriptor, SearchHit, Track};

const SPOTIFY_ID_LEN: usize = 22;

pub fn track_url(id: &str) -> String {
    format!("https://open.spotify.com/track/{}", id)
}

/// Parse a Spotify track link and extract the track ID.
/// Supports formats:
/// - https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC
/// - https://open.spotify.com/intl-de/track/4uLU6hMCjMI75M1A2tKUQC?si=...
/// - spotify:track:4uLU6hMCjMI75M1A2tKUQC
pub fn parse_track_id(url_str: &str) -> Option<String> {
    parse_spotify_id(url_str, "track")
}

/// Same formats as [`parse_track_id`], for `/playlist/` links.
pub fn parse_playlist_id(url_str: &str) -> Result<String> {
    parse_spotify_id(url_str, "playlist").ok_or_else(|| {
        AppError::InvalidInput(format!(
            "URL does not appear to be a Spotify playlist URL: {}",
            url_str
        ))
    })
}

fn parse_spotify_id(url_str: &str, kind: &str) -> Option<String> {
    let url_str = url_str.trim();

    let uri_prefix = format!("spotify:{}:", kind);
    let candidate = if let Some(id) = url_str.strip_prefix(&uri_prefix) {
        id.to_string()
    } else {
        let url = Url::parse(url_str).ok()?;
        if url.host_str()? != "open.spotify.com" {
            return None;
        }
        let segments: Vec<&str> = url.path_segments()?.collect();
        let pos = segments.iter().position(|s| *s == kind)?;
        segments.get(pos + 1)?.to_string()
    };

    is_spotify_id(&candidate).then_some(candidate)
}

fn is_spotify_id(id: &str) -> bool {
    id.len() == SPOTIFY_ID_LEN && id.chars().all(|c| c.is_ascii_alphanumeric())
}

fn join_artists(track: &FullTrack) -> String {
    track
        .artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Local files have no id and cannot be migrated.
pub(crate) fn to_track(track: &FullTrack) -> Option<Track> {
    let id = track.id.as_ref()?.id().to_string();
    let url = track
        .external_urls
        .get("spotify")
        .cloned()
        .unwrap_or_else(|| track_url(&id));

    Some(Track::new(id, track.name.clone(), join_artists(track)).with_source_url(url))
}

pub(crate) fn to_search_hit(track: &FullTrack) -> Option<SearchHit> {
    let id = track.id.as_ref()?.id().to_string();
    Some(SearchHit {
        url: Some(track_url(&id)),
        id,
        title: track.name.clone(),
        artist: join_artists(track),
    })
}

pub(crate) fn to_descriptor(playlist: &SimplifiedPlaylist) -> PlaylistDescriptor {
    PlaylistDescriptor {
        id: playlist.id.id().to_string(),
        display_name: playlist.name.clone(),
        item_count: playlist.tracks.total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_track_id_formats() {
        let expected = Some("4uLU6hMCjMI75M1A2tKUQC".to_string());
        assert_eq!(
            parse_track_id("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC"),
            expected
        );
        assert_eq!(
            parse_track_id("https://open.spotify.com/intl-de/track/4uLU6hMCjMI75M1A2tKUQC?si=abc"),
            expected
        );
        assert_eq!(parse_track_id("spotify:track:4uLU6hMCjMI75M1A2tKUQC"), expected);
    }

    #[test]
    fn test_parse_track_id_rejects_other_links() {
        assert_eq!(parse_track_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), None);
        assert_eq!(parse_track_id("https://open.spotify.com/album/4uLU6hMCjMI75M1A2tKUQC"), None);
        assert_eq!(parse_track_id("spotify:track:short"), None);
    }

    #[test]
    fn test_parse_playlist_id() {
        assert_eq!(
            parse_playlist_id("https://open.spotify.com/playlist/37i9dQZF1E8NC99vGqLsaH?si=x")
                .unwrap(),
            "37i9dQZF1E8NC99vGqLsaH"
        );
        assert!(parse_playlist_id("https://example.com/playlist/37i9dQZF1E8NC99vGqLsaH").is_err());
    }
}
