use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::platform::{MusicPlatform, PageCursor, Track, TrackPage};

pub use crate::config::DEFAULT_PAGE_SIZE;

/// Result of fetching one page. An expired credential is reported separately from an
/// exhausted playlist so callers never mistake it for the end of the listing.
#[derive(Debug)]
pub enum FetchOutcome {
    Page(TrackPage),
    AuthRequired,
}

pub async fn fetch_page(
    platform: &dyn MusicPlatform,
    playlist_id: &str,
    cursor: Option<PageCursor>,
    page_size: u32,
) -> Result<FetchOutcome> {
    match platform.fetch_tracks(playlist_id, cursor, page_size).await {
        Ok(page) => Ok(FetchOutcome::Page(page)),
        Err(AppError::CredentialExpired(kind)) => {
            warn!("{} credential expired while fetching {}", kind, playlist_id);
            Ok(FetchOutcome::AuthRequired)
        }
        Err(e) => Err(e),
    }
}

/// Fetch a whole playlist, threading each returned cursor into the next call.
pub async fn fetch_all(
    platform: &dyn MusicPlatform,
    playlist_id: &str,
    page_size: u32,
) -> Result<Vec<Track>> {
    let mut tracks = Vec::new();
    let mut cursor: Option<PageCursor> = None;

    loop {
        let page = match fetch_page(platform, playlist_id, cursor.clone(), page_size).await? {
            FetchOutcome::Page(page) => page,
            FetchOutcome::AuthRequired => return Err(AppError::CredentialExpired(platform.kind())),
        };

        debug!(
            "Fetched {} tracks from {} playlist {}",
            page.tracks.len(),
            platform.kind(),
            playlist_id
        );
        tracks.extend(page.tracks);

        match page.next_cursor {
            None => break,
            Some(next) if cursor.as_ref() == Some(&next) => {
                return Err(AppError::InvalidInput(format!(
                    "{} pagination did not advance past {:?}",
                    platform.kind(),
                    next
                )));
            }
            Some(next) => cursor = Some(next),
        }
    }

    info!("Fetched {} tracks from playlist {}", tracks.len(), playlist_id);
    Ok(tracks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformKind;
    use crate::platform::fake::FakePlatform;
    use std::collections::HashSet;

    async fn assert_exact_pagination(kind: PlatformKind, count: usize, page_size: u32) {
        let platform = FakePlatform::new(kind).with_generated_playlist(count);

        let tracks = fetch_all(&platform, "list", page_size).await.unwrap();

        assert_eq!(tracks.len(), count, "{} tracks, page size {}", count, page_size);
        let unique: HashSet<_> = tracks.iter().map(|t| t.id.clone()).collect();
        assert_eq!(unique.len(), count);
        for (i, track) in tracks.iter().enumerate() {
            assert_eq!(track.id, format!("track-{}", i));
        }

        let expected_calls = count.max(1).div_ceil(page_size as usize);
        assert_eq!(platform.calls().len(), expected_calls);
    }

    #[tokio::test]
    async fn test_offset_pagination_yields_every_track_once() {
        for count in [0, 1, 49, 50, 51, 120] {
            for page_size in [1, 7, 50] {
                assert_exact_pagination(PlatformKind::Spotify, count, page_size).await;
            }
        }
    }

    #[tokio::test]
    async fn test_token_pagination_yields_every_track_once() {
        for count in [0, 1, 49, 50, 51, 120] {
            for page_size in [1, 7, 50] {
                assert_exact_pagination(PlatformKind::YouTube, count, page_size).await;
            }
        }
    }

    #[tokio::test]
    async fn test_last_page_has_no_cursor() {
        let platform = FakePlatform::new(PlatformKind::Spotify).with_generated_playlist(3);

        let outcome = fetch_page(&platform, "list", None, 50).await.unwrap();
        match outcome {
            FetchOutcome::Page(page) => {
                assert_eq!(page.tracks.len(), 3);
                assert!(page.next_cursor.is_none());
            }
            FetchOutcome::AuthRequired => panic!("unexpected auth failure"),
        }
    }

    #[tokio::test]
    async fn test_expired_credential_is_not_end_of_playlist() {
        let platform = FakePlatform::new(PlatformKind::YouTube)
            .with_generated_playlist(10)
            .with_expired_credential();

        let outcome = fetch_page(&platform, "list", None, 50).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::AuthRequired));

        let result = fetch_all(&platform, "list", 50).await;
        assert!(matches!(
            result,
            Err(AppError::CredentialExpired(PlatformKind::YouTube))
        ));
    }

    #[tokio::test]
    async fn test_wrong_cursor_kind_is_rejected() {
        let platform = FakePlatform::new(PlatformKind::Spotify).with_generated_playlist(10);

        let result = fetch_page(&platform, "list", Some(PageCursor::Token("x".into())), 5).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }
}
