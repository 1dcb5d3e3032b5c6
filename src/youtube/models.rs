use serde::Deserialize;
use url::Url;

use crate::error::AppError;
use crate::platform::PlatformKind;

const ARTIST_TITLE_SEPARATORS: [&str; 3] = [" - ", " – ", " — "];
const TOPIC_SUFFIX: &str = " - Topic";
const VIDEO_ID_LEN: usize = 11;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlaylistItem {
    pub snippet: PlaylistItemSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlaylistItemSnippet {
    pub title: String,
    pub video_owner_channel_title: Option<String>,
    pub resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResourceId {
    pub video_id: Option<String>,
}

impl PlaylistItemSnippet {
    /// Deleted and private videos stay in playlists as placeholders without an owner.
    pub fn is_unavailable(&self) -> bool {
        self.video_owner_channel_title.is_none()
            && matches!(self.title.as_str(), "Deleted video" | "Private video")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Playlist {
    pub id: String,
    pub snippet: PlaylistSnippet,
    pub content_details: Option<PlaylistContentDetails>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlaylistSnippet {
    pub title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlaylistContentDetails {
    pub item_count: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResult {
    pub id: SearchResultId,
    pub snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchResultId {
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchSnippet {
    pub title: String,
    pub channel_title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedResource {
    pub id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}

/// A non-2xx YouTube response, classified from its status and error reasons.
#[derive(Debug)]
pub(crate) enum ApiFailure {
    /// The video is already in the playlist.
    Duplicate,
    Failed(AppError),
}

impl From<reqwest::Error> for ApiFailure {
    fn from(err: reqwest::Error) -> Self {
        ApiFailure::Failed(AppError::Http(err))
    }
}

impl From<AppError> for ApiFailure {
    fn from(err: AppError) -> Self {
        ApiFailure::Failed(err)
    }
}

impl From<ApiFailure> for AppError {
    fn from(failure: ApiFailure) -> Self {
        match failure {
            ApiFailure::Duplicate => AppError::Api {
                platform: PlatformKind::YouTube,
                status: 409,
                message: "video already in playlist".to_string(),
            },
            ApiFailure::Failed(err) => err,
        }
    }
}

pub(crate) fn classify_error(status: u16, body: &str) -> ApiFailure {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let reasons: Vec<String> = parsed
        .as_ref()
        .map(|envelope| {
            envelope
                .error
                .errors
                .iter()
                .filter_map(|detail| detail.reason.clone())
                .collect()
        })
        .unwrap_or_default();
    let has_reason = |wanted: &[&str]| reasons.iter().any(|r| wanted.contains(&r.as_str()));

    if reasons
        .iter()
        .any(|r| r == "videoAlreadyInPlaylist" || r.to_lowercase().contains("duplicate"))
    {
        return ApiFailure::Duplicate;
    }
    if status == 401 {
        return ApiFailure::Failed(AppError::CredentialExpired(PlatformKind::YouTube));
    }
    if has_reason(&["youtubeSignupRequired", "channelNotFound"]) {
        return ApiFailure::Failed(AppError::NoPublishingChannel);
    }
    if status == 429
        || has_reason(&["rateLimitExceeded", "quotaExceeded", "userRateLimitExceeded"])
    {
        return ApiFailure::Failed(AppError::RateLimited(PlatformKind::YouTube));
    }

    let message = parsed
        .and_then(|envelope| envelope.error.message)
        .unwrap_or_else(|| body.trim().to_string());
    ApiFailure::Failed(AppError::Api {
        platform: PlatformKind::YouTube,
        status,
        message,
    })
}

/// Split a video title into `(artist, title)`.
///
/// Titles of the form `"Artist - Title"` are split on the first separator. Otherwise the
/// whole string is the title and the channel name stands in for the artist.
pub fn split_artist_title(raw: &str, channel: Option<&str>) -> (String, String) {
    let raw = raw.trim();

    let split = ARTIST_TITLE_SEPARATORS
        .iter()
        .filter_map(|sep| raw.find(sep).map(|pos| (pos, sep.len())))
        .min_by_key(|(pos, _)| *pos);

    if let Some((pos, sep_len)) = split {
        let artist = raw[..pos].trim();
        let title = raw[pos + sep_len..].trim();
        if !artist.is_empty() && !title.is_empty() {
            return (artist.to_string(), title.to_string());
        }
    }

    let artist = channel
        .map(|c| c.trim().trim_end_matches(TOPIC_SUFFIX).trim().to_string())
        .unwrap_or_default();
    (artist, raw.to_string())
}

/// Search snippets come back HTML-escaped.
pub(crate) fn unescape_html(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Extract the video id from a YouTube link.
/// Supports formats:
/// - https://www.youtube.com/watch?v=dQw4w9WgXcQ
/// - https://music.youtube.com/watch?v=dQw4w9WgXcQ&list=...
/// - https://youtu.be/dQw4w9WgXcQ
/// - https://www.youtube.com/shorts/dQw4w9WgXcQ
pub fn parse_video_id(url_str: &str) -> Option<String> {
    let url = Url::parse(url_str.trim()).ok()?;
    let host = url.host_str()?.trim_start_matches("www.");

    let candidate = if host == "youtu.be" {
        url.path_segments()?.next().map(str::to_string)
    } else if host == "youtube.com" || host.ends_with(".youtube.com") {
        let from_query = url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned());
        from_query.or_else(|| {
            let segments: Vec<&str> = url.path_segments()?.collect();
            match segments.as_slice() {
                ["shorts", id, ..] | ["embed", id, ..] | ["live", id, ..] => Some(id.to_string()),
                _ => None,
            }
        })
    } else {
        None
    }?;

    is_video_id(&candidate).then_some(candidate)
}

fn is_video_id(id: &str) -> bool {
    id.len() == VIDEO_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

#[cfg(test)]
pub(crate) fn error_body(code: u16, message: &str, reason: &str) -> String {
    serde_json::json!({
        "error": { "code": code, "message": message, "errors": [{ "reason": reason }] }
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_artist_title_with_hyphen() {
        let (artist, title) = split_artist_title(
            "Queen - Bohemian Rhapsody (Official Video)",
            Some("Queen Official"),
        );
        assert_eq!(artist, "Queen");
        assert_eq!(title, "Bohemian Rhapsody (Official Video)");
    }

    #[test]
    fn test_split_artist_title_uses_first_separator() {
        let (artist, title) = split_artist_title("AC/DC – Back In Black - Live", None);
        assert_eq!(artist, "AC/DC");
        assert_eq!(title, "Back In Black - Live");
    }

    #[test]
    fn test_split_artist_title_falls_back_to_channel() {
        let (artist, title) = split_artist_title("Imagine", Some("John Lennon - Topic"));
        assert_eq!(artist, "John Lennon");
        assert_eq!(title, "Imagine");
    }

    #[test]
    fn test_split_artist_title_ignores_unspaced_hyphen() {
        let (artist, title) = split_artist_title("Re-Wind", Some("Artful Dodger"));
        assert_eq!(artist, "Artful Dodger");
        assert_eq!(title, "Re-Wind");
    }

    #[test]
    fn test_split_artist_title_without_channel() {
        let (artist, title) = split_artist_title("Untitled", None);
        assert_eq!(artist, "");
        assert_eq!(title, "Untitled");
    }

    #[test]
    fn test_parse_video_id_formats() {
        let expected = Some("dQw4w9WgXcQ".to_string());
        assert_eq!(parse_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), expected);
        assert_eq!(
            parse_video_id("https://music.youtube.com/watch?v=dQw4w9WgXcQ&list=PL1"),
            expected
        );
        assert_eq!(parse_video_id("https://youtu.be/dQw4w9WgXcQ?t=10"), expected);
        assert_eq!(parse_video_id("https://youtube.com/shorts/dQw4w9WgXcQ"), expected);
    }

    #[test]
    fn test_parse_video_id_rejects_other_links() {
        assert_eq!(parse_video_id("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC"), None);
        assert_eq!(parse_video_id("https://www.youtube.com/watch?v=short"), None);
        assert_eq!(parse_video_id("not a url"), None);
    }

    #[test]
    fn test_classify_duplicate_reason() {
        let body = error_body(409, "Conflict", "videoAlreadyInPlaylist");
        assert!(matches!(classify_error(409, &body), ApiFailure::Duplicate));
    }

    #[test]
    fn test_classify_missing_channel() {
        let body = error_body(401, "Unauthorized", "youtubeSignupRequired");
        // 401 with a signup reason is still an auth problem first.
        assert!(matches!(
            classify_error(401, &body),
            ApiFailure::Failed(AppError::CredentialExpired(PlatformKind::YouTube))
        ));

        let body = error_body(403, "Forbidden", "youtubeSignupRequired");
        assert!(matches!(
            classify_error(403, &body),
            ApiFailure::Failed(AppError::NoPublishingChannel)
        ));
    }

    #[test]
    fn test_classify_quota_and_generic() {
        let body = error_body(403, "quota", "quotaExceeded");
        assert!(matches!(
            classify_error(403, &body),
            ApiFailure::Failed(AppError::RateLimited(PlatformKind::YouTube))
        ));

        match classify_error(500, "upstream exploded") {
            ApiFailure::Failed(AppError::Api { status, message, .. }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unescape_html() {
        assert_eq!(unescape_html("Guns N&#39; Roses &amp; Friends"), "Guns N' Roses & Friends");
    }

    #[test]
    fn test_unavailable_placeholder() {
        let snippet = PlaylistItemSnippet {
            title: "Deleted video".to_string(),
            video_owner_channel_title: None,
            resource_id: ResourceId {
                video_id: Some("dQw4w9WgXcQ".to_string()),
            },
        };
        assert!(snippet.is_unavailable());
    }
}
