use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    Spotify,
    YouTube,
}

impl PlatformKind {
    /// The platform a migration from `self` writes to.
    pub fn other(self) -> Self {
        match self {
            PlatformKind::Spotify => PlatformKind::YouTube,
            PlatformKind::YouTube => PlatformKind::Spotify,
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformKind::Spotify => write!(f, "Spotify"),
            PlatformKind::YouTube => write!(f, "YouTube"),
        }
    }
}

impl FromStr for PlatformKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "spotify" => Ok(PlatformKind::Spotify),
            "youtube" | "yt" => Ok(PlatformKind::YouTube),
            other => Err(AppError::InvalidInput(format!("unknown platform: {}", other))),
        }
    }
}

/// A song or video, normalized across platforms.
///
/// `id` is native to the platform the track was fetched from. `target_url` is a
/// cross-link to the other platform when one is already known.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub source_url: Option<String>,
    pub target_url: Option<String>,
}

impl Track {
    pub fn new(id: impl Into<String>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            source_url: None,
            target_url: None,
        }
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn with_target_url(mut self, url: impl Into<String>) -> Self {
        self.target_url = Some(url.into());
        self
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.artist.is_empty() {
            write!(f, "{}", self.title)
        } else {
            write!(f, "{} - {}", self.artist, self.title)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistDescriptor {
    pub id: String,
    pub display_name: String,
    /// As reported by the platform. Not authoritative.
    pub item_count: u32,
}

/// Continuation marker for a paginated listing.
///
/// Spotify pages by numeric offset, YouTube by an opaque token. The two are not
/// interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageCursor {
    Offset(u32),
    Token(String),
}

#[derive(Debug, Clone, Default)]
pub struct TrackPage {
    pub tracks: Vec<Track>,
    /// `None` means the playlist is exhausted.
    pub next_cursor: Option<PageCursor>,
}

/// Top-ranked search result on a platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Added,
    /// The platform reported the item as already in the playlist.
    AlreadyPresent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_other_is_involution() {
        assert_eq!(PlatformKind::Spotify.other(), PlatformKind::YouTube);
        assert_eq!(PlatformKind::YouTube.other().other(), PlatformKind::YouTube);
    }

    #[test]
    fn test_platform_from_str() {
        assert_eq!("Spotify".parse::<PlatformKind>().unwrap(), PlatformKind::Spotify);
        assert_eq!(" yt ".parse::<PlatformKind>().unwrap(), PlatformKind::YouTube);
        assert!("deezer".parse::<PlatformKind>().is_err());
    }

    #[test]
    fn test_track_display() {
        let track = Track::new("1", "Imagine", "John Lennon");
        assert_eq!(track.to_string(), "John Lennon - Imagine");
        assert_eq!(Track::new("2", "Untitled", "").to_string(), "Untitled");
    }
}
