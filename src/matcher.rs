use strsim::jaro_winkler;

use crate::platform::{SearchHit, Track};

/// Top hits scoring below this are still accepted, only flagged.
const LOW_CONFIDENCE_THRESHOLD: f64 = 0.65;

/// Search query for a track: `"<artist> <title>"`.
pub fn build_query(track: &Track) -> String {
    format!("{} {}", track.artist.trim(), track.title.trim())
        .trim()
        .to_string()
}

/// Similarity between a source track and a search hit.
/// Uses weighted scoring: 60% title + 40% artist.
///
/// Video titles often embed the artist ("Queen - Bohemian Rhapsody"), so the title score
/// is the better of a direct comparison and a comparison against the combined string.
pub fn similarity(track: &Track, hit: &SearchHit) -> f64 {
    let source_title = track.title.to_lowercase();
    let hit_title = hit.title.to_lowercase();
    let combined = format!("{} - {}", track.artist, track.title).to_lowercase();

    let title_score =
        jaro_winkler(&source_title, &hit_title).max(jaro_winkler(&combined, &hit_title));

    let artist_score = if track.artist.is_empty() || hit.artist.is_empty() {
        0.0
    } else {
        jaro_winkler(&track.artist.to_lowercase(), &hit.artist.to_lowercase())
    };

    title_score * 0.6 + artist_score * 0.4
}

pub fn is_low_confidence(score: f64) -> bool {
    score < LOW_CONFIDENCE_THRESHOLD
}
