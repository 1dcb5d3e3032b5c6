use chrono::{DateTime, Local};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::migrator::job::MigrationJob;
use crate::platform::{PlatformKind, Track};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MigrationStatus {
    Success,
    Error,
}

/// Outcome for one attempted track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResult {
    pub track: Track,
    pub status: MigrationStatus,
    pub message: Option<String>,
}

impl MigrationResult {
    pub fn success(track: Track, message: Option<String>) -> Self {
        Self {
            track,
            status: MigrationStatus::Success,
            message,
        }
    }

    pub fn error(track: Track, message: impl Into<String>) -> Self {
        Self {
            track,
            status: MigrationStatus::Error,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == MigrationStatus::Success
    }
}

/// Serializable summary of one finished job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationReport {
    pub source_platform: PlatformKind,
    pub target_platform: PlatformKind,
    pub source_playlist: String,
    pub target_playlist_name: String,
    pub target_playlist_id: Option<String>,
    pub total_tracks: usize,
    pub successful: usize,
    pub failed: usize,
    pub success_rate: f64,
    pub cancelled: bool,
    #[serde(default)]
    pub credential_expired: Option<PlatformKind>,
    pub dry_run: bool,
    pub finished_at: DateTime<Local>,
    pub results: Vec<MigrationResult>,
}

impl MigrationReport {
    pub fn from_job(job: &MigrationJob, dry_run: bool) -> Self {
        let successful = job.successes().count();
        let failed = job.failures().count();
        let attempted = successful + failed;

        let success_rate = if attempted > 0 {
            (successful as f64 / attempted as f64) * 100.0
        } else {
            0.0
        };

        Self {
            source_platform: job.source_platform,
            target_platform: job.target_platform,
            source_playlist: job.source_playlist.display_name.clone(),
            target_playlist_name: job.target_playlist_name.clone(),
            target_playlist_id: job.target_playlist_id.clone(),
            total_tracks: job.selected_tracks().len(),
            successful,
            failed,
            success_rate,
            cancelled: job.cancelled,
            credential_expired: job.credential_expired,
            dry_run,
            finished_at: Local::now(),
            results: job.results().to_vec(),
        }
    }

    /// Write the report as pretty JSON under `results_dir` and return the file path.
    pub fn save(&self, results_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(results_dir)?;

        let timestamp = self.finished_at.format("%Y%m%d_%H%M%S");
        let filename = results_dir.join(format!("migration_{}.json", timestamp));
        let json = serde_json::to_string_pretty(self)?;

        fs::write(&filename, json)?;

        info!("Migration results saved to: {}", filename.display());

        Ok(filename)
    }

    pub fn print_summary(&self) {
        println!();
        println!("{}", "=".repeat(60));
        println!("{}", "MIGRATION SUMMARY".bold());
        println!("{}", "=".repeat(60));
        println!(
            "{} \"{}\" -> {} \"{}\"",
            self.source_platform,
            self.source_playlist,
            self.target_platform,
            self.target_playlist_name
        );
        println!("Tracks selected: {}", self.total_tracks);
        println!("Migrated: {}", self.successful.to_string().green());
        println!("Failed: {}", self.failed.to_string().red());

        let rate = format!("{:.1}%", self.success_rate);
        let rate = if self.success_rate >= 90.0 {
            rate.green()
        } else if self.success_rate >= 70.0 {
            rate.yellow()
        } else {
            rate.red()
        };
        println!("Success rate: {}", rate);
        if self.cancelled {
            println!(
                "{}",
                "Migration was cancelled before all tracks were processed".yellow()
            );
        }
        if let Some(platform) = self.credential_expired {
            println!(
                "{}",
                format!(
                    "Stopped early: the {} credential expired. Reconnect the account and \
                     migrate the remaining tracks again.",
                    platform
                )
                .red()
            );
        }
        println!("{}", "=".repeat(60));

        let (successes, failures): (Vec<_>, Vec<_>) =
            self.results.iter().partition(|r| r.is_success());

        if !successes.is_empty() {
            println!("\n{}", "Migrated:".green());
            for result in successes {
                match &result.message {
                    Some(note) => println!("  {} ({})", result.track, note.yellow()),
                    None => println!("  {}", result.track),
                }
            }
        }

        if !failures.is_empty() {
            println!("\n{}", "Failed:".red());
            for result in failures {
                println!(
                    "  {}: {}",
                    result.track,
                    result.message.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlaylistDescriptor;

    fn finished_job() -> MigrationJob {
        let tracks = vec![
            Track::new("1", "Bohemian Rhapsody", "Queen"),
            Track::new("2", "Unknown Obscure Track", "Nobody"),
            Track::new("3", "Imagine", "John Lennon"),
        ];
        let playlist = PlaylistDescriptor {
            id: "roadtrip".to_string(),
            display_name: "Roadtrip".to_string(),
            item_count: 3,
        };
        let mut job = MigrationJob::new(
            PlatformKind::Spotify,
            playlist,
            tracks.clone(),
            "Roadtrip (YT)",
        );
        job.target_playlist_id = Some("PL123".to_string());
        job.record(MigrationResult::success(tracks[0].clone(), None)).unwrap();
        job.record(MigrationResult::error(tracks[1].clone(), "not found on target platform"))
            .unwrap();
        job.record(MigrationResult::success(tracks[2].clone(), None)).unwrap();
        job
    }

    #[test]
    fn test_report_counts() {
        let report = MigrationReport::from_job(&finished_job(), false);

        assert_eq!(report.total_tracks, 3);
        assert_eq!(report.successful, 2);
        assert_eq!(report.failed, 1);
        assert!((report.success_rate - 66.666).abs() < 0.01);
        assert_eq!(report.target_platform, PlatformKind::YouTube);
    }

    #[test]
    fn test_report_saved_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let report = MigrationReport::from_job(&finished_job(), false);

        let path = report.save(dir.path()).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let parsed: MigrationReport = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.results.len(), 3);
        assert_eq!(parsed.results[1].status, MigrationStatus::Error);
        assert_eq!(parsed.target_playlist_id.as_deref(), Some("PL123"));
    }

    #[test]
    fn test_empty_report_has_zero_rate() {
        let playlist = PlaylistDescriptor {
            id: "empty".to_string(),
            display_name: "Empty".to_string(),
            item_count: 0,
        };
        let job = MigrationJob::new(PlatformKind::YouTube, playlist, Vec::new(), "Empty (Spotify)");

        let report = MigrationReport::from_job(&job, true);
        assert_eq!(report.success_rate, 0.0);
        assert!(report.dry_run);
        assert!(report.credential_expired.is_none());
    }
}
