use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use crate::error::CreationError;
use crate::migrator::job::MigrationJob;
use crate::migrator::report::MigrationResult;
use crate::migrator::resolver::{NOT_FOUND_MESSAGE, TrackResolver};
use crate::migrator::writer::{AppendStatus, PlaylistWriter};
use crate::platform::{MusicPlatform, PlatformKind, Platforms, Track};

/// Share of the progress bar reserved for creating the target playlist.
pub const CREATION_SHARE: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct MigrationProgress {
    pub percent: f64,
    pub processed: usize,
    pub total: usize,
    pub current: Option<String>,
}

/// Progress callback for migration operations.
pub type ProgressCallback = Box<dyn Fn(MigrationProgress) + Send + Sync>;

/// `processed / total` scaled into the space after the creation share.
pub fn progress_percent(processed: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    let fraction = processed.min(total) as f64 / total as f64;
    CREATION_SHARE + (100.0 - CREATION_SHARE) * fraction
}

/// Shared flag checked between tracks. In-flight requests are allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What happened to one track.
enum TrackOutcome {
    Recorded(MigrationResult),
    /// The target credential is gone. Nothing is recorded and the job stops.
    CredentialExpired(PlatformKind),
}

pub struct MigrationOrchestrator {
    source: PlatformKind,
    target: Arc<dyn MusicPlatform>,
    resolver: TrackResolver,
    writer: PlaylistWriter,
    progress: Option<ProgressCallback>,
    cancel: CancelFlag,
}

impl MigrationOrchestrator {
    /// Picks the source/target clients once for the whole job.
    pub fn new(platforms: &Platforms, source: PlatformKind) -> Self {
        let (source, target) = platforms.pair(source);
        Self::from_pair(source, target)
    }

    pub fn from_pair(source: Arc<dyn MusicPlatform>, target: Arc<dyn MusicPlatform>) -> Self {
        Self {
            source: source.kind(),
            resolver: TrackResolver::new(Arc::clone(&source), Arc::clone(&target)),
            writer: PlaylistWriter::new(Arc::clone(&target)),
            target,
            progress: None,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    fn report(&self, percent: f64, processed: usize, total: usize, current: Option<&Track>) {
        if let Some(callback) = &self.progress {
            callback(MigrationProgress {
                percent,
                processed,
                total,
                current: current.map(|t| t.to_string()),
            });
        }
    }

    fn check_platforms(&self, job: &MigrationJob) -> Result<(), CreationError> {
        if job.source_platform != self.source || job.target_platform != self.writer.platform() {
            return Err(CreationError::Api(format!(
                "job migrates {} -> {} but orchestrator was built for {} -> {}",
                job.source_platform,
                job.target_platform,
                self.source,
                self.writer.platform()
            )));
        }
        Ok(())
    }

    /// Create the target playlist, then resolve and insert each selected track in order.
    ///
    /// Only playlist creation is fatal: on failure no track is touched and the job has no
    /// results. Per-track failures are recorded and processing continues. Losing the
    /// target credential midway stops processing and sets `job.credential_expired`;
    /// the tracks already handled keep their results.
    pub async fn execute(&self, job: &mut MigrationJob) -> Result<(), CreationError> {
        self.check_platforms(job)?;
        let total = job.selected_tracks().len();

        info!(
            "Migrating {} tracks from {} playlist \"{}\" to new {} playlist \"{}\"",
            total,
            job.source_platform,
            job.source_playlist.display_name,
            job.target_platform,
            job.target_playlist_name
        );
        self.report(0.0, 0, total, None);

        let description = format!(
            "Migrated from {} playlist \"{}\"",
            job.source_platform, job.source_playlist.display_name
        );
        let playlist_id = self
            .writer
            .create_playlist(&job.target_playlist_name, &description)
            .await?;
        job.target_playlist_id = Some(playlist_id.clone());
        self.report(CREATION_SHARE, 0, total, None);

        let tracks = job.selected_tracks().to_vec();
        for (i, track) in tracks.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!("Migration cancelled after {} of {} tracks", i, total);
                job.cancelled = true;
                break;
            }

            match self.migrate_track(&playlist_id, track).await {
                TrackOutcome::Recorded(result) => self.record(job, track, result),
                TrackOutcome::CredentialExpired(platform) => {
                    warn!(
                        "Stopping after {} of {} tracks: {} credential expired",
                        i, total, platform
                    );
                    job.credential_expired = Some(platform);
                    break;
                }
            }
            self.report(progress_percent(i + 1, total), i + 1, total, Some(track));
        }
        if total == 0 {
            self.report(progress_percent(0, 0), 0, 0, None);
        }

        info!(
            "Migration finished: {}/{} tracks migrated to {} playlist \"{}\"",
            job.successes().count(),
            total,
            job.target_platform,
            job.target_playlist_name
        );

        Ok(())
    }

    fn record(&self, job: &mut MigrationJob, track: &Track, result: MigrationResult) {
        if let Err(e) = job.record(result) {
            warn!("Dropping result for {}: {}", track, e);
        }
    }

    async fn migrate_track(&self, playlist_id: &str, track: &Track) -> TrackOutcome {
        let resolution = self.resolver.resolve(track).await;
        if let Some(platform) = resolution.expired_credential {
            return TrackOutcome::CredentialExpired(platform);
        }

        let Some(target_id) = resolution.target_id else {
            let message = resolution
                .message
                .unwrap_or_else(|| NOT_FOUND_MESSAGE.to_string());
            debug!("Not migrating {}: {}", track, message);
            return TrackOutcome::Recorded(MigrationResult::error(track.clone(), message));
        };

        let linked = track
            .clone()
            .with_target_url(self.target.track_url(&target_id));

        let result = match self.writer.append_track(playlist_id, &target_id).await {
            AppendStatus::Added => MigrationResult::success(linked, resolution.message),
            AppendStatus::AlreadyPresent => {
                MigrationResult::success(linked, Some("already in playlist".to_string()))
            }
            AppendStatus::CredentialExpired(platform) => {
                return TrackOutcome::CredentialExpired(platform);
            }
            AppendStatus::Failed(reason) => MigrationResult::error(linked, reason),
        };
        TrackOutcome::Recorded(result)
    }

    /// Resolve every selected track without creating or modifying anything.
    pub async fn dry_run(&self, job: &mut MigrationJob) -> Result<(), CreationError> {
        self.check_platforms(job)?;
        let total = job.selected_tracks().len();
        info!("Dry run: resolving {} tracks on {}", total, job.target_platform);

        let tracks = job.selected_tracks().to_vec();
        for (i, track) in tracks.iter().enumerate() {
            if self.cancel.is_cancelled() {
                job.cancelled = true;
                break;
            }

            let resolution = self.resolver.resolve(track).await;
            if let Some(platform) = resolution.expired_credential {
                job.credential_expired = Some(platform);
                break;
            }
            let result = match resolution.target_id {
                Some(target_id) => MigrationResult::success(
                    track
                        .clone()
                        .with_target_url(self.target.track_url(&target_id)),
                    resolution.message,
                ),
                None => MigrationResult::error(
                    track.clone(),
                    resolution
                        .message
                        .unwrap_or_else(|| NOT_FOUND_MESSAGE.to_string()),
                ),
            };
            self.record(job, track, result);
            self.report(progress_percent(i + 1, total), i + 1, total, Some(track));
        }
        if total == 0 {
            self.report(progress_percent(0, 0), 0, 0, None);
        }

        Ok(())
    }
}
