use std::collections::HashSet;
use std::fmt;
use std::mem;

use crate::error::{AppError, CreationError, Result};
use crate::migrator::job::MigrationJob;
use crate::migrator::orchestrator::MigrationOrchestrator;
use crate::platform::{PlatformKind, PlaylistDescriptor, Track};

/// Where a migration session currently is. Each variant owns exactly the data the next
/// step needs, so going back never has to refetch anything.
#[derive(Debug, Clone)]
pub enum MigrationState {
    SelectingSourcePlatform,
    SelectingSourcePlaylist {
        source: PlatformKind,
    },
    PreviewingTracks {
        source: PlatformKind,
        playlist: PlaylistDescriptor,
        tracks: Vec<Track>,
    },
    ConfiguringTarget {
        source: PlatformKind,
        playlist: PlaylistDescriptor,
        tracks: Vec<Track>,
        selected: Vec<Track>,
        target_name: String,
        /// Set when the last attempt to create the target playlist failed.
        error: Option<CreationError>,
    },
    Processing {
        job: MigrationJob,
        tracks: Vec<Track>,
    },
    Results {
        job: MigrationJob,
    },
}

impl MigrationState {
    pub fn name(&self) -> &'static str {
        match self {
            MigrationState::SelectingSourcePlatform => "selecting source platform",
            MigrationState::SelectingSourcePlaylist { .. } => "selecting source playlist",
            MigrationState::PreviewingTracks { .. } => "previewing tracks",
            MigrationState::ConfiguringTarget { .. } => "configuring target",
            MigrationState::Processing { .. } => "processing",
            MigrationState::Results { .. } => "showing results",
        }
    }
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub enum FlowEvent {
    SelectPlatform(PlatformKind),
    /// The chosen playlist together with its fetched tracks.
    SelectPlaylist {
        playlist: PlaylistDescriptor,
        tracks: Vec<Track>,
    },
    ConfirmTracks(Vec<Track>),
    Rename(String),
    Start,
    Finished,
    Failed(CreationError),
    Back,
    Close,
}

impl FlowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            FlowEvent::SelectPlatform(_) => "select a platform",
            FlowEvent::SelectPlaylist { .. } => "select a playlist",
            FlowEvent::ConfirmTracks(_) => "confirm tracks",
            FlowEvent::Rename(_) => "rename the target playlist",
            FlowEvent::Start => "start the migration",
            FlowEvent::Finished => "finish the migration",
            FlowEvent::Failed(_) => "fail the migration",
            FlowEvent::Back => "go back",
            FlowEvent::Close => "close",
        }
    }
}

/// Default name for the playlist created on `target`.
pub fn default_target_name(playlist_name: &str, target: PlatformKind) -> String {
    match target {
        PlatformKind::YouTube => format!("{} (YT)", playlist_name),
        PlatformKind::Spotify => format!("{} (Spotify)", playlist_name),
    }
}

type Transition = std::result::Result<MigrationState, (MigrationState, AppError)>;

fn invalid(state: MigrationState, event: &FlowEvent) -> Transition {
    let err = AppError::InvalidTransition {
        state: state.name().to_string(),
        event: event.name().to_string(),
    };
    Err((state, err))
}

/// Session driver for one migration at a time.
///
/// `Processing` can only be left through `Finished` (to `Results`) or `Failed` (back to
/// `ConfiguringTarget` with the creation error attached, so the user can retry or go back).
/// `Results` only allows `Close`.
#[derive(Debug)]
pub struct MigrationFlow {
    state: MigrationState,
}

impl Default for MigrationFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationFlow {
    pub fn new() -> Self {
        Self {
            state: MigrationState::SelectingSourcePlatform,
        }
    }

    pub fn state(&self) -> &MigrationState {
        &self.state
    }

    /// The job being processed or already finished.
    pub fn job(&self) -> Option<&MigrationJob> {
        match &self.state {
            MigrationState::Processing { job, .. } | MigrationState::Results { job } => Some(job),
            _ => None,
        }
    }

    /// Apply `event`. On error the state is left untouched.
    pub fn apply(&mut self, event: FlowEvent) -> Result<()> {
        let state = mem::replace(&mut self.state, MigrationState::SelectingSourcePlatform);
        match Self::transition(state, event) {
            Ok(next) => {
                self.state = next;
                Ok(())
            }
            Err((state, err)) => {
                self.state = state;
                Err(err)
            }
        }
    }

    fn transition(state: MigrationState, event: FlowEvent) -> Transition {
        use FlowEvent as E;
        use MigrationState as S;

        match (state, event) {
            (S::Processing { job, tracks }, E::Close) => {
                invalid(S::Processing { job, tracks }, &E::Close)
            }
            (_, E::Close) => Ok(S::SelectingSourcePlatform),

            (S::SelectingSourcePlatform, E::SelectPlatform(source)) => {
                Ok(S::SelectingSourcePlaylist { source })
            }
            (S::SelectingSourcePlatform, E::Back) => Ok(S::SelectingSourcePlatform),

            (S::SelectingSourcePlaylist { source }, E::SelectPlaylist { playlist, tracks }) => {
                Ok(S::PreviewingTracks {
                    source,
                    playlist,
                    tracks,
                })
            }
            (S::SelectingSourcePlaylist { .. }, E::Back) => Ok(S::SelectingSourcePlatform),

            (
                S::PreviewingTracks {
                    source,
                    playlist,
                    tracks,
                },
                E::ConfirmTracks(selected),
            ) => {
                let known: HashSet<&str> = tracks.iter().map(|t| t.id.as_str()).collect();
                let problem = if selected.is_empty() {
                    Some("select at least one track".to_string())
                } else {
                    selected
                        .iter()
                        .find(|t| !known.contains(t.id.as_str()))
                        .map(|t| format!("track {} is not in playlist {}", t.id, playlist.id))
                };
                if let Some(problem) = problem {
                    let state = S::PreviewingTracks {
                        source,
                        playlist,
                        tracks,
                    };
                    return Err((state, AppError::InvalidInput(problem)));
                }

                let target_name = default_target_name(&playlist.display_name, source.other());
                Ok(S::ConfiguringTarget {
                    source,
                    playlist,
                    tracks,
                    selected,
                    target_name,
                    error: None,
                })
            }
            (S::PreviewingTracks { source, .. }, E::Back) => {
                Ok(S::SelectingSourcePlaylist { source })
            }

            (
                S::ConfiguringTarget {
                    source,
                    playlist,
                    tracks,
                    selected,
                    ..
                },
                E::Rename(name),
            ) => Ok(S::ConfiguringTarget {
                source,
                playlist,
                tracks,
                selected,
                target_name: name.trim().to_string(),
                error: None,
            }),
            (
                S::ConfiguringTarget {
                    source,
                    playlist,
                    tracks,
                    selected,
                    target_name,
                    error,
                },
                E::Start,
            ) => {
                if target_name.is_empty() {
                    let state = S::ConfiguringTarget {
                        source,
                        playlist,
                        tracks,
                        selected,
                        target_name,
                        error,
                    };
                    return Err((
                        state,
                        AppError::InvalidInput("target playlist name is empty".to_string()),
                    ));
                }

                let job = MigrationJob::new(source, playlist, selected, target_name);
                Ok(S::Processing { job, tracks })
            }
            (
                S::ConfiguringTarget {
                    source,
                    playlist,
                    tracks,
                    ..
                },
                E::Back,
            ) => Ok(S::PreviewingTracks {
                source,
                playlist,
                tracks,
            }),

            (S::Processing { job, .. }, E::Finished) => Ok(S::Results { job }),
            (S::Processing { job, tracks }, E::Failed(error)) => Ok(S::ConfiguringTarget {
                source: job.source_platform,
                selected: job.selected_tracks().to_vec(),
                target_name: job.target_playlist_name,
                playlist: job.source_playlist,
                tracks,
                error: Some(error),
            }),

            (state, event) => invalid(state, &event),
        }
    }

    /// Run the job held by `Processing` and move to `Results`, or back to
    /// `ConfiguringTarget` if the target playlist could not be created.
    pub async fn run(&mut self, orchestrator: &MigrationOrchestrator, dry_run: bool) -> Result<()> {
        let current = self.state.name();
        let MigrationState::Processing { job, .. } = &mut self.state else {
            return Err(AppError::InvalidTransition {
                state: current.to_string(),
                event: "run the migration".to_string(),
            });
        };

        let outcome = if dry_run {
            orchestrator.dry_run(job).await
        } else {
            orchestrator.execute(job).await
        };

        match outcome {
            Ok(()) => self.apply(FlowEvent::Finished),
            Err(e) => self.apply(FlowEvent::Failed(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::FakePlatform;
    use std::sync::Arc;

    fn roadtrip() -> (PlaylistDescriptor, Vec<Track>) {
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
        (playlist, tracks)
    }

    fn configured_flow() -> MigrationFlow {
        let (playlist, tracks) = roadtrip();
        let mut flow = MigrationFlow::new();
        flow.apply(FlowEvent::SelectPlatform(PlatformKind::Spotify)).unwrap();
        flow.apply(FlowEvent::SelectPlaylist {
            playlist,
            tracks: tracks.clone(),
        })
        .unwrap();
        flow.apply(FlowEvent::ConfirmTracks(tracks)).unwrap();
        flow
    }

    #[test]
    fn test_forward_path_sets_default_name() {
        let flow = configured_flow();

        match flow.state() {
            MigrationState::ConfiguringTarget {
                target_name,
                selected,
                error,
                ..
            } => {
                assert_eq!(target_name, "Roadtrip (YT)");
                assert_eq!(selected.len(), 3);
                assert!(error.is_none());
            }
            other => panic!("unexpected state {}", other),
        }
    }

    #[test]
    fn test_back_walks_to_first_state() {
        let mut flow = configured_flow();

        flow.apply(FlowEvent::Back).unwrap();
        assert!(matches!(flow.state(), MigrationState::PreviewingTracks { .. }));
        flow.apply(FlowEvent::Back).unwrap();
        assert!(matches!(
            flow.state(),
            MigrationState::SelectingSourcePlaylist {
                source: PlatformKind::Spotify
            }
        ));
        flow.apply(FlowEvent::Back).unwrap();
        flow.apply(FlowEvent::Back).unwrap();
        assert!(matches!(flow.state(), MigrationState::SelectingSourcePlatform));
    }

    #[test]
    fn test_processing_cannot_go_back_or_close() {
        let mut flow = configured_flow();
        flow.apply(FlowEvent::Start).unwrap();

        assert!(matches!(
            flow.apply(FlowEvent::Back),
            Err(AppError::InvalidTransition { .. })
        ));
        assert!(flow.apply(FlowEvent::Close).is_err());
        assert!(matches!(flow.state(), MigrationState::Processing { .. }));
    }

    #[test]
    fn test_results_only_closes() {
        let mut flow = configured_flow();
        flow.apply(FlowEvent::Start).unwrap();
        flow.apply(FlowEvent::Finished).unwrap();

        assert!(flow.apply(FlowEvent::Back).is_err());
        assert!(flow.apply(FlowEvent::Start).is_err());
        assert!(flow.job().is_some());

        flow.apply(FlowEvent::Close).unwrap();
        assert!(matches!(flow.state(), MigrationState::SelectingSourcePlatform));
    }

    #[test]
    fn test_failed_creation_returns_to_configuring() {
        let mut flow = configured_flow();
        flow.apply(FlowEvent::Rename("Trip".to_string())).unwrap();
        flow.apply(FlowEvent::Start).unwrap();
        flow.apply(FlowEvent::Failed(CreationError::MissingChannel)).unwrap();

        match flow.state() {
            MigrationState::ConfiguringTarget {
                target_name,
                selected,
                error,
                ..
            } => {
                assert_eq!(target_name, "Trip");
                assert_eq!(selected.len(), 3);
                assert_eq!(error, &Some(CreationError::MissingChannel));
            }
            other => panic!("unexpected state {}", other),
        }

        flow.apply(FlowEvent::Start).unwrap();
        assert!(matches!(flow.state(), MigrationState::Processing { .. }));
    }

    #[test]
    fn test_invalid_selection_keeps_state() {
        let (playlist, tracks) = roadtrip();
        let mut flow = MigrationFlow::new();
        flow.apply(FlowEvent::SelectPlatform(PlatformKind::YouTube)).unwrap();
        flow.apply(FlowEvent::SelectPlaylist { playlist, tracks }).unwrap();

        assert!(flow.apply(FlowEvent::ConfirmTracks(Vec::new())).is_err());
        assert!(flow
            .apply(FlowEvent::ConfirmTracks(vec![Track::new("9", "X", "Y")]))
            .is_err());
        assert!(matches!(flow.state(), MigrationState::PreviewingTracks { .. }));
    }

    #[test]
    fn test_empty_name_cannot_start() {
        let mut flow = configured_flow();
        flow.apply(FlowEvent::Rename("   ".to_string())).unwrap();

        assert!(flow.apply(FlowEvent::Start).is_err());
        assert!(matches!(flow.state(), MigrationState::ConfiguringTarget { .. }));
    }

    #[test]
    fn test_out_of_order_event_is_rejected() {
        let mut flow = MigrationFlow::new();
        let err = flow.apply(FlowEvent::Start).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Invalid transition: cannot start the migration while selecting source platform"
        );
    }

    #[test]
    fn test_default_target_names() {
        assert_eq!(default_target_name("Mix", PlatformKind::YouTube), "Mix (YT)");
        assert_eq!(default_target_name("Mix", PlatformKind::Spotify), "Mix (Spotify)");
    }

    #[tokio::test]
    async fn test_run_reaches_results() {
        let target = FakePlatform::new(PlatformKind::YouTube)
            .with_hit("Queen Bohemian Rhapsody", "fJ9rUzIMcZQ", "Bohemian Rhapsody", "Queen")
            .with_hit("John Lennon Imagine", "YkgkThdzX-8", "Imagine", "John Lennon");
        let orchestrator = MigrationOrchestrator::from_pair(
            Arc::new(FakePlatform::new(PlatformKind::Spotify)),
            Arc::new(target),
        );
        let mut flow = configured_flow();
        flow.apply(FlowEvent::Start).unwrap();

        flow.run(&orchestrator, false).await.unwrap();

        assert!(matches!(flow.state(), MigrationState::Results { .. }));
        let job = flow.job().unwrap();
        assert_eq!(job.results().len(), 3);
        assert_eq!(job.successes().count(), 2);
    }

    #[tokio::test]
    async fn test_run_with_creation_failure_is_recoverable() {
        let target = FakePlatform::new(PlatformKind::YouTube)
            .with_create_failure(|| AppError::NoPublishingChannel);
        let orchestrator = MigrationOrchestrator::from_pair(
            Arc::new(FakePlatform::new(PlatformKind::Spotify)),
            Arc::new(target),
        );
        let mut flow = configured_flow();
        flow.apply(FlowEvent::Start).unwrap();

        flow.run(&orchestrator, false).await.unwrap();

        assert!(matches!(
            flow.state(),
            MigrationState::ConfiguringTarget {
                error: Some(CreationError::MissingChannel),
                ..
            }
        ));
    }
}
