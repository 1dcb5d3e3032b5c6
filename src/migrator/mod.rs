pub mod fetcher;
pub mod job;
pub mod orchestrator;
pub mod report;
pub mod resolver;
pub mod state;
pub mod writer;

pub use fetcher::{FetchOutcome, fetch_all, fetch_page};
pub use job::MigrationJob;
pub use orchestrator::{CancelFlag, MigrationOrchestrator, MigrationProgress, ProgressCallback};
pub use report::{MigrationReport, MigrationResult, MigrationStatus};
pub use resolver::{Resolution, TrackResolver};
pub use state::{FlowEvent, MigrationFlow, MigrationState};
pub use writer::{AppendStatus, PlaylistWriter};
