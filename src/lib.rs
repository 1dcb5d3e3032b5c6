pub mod auth;
pub mod config;
pub mod error;
pub mod matcher;
pub mod migrator;
pub mod platform;
pub mod spotify;
pub mod youtube;

pub use auth::{CredentialProvider, RefreshingCredentials, StaticCredentials};
pub use config::Config;
pub use error::{AppError, CreationError, Result};
pub use migrator::{MigrationFlow, MigrationOrchestrator, MigrationReport};
pub use platform::{MusicPlatform, PlatformKind, Platforms, PlaylistDescriptor, Track};
pub use spotify::SpotifyClient;
pub use youtube::YouTubeClient;
