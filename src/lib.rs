pub mod api;
pub mod auth;
pub mod config;
pub mod enrich;
pub mod error;
pub mod event;
pub mod extract;
pub mod load;
pub mod logging;
pub mod pipeline;
pub mod snapshot;
pub mod store;
pub mod table;
pub mod token;
pub mod token_persistence;
pub mod r#trait;

pub use api::SpotifyApiClient;
pub use auth::SpotifyAuth;
pub use enrich::{Enrichment, GenreEnricher};
pub use error::SyncError;
pub use event::{ArtistGenres, PlayEvent};
pub use extract::{Extraction, HistoryExtractor, StopReason};
pub use load::{LoadOutcome, SnapshotLoader};
pub use pipeline::{run_extraction, ExtractionReport};
pub use r#trait::SpotifyApi;
pub use snapshot::{DirectorySnapshotStore, SnapshotInfo, SnapshotStore};
pub use store::{MemoryTableStore, MySqlTableStore, TableStore};
pub use table::TableData;
pub use token::SpotifyToken;
pub use token_persistence::TokenPersistence;

#[cfg(feature = "mock")]
pub use r#trait::MockSpotifyApi;

pub type Result<T> = std::result::Result<T, SyncError>;
