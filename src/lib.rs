pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::AppConfig;

pub use crate::adapters::{LocalFavoritesStore, LocalStorage};
pub use crate::core::{
    favorites::{FavoritesLedger, FavoritesView, PendingWrite},
    import::{join_import, CsvOptions, ScoreImporter},
    query::{QueryEngine, ScoreQuery},
    session::SessionGate,
    store::{LoadState, ScoreStore},
};
pub use crate::domain::model::{ExamTracks, Favorite, ScoreRecord, Session};
pub use crate::utils::error::{Result, UnimatchError};
