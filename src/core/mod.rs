pub mod favorites;
pub mod import;
pub mod observable;
pub mod query;
pub mod session;
pub mod store;

pub use crate::domain::model::{ExamTracks, Favorite, ScoreRecord, Session};
pub use crate::domain::ports::{ConfigProvider, FavoritesRemote, SnapshotReceiver, Storage};
pub use crate::utils::error::Result;
