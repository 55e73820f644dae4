use crate::domain::model::{ExamTracks, Favorite};
use crate::utils::error::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn data_dir(&self) -> &str;
    fn score_sources(&self) -> &[String];
    fn delimiter(&self) -> u8;
    fn has_headers(&self) -> bool;
    fn exam_tracks(&self) -> &ExamTracks;
    fn favorites_path(&self) -> Option<&str>;
}

/// Whole-collection snapshots pushed by a remote favorites listener.
/// Every `Ok` item replaces the previous state entirely.
pub type SnapshotReceiver = mpsc::UnboundedReceiver<Result<Vec<Favorite>>>;

/// Per-user favorites collection held by a remote document store.
#[async_trait]
pub trait FavoritesRemote: Send + Sync {
    /// Upsert the document keyed by `favorite.program_code`.
    async fn put(&self, user_id: &str, favorite: Favorite) -> Result<()>;

    /// Delete by key; deleting a missing key succeeds.
    async fn delete(&self, user_id: &str, program_code: &str) -> Result<()>;

    /// Register a listener. The current snapshot is delivered first, then one
    /// snapshot per change. Dropping the receiver unregisters the listener.
    async fn listen(&self, user_id: &str) -> Result<SnapshotReceiver>;
}
