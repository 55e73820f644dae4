use crate::core::{Favorite, FavoritesRemote, SnapshotReceiver};
use crate::utils::error::{Result, UnimatchError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, Mutex};

const FILE_VERSION: u32 = 1;

/// On-disk layout: one favorites list per user.
#[derive(Debug, Default, Serialize, Deserialize)]
struct FavoritesFile {
    version: u32,
    users: BTreeMap<String, Vec<Favorite>>,
}

type Listener = mpsc::UnboundedSender<Result<Vec<Favorite>>>;
type Users = BTreeMap<String, BTreeMap<String, Favorite>>;

#[derive(Default)]
struct Collections {
    users: Users,
    listeners: HashMap<String, Vec<Listener>>,
}

impl Collections {
    fn snapshot(&self, user_id: &str) -> Vec<Favorite> {
        self.users
            .get(user_id)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default()
    }

    /// 推送完整快照給該使用者的所有監聽者，並移除已關閉者
    fn notify(&mut self, user_id: &str) {
        let snapshot = self.snapshot(user_id);
        if let Some(listeners) = self.listeners.get_mut(user_id) {
            listeners.retain(|tx| tx.send(Ok(snapshot.clone())).is_ok());
            if listeners.is_empty() {
                self.listeners.remove(user_id);
            }
        }
    }

}

fn to_file(users: &Users) -> FavoritesFile {
    FavoritesFile {
        version: FILE_VERSION,
        users: users
            .iter()
            .map(|(user, docs)| (user.clone(), docs.values().cloned().collect()))
            .collect(),
    }
}

/// In-process favorites collection with push snapshots, optionally persisted
/// to a JSON file. Stands in for a hosted document store.
pub struct LocalFavoritesStore {
    path: Option<PathBuf>,
    collections: Mutex<Collections>,
}

impl LocalFavoritesStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            collections: Mutex::new(Collections::default()),
        }
    }

    /// Load favorites from `path`; a missing file starts empty.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<FavoritesFile>(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FavoritesFile::default(),
            Err(e) => return Err(e.into()),
        };

        if file.version != FILE_VERSION && !file.users.is_empty() {
            return Err(UnimatchError::ConfigError {
                message: format!(
                    "Unsupported favorites file version {} in {}",
                    file.version,
                    path.display()
                ),
            });
        }

        let users = file
            .users
            .into_iter()
            .map(|(user, favorites)| {
                let docs = favorites
                    .into_iter()
                    .map(|f| (f.program_code.clone(), f))
                    .collect();
                (user, docs)
            })
            .collect();

        tracing::debug!("Opened favorites store at {}", path.display());
        Ok(Self {
            path: Some(path),
            collections: Mutex::new(Collections {
                users,
                listeners: HashMap::new(),
            }),
        })
    }

    pub async fn favorites_of(&self, user_id: &str) -> Vec<Favorite> {
        self.collections.lock().await.snapshot(user_id)
    }

    /// Write through a temporary file so a crash never leaves half a file.
    async fn persist(&self, users: &Users) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec_pretty(&to_file(users))?;
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, json).await?;
        tokio::fs::rename(&tmp_path, path).await?;
        Ok(())
    }
}

#[async_trait]
impl FavoritesRemote for LocalFavoritesStore {
    async fn put(&self, user_id: &str, favorite: Favorite) -> Result<()> {
        let mut collections = self.collections.lock().await;
        // 先寫入副本，持久化成功後才套用
        let mut users = collections.users.clone();
        users
            .entry(user_id.to_string())
            .or_default()
            .insert(favorite.program_code.clone(), favorite);
        self.persist(&users).await?;

        collections.users = users;
        collections.notify(user_id);
        Ok(())
    }

    async fn delete(&self, user_id: &str, program_code: &str) -> Result<()> {
        let mut collections = self.collections.lock().await;
        let mut users = collections.users.clone();
        let removed = users
            .get_mut(user_id)
            .and_then(|docs| docs.remove(program_code))
            .is_some();

        if removed {
            if users.get(user_id).is_some_and(BTreeMap::is_empty) {
                users.remove(user_id);
            }
            self.persist(&users).await?;

            collections.users = users;
            collections.notify(user_id);
        }
        Ok(())
    }

    async fn listen(&self, user_id: &str) -> Result<SnapshotReceiver> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut collections = self.collections.lock().await;

        // 首次註冊即送出目前狀態
        let _ = tx.send(Ok(collections.snapshot(user_id)));
        let listeners = collections.listeners.entry(user_id.to_string()).or_default();
        listeners.retain(|listener| !listener.is_closed());
        listeners.push(tx);
        Ok(rx)
    }
}
