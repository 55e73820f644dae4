use crate::core::observable::Observable;
use crate::core::session::SessionGate;
use crate::core::store::ScoreStore;
use crate::domain::model::{Favorite, ScoreRecord, Session};
use crate::domain::ports::{FavoritesRemote, SnapshotReceiver};
use crate::utils::error::{Result, UnimatchError};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

/// Confirmed favorite program codes as of the last remote snapshot.
///
/// `epoch` changes on every attach and clear; listener updates carrying an
/// older epoch are dropped. `synced` turns true with the first snapshot
/// received for the current epoch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FavoritesView {
    pub epoch: u64,
    pub user_id: Option<String>,
    pub synced: bool,
    pub ids: Arc<HashSet<String>>,
}

impl FavoritesView {
    pub fn contains(&self, program_code: &str) -> bool {
        self.ids.contains(program_code)
    }
}

enum LedgerState {
    Detached,
    Attached {
        user_id: String,
        listener: JoinHandle<()>,
    },
}

/// Handle to a remote favorite write started by [`FavoritesLedger::add`] or
/// [`FavoritesLedger::remove`]. Dropping it lets the write finish unobserved.
#[derive(Debug)]
pub struct PendingWrite {
    program_code: String,
    handle: JoinHandle<Result<()>>,
}

impl PendingWrite {
    fn spawn<F>(program_code: String, write: F) -> Self
    where
        F: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            program_code,
            handle: tokio::spawn(write),
        }
    }

    fn done(program_code: String) -> Self {
        Self::spawn(program_code, async { Ok(()) })
    }

    pub fn program_code(&self) -> &str {
        &self.program_code
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the remote acknowledgement.
    pub async fn wait(self) -> Result<()> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(UnimatchError::RemoteWriteFailure {
                program_code: self.program_code,
                message: format!("write task aborted: {}", e),
            }),
        }
    }
}

/// Favorites Ledger: the signed-in user's favorite programs, mirrored from a
/// remote per-user collection.
///
/// Local state is never updated optimistically. `is_favorite` and
/// `current_favorites` only reflect what the remote listener has confirmed.
pub struct FavoritesLedger<R: FavoritesRemote> {
    remote: Arc<R>,
    store: ScoreStore,
    view: Observable<FavoritesView>,
    state: Mutex<LedgerState>,
}

impl<R: FavoritesRemote + 'static> FavoritesLedger<R> {
    pub fn new(remote: Arc<R>, store: ScoreStore) -> Self {
        Self {
            remote,
            store,
            view: Observable::default(),
            state: Mutex::new(LedgerState::Detached),
        }
    }

    pub async fn is_attached(&self) -> bool {
        matches!(*self.state.lock().await, LedgerState::Attached { .. })
    }

    pub fn current_user(&self) -> Option<String> {
        self.view.get().user_id
    }

    pub fn subscribe(&self) -> watch::Receiver<FavoritesView> {
        self.view.subscribe()
    }

    /// Subscribe to `session`'s remote collection, replacing any previous
    /// subscription. Local favorites are emptied until the first snapshot.
    pub async fn attach(&self, session: &Session) -> Result<()> {
        let mut state = self.state.lock().await;
        Self::teardown(&mut state);

        let listening = self.remote.listen(&session.user_id).await;

        let epoch = self.view.get().epoch + 1;
        let snapshots = match listening {
            Ok(snapshots) => snapshots,
            Err(e) => {
                self.view.set(FavoritesView {
                    epoch,
                    ..FavoritesView::default()
                });
                return Err(UnimatchError::RemoteSubscriptionError {
                    user_id: session.user_id.clone(),
                    message: e.to_string(),
                });
            }
        };
        self.view.set(FavoritesView {
            epoch,
            user_id: Some(session.user_id.clone()),
            synced: false,
            ids: Arc::default(),
        });

        let listener = tokio::spawn(Self::apply_snapshots(
            self.view.clone(),
            epoch,
            session.user_id.clone(),
            snapshots,
        ));

        tracing::info!("Favorites attached for user {}", session.user_id);
        *state = LedgerState::Attached {
            user_id: session.user_id.clone(),
            listener,
        };
        Ok(())
    }

    /// Drop all local state and stop listening. Safe to call when detached.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        Self::teardown(&mut state);

        let epoch = self.view.get().epoch + 1;
        self.view.set(FavoritesView {
            epoch,
            user_id: None,
            synced: false,
            ids: Arc::default(),
        });
    }

    fn teardown(state: &mut LedgerState) {
        if let LedgerState::Attached { user_id, listener } =
            std::mem::replace(state, LedgerState::Detached)
        {
            listener.abort();
            tracing::info!("Favorites detached for user {}", user_id);
        }
    }

    async fn apply_snapshots(
        view: Observable<FavoritesView>,
        epoch: u64,
        user_id: String,
        mut snapshots: SnapshotReceiver,
    ) {
        while let Some(event) = snapshots.recv().await {
            match event {
                Ok(favorites) => {
                    let ids: HashSet<String> =
                        favorites.into_iter().map(|f| f.program_code).collect();
                    let count = ids.len();
                    let ids = Arc::new(ids);
                    let applied = view.update_if(|current| {
                        if current.epoch != epoch {
                            return false;
                        }
                        current.ids = ids;
                        current.synced = true;
                        true
                    });
                    if !applied {
                        tracing::debug!("Dropping stale favorites snapshot for {}", user_id);
                        return;
                    }
                    tracing::debug!("Favorites snapshot for {}: {} programs", user_id, count);
                }
                Err(e) => {
                    tracing::warn!("Error listening to favorites of {}: {}", user_id, e);
                }
            }
        }
        tracing::debug!("Favorites listener for {} closed", user_id);
    }

    async fn attached_user(&self) -> Result<String> {
        match &*self.state.lock().await {
            LedgerState::Attached { user_id, .. } => Ok(user_id.clone()),
            LedgerState::Detached => Err(UnimatchError::NoSession),
        }
    }

    /// Start persisting `record` as a favorite. Adding a confirmed favorite
    /// again does nothing and succeeds.
    pub async fn add(&self, record: &ScoreRecord) -> Result<PendingWrite> {
        let user_id = self.attached_user().await?;
        if self.is_favorite(record) {
            return Ok(PendingWrite::done(record.program_code.clone()));
        }

        let remote = Arc::clone(&self.remote);
        let favorite = Favorite::for_record(record, Utc::now());
        Ok(PendingWrite::spawn(record.program_code.clone(), async move {
            let program_code = favorite.program_code.clone();
            remote.put(&user_id, favorite).await.map_err(|e| {
                let error = UnimatchError::RemoteWriteFailure {
                    program_code,
                    message: e.to_string(),
                };
                tracing::warn!("Error adding to favorites: {}", error);
                error
            })
        }))
    }

    /// Start deleting `record` from the favorites. Removing a program that is
    /// not a favorite succeeds.
    pub async fn remove(&self, record: &ScoreRecord) -> Result<PendingWrite> {
        let user_id = self.attached_user().await?;

        let remote = Arc::clone(&self.remote);
        let program_code = record.program_code.clone();
        Ok(PendingWrite::spawn(program_code.clone(), async move {
            let deleted = remote.delete(&user_id, &program_code).await;
            deleted.map_err(|e| {
                let error = UnimatchError::RemoteWriteFailure {
                    program_code,
                    message: e.to_string(),
                };
                tracing::warn!("Error removing from favorites: {}", error);
                error
            })
        }))
    }

    pub fn is_favorite(&self, record: &ScoreRecord) -> bool {
        self.view.get().contains(&record.program_code)
    }

    /// Confirmed favorites resolved through the score store, in dataset
    /// order. Codes with no matching record are skipped.
    pub fn current_favorites(&self) -> Vec<ScoreRecord> {
        let view = self.view.get();
        if view.ids.is_empty() {
            return Vec::new();
        }
        let dataset = self.store.snapshot();
        dataset
            .records()
            .iter()
            .filter(|r| view.ids.contains(&r.program_code))
            .cloned()
            .collect()
    }

    /// Follow the session gate: attach on sign-in, clear on sign-out.
    pub fn bind_session(self: Arc<Self>, gate: &SessionGate) -> JoinHandle<()> {
        let mut sessions = gate.subscribe();
        tokio::spawn(async move {
            loop {
                let session = sessions.borrow_and_update().clone();
                match session {
                    Some(session) => {
                        if let Err(e) = self.attach(&session).await {
                            tracing::warn!("{}", e);
                        }
                    }
                    None => self.clear().await,
                }
                if sessions.changed().await.is_err() {
                    break;
                }
            }
        })
    }
}

impl<R: FavoritesRemote> Drop for FavoritesLedger<R> {
    fn drop(&mut self) {
        if let LedgerState::Attached { listener, .. } = self.state.get_mut() {
            listener.abort();
        }
    }
}
