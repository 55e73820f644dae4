use crate::core::observable::Observable;
use crate::domain::model::ScoreRecord;
use std::collections::HashMap;
use std::sync::Arc;

/// Readiness of the score dataset, owned by whoever runs the import.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LoadState {
    #[default]
    Loading,
    Ready {
        records: usize,
    },
    Failed {
        reason: String,
    },
}

impl LoadState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, LoadState::Loading)
    }
}

/// Immutable, fully loaded set of score records indexed by program code.
#[derive(Debug, Default)]
pub struct Dataset {
    records: Vec<ScoreRecord>,
    by_code: HashMap<String, usize>,
}

impl Dataset {
    /// 重複的 program_code 保留第一筆
    pub fn new(records: Vec<ScoreRecord>) -> Self {
        let mut by_code = HashMap::with_capacity(records.len());
        let mut unique = Vec::with_capacity(records.len());

        for record in records {
            if by_code.contains_key(&record.program_code) {
                tracing::warn!(
                    "Duplicate program code {} ({}), keeping the first occurrence",
                    record.program_code,
                    record.institution_name
                );
                continue;
            }
            by_code.insert(record.program_code.clone(), unique.len());
            unique.push(record);
        }

        Self {
            records: unique,
            by_code,
        }
    }

    pub fn records(&self) -> &[ScoreRecord] {
        &self.records
    }

    pub fn get(&self, program_code: &str) -> Option<&ScoreRecord> {
        self.by_code.get(program_code).map(|&idx| &self.records[idx])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Score Record Store: read-only after the single import completes.
///
/// Readers always see either the empty dataset or the complete one; the
/// dataset is installed with one swap.
#[derive(Debug, Clone, Default)]
pub struct ScoreStore {
    dataset: Observable<Arc<Dataset>>,
    state: Observable<LoadState>,
}

impl ScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store that is already `Ready`. Mostly useful in tests.
    pub fn with_records(records: Vec<ScoreRecord>) -> Self {
        let store = Self::new();
        store.install(records);
        store
    }

    pub fn snapshot(&self) -> Arc<Dataset> {
        self.dataset.get()
    }

    pub fn install(&self, records: Vec<ScoreRecord>) {
        let dataset = Arc::new(Dataset::new(records));
        let count = dataset.len();
        self.dataset.set(dataset);
        self.state.set(LoadState::Ready { records: count });
    }

    pub fn mark_failed(&self, reason: impl Into<String>) {
        self.state.set(LoadState::Failed {
            reason: reason.into(),
        });
    }

    pub fn load_state(&self) -> LoadState {
        self.state.get()
    }

    pub fn subscribe_state(&self) -> tokio::sync::watch::Receiver<LoadState> {
        self.state.subscribe()
    }

    /// Wait until the import either finished or failed.
    pub async fn wait_until_settled(&self) -> LoadState {
        let mut rx = self.state.subscribe();
        let settled = match rx.wait_for(LoadState::is_settled).await {
            Ok(state) => state.clone(),
            // Sender lives as long as `self`, so this is unreachable in practice
            Err(_) => self.state.get(),
        };
        settled
    }
}
