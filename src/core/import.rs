use crate::core::store::{LoadState, ScoreStore};
use crate::domain::model::ScoreRecord;
use crate::domain::ports::{ConfigProvider, Storage};
use crate::utils::error::{Result, UnimatchError};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Column order shared by both score sheets.
const COLUMN_COUNT: usize = 10;

#[derive(Debug, Clone, Copy)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub has_headers: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
        }
    }
}

/// Outcome of decoding one source.
#[derive(Debug, Default)]
pub struct ParsedSheet {
    pub records: Vec<ScoreRecord>,
    pub skipped_rows: Vec<UnimatchError>,
}

/// 解析一份分數表；單列錯誤記錄後略過，不影響整體載入
pub fn parse_score_sheet(source_name: &str, data: &[u8], options: CsvOptions) -> ParsedSheet {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(options.has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut sheet = ParsedSheet::default();
    let first_data_row = if options.has_headers { 2 } else { 1 };

    for (idx, row) in reader.records().enumerate() {
        let row_number = idx + first_data_row;
        match row {
            Ok(row) => {
                if row.iter().all(str::is_empty) {
                    continue;
                }
                if row.len() > COLUMN_COUNT {
                    tracing::debug!(
                        "{} row {}: ignoring {} extra column(s)",
                        source_name,
                        row_number,
                        row.len() - COLUMN_COUNT
                    );
                }
                sheet.records.push(record_from_row(&row));
            }
            Err(e) => {
                let error = UnimatchError::ImportRowError {
                    source_name: source_name.to_string(),
                    row: row_number,
                    message: e.to_string(),
                };
                tracing::warn!("Skipping row: {}", error);
                sheet.skipped_rows.push(error);
            }
        }
    }

    sheet
}

fn record_from_row(row: &csv::StringRecord) -> ScoreRecord {
    let text = |idx: usize| row.get(idx).unwrap_or_default().to_string();
    let number = |idx: usize| row.get(idx).map(parse_score).unwrap_or(0.0);
    let count = |idx: usize| row.get(idx).map(parse_count).unwrap_or(0);

    ScoreRecord {
        program_code: text(0),
        institution_type: text(1),
        institution_name: text(2),
        faculty_name: text(3),
        program_name: text(4),
        exam_type: text(5),
        quota: count(6),
        placed: count(7),
        min_score: number(8),
        max_score: number(9),
    }
}

/// Accepts `312.45` and the Turkish `312,45`. Anything unusable becomes 0.
fn parse_score(cell: &str) -> f64 {
    let normalized = if cell.contains(',') && !cell.contains('.') {
        cell.replace(',', ".")
    } else {
        cell.to_string()
    };

    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => value,
        _ => 0.0,
    }
}

/// Spreadsheet exports often write integers as `45.0`.
fn parse_count(cell: &str) -> u32 {
    if let Ok(value) = cell.parse::<u32>() {
        return value;
    }
    let value = parse_score(cell);
    if value <= u32::MAX as f64 {
        value as u32
    } else {
        0
    }
}

/// Background import of every configured score source into a `ScoreStore`.
pub struct ScoreImporter<S: Storage> {
    storage: S,
    sources: Vec<String>,
    options: CsvOptions,
}

impl<S: Storage + 'static> ScoreImporter<S> {
    pub fn new(storage: S, sources: Vec<String>, options: CsvOptions) -> Self {
        Self {
            storage,
            sources,
            options,
        }
    }

    pub fn from_config<C: ConfigProvider>(storage: S, config: &C) -> Self {
        Self::new(
            storage,
            config.score_sources().to_vec(),
            CsvOptions {
                delimiter: config.delimiter(),
                has_headers: config.has_headers(),
            },
        )
    }

    /// Read and decode every source in order. Any unreadable source fails the
    /// whole import so the store never holds a partial dataset.
    pub async fn import(&self) -> Result<Vec<ScoreRecord>> {
        let mut all_records = Vec::new();

        for source in &self.sources {
            tracing::debug!("Reading score source {}", source);
            let data = self.storage.read_file(source).await.map_err(|e| {
                UnimatchError::ImportSourceError {
                    source_name: source.clone(),
                    message: e.to_string(),
                }
            })?;

            let name = source.clone();
            let options = self.options;
            let sheet = tokio::task::spawn_blocking(move || parse_score_sheet(&name, &data, options))
                .await
                .map_err(|e| UnimatchError::ImportSourceError {
                    source_name: source.clone(),
                    message: format!("decoder task failed: {}", e),
                })?;

            tracing::info!(
                "Loaded {} records from {} ({} skipped)",
                sheet.records.len(),
                source,
                sheet.skipped_rows.len()
            );
            all_records.extend(sheet.records);
        }

        Ok(all_records)
    }

    /// Run the import on a background task and publish the result into
    /// `store`. Import failures are recorded as `LoadState::Failed`.
    pub fn spawn(self: Arc<Self>, store: ScoreStore) -> JoinHandle<()> {
        tokio::spawn(async move {
            match self.import().await {
                Ok(records) => {
                    tracing::info!("Score dataset ready with {} records", records.len());
                    store.install(records);
                }
                Err(e) => {
                    tracing::error!("Score import failed: {}", e);
                    store.mark_failed(e.to_string());
                }
            }
        })
    }
}

/// Wait for an import task started by [`ScoreImporter::spawn`] and return
/// the final load state. A task that panicked marks the store failed.
pub async fn join_import(store: &ScoreStore, handle: JoinHandle<()>) -> LoadState {
    if let Err(e) = handle.await {
        tracing::error!("Score import task aborted: {}", e);
        if !store.load_state().is_settled() {
            store.mark_failed(format!("import task aborted: {}", e));
        }
    }
    store.load_state()
}
