use crate::core::store::ScoreStore;
use crate::domain::model::{ExamTracks, ScoreRecord};
use crate::utils::error::{Result, UnimatchError};
use std::collections::BTreeSet;

/// Filter arguments for [`QueryEngine::filter`]. Empty strings mean "match all".
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreQuery {
    pub exam_type: String,
    pub institution_type: String,
    pub institution_name: String,
    pub program_name: String,
    pub expected_score: f64,
}

impl ScoreQuery {
    /// Start a query whose expected score is the track maximum, so nothing
    /// is excluded until the caller supplies a score.
    pub fn new(exam_type: impl Into<String>, tracks: &ExamTracks) -> Self {
        let exam_type = exam_type.into();
        let expected_score = tracks.max_score(&exam_type);
        Self {
            exam_type,
            institution_type: String::new(),
            institution_name: String::new(),
            program_name: String::new(),
            expected_score,
        }
    }

    pub fn institution_type(mut self, value: impl Into<String>) -> Self {
        self.institution_type = value.into();
        self
    }

    pub fn institution_name(mut self, value: impl Into<String>) -> Self {
        self.institution_name = value.into();
        self
    }

    pub fn program_name(mut self, value: impl Into<String>) -> Self {
        self.program_name = value.into();
        self
    }

    pub fn expected_score(mut self, value: f64) -> Self {
        self.expected_score = value;
        self
    }
}

fn matches(filter: &str, value: &str) -> bool {
    filter.is_empty() || filter == value
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Faceted lookups and filtered searches over the score store.
///
/// Every call reads the current snapshot, so before the import finishes all
/// results are empty.
#[derive(Debug, Clone)]
pub struct QueryEngine {
    store: ScoreStore,
}

impl QueryEngine {
    pub fn new(store: ScoreStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ScoreStore {
        &self.store
    }

    pub fn distinct_exam_types(&self) -> Vec<String> {
        let dataset = self.store.snapshot();
        distinct(dataset.records().iter().map(|r| r.exam_type.as_str()))
    }

    pub fn distinct_institution_types(&self) -> Vec<String> {
        let dataset = self.store.snapshot();
        distinct(dataset.records().iter().map(|r| r.institution_type.as_str()))
    }

    pub fn institution_names(&self, institution_type: Option<&str>) -> Vec<String> {
        let institution_type = institution_type.unwrap_or_default();
        let dataset = self.store.snapshot();
        distinct(
            dataset
                .records()
                .iter()
                .filter(|r| matches(institution_type, &r.institution_type))
                .map(|r| r.institution_name.as_str()),
        )
    }

    /// 科系名稱清單；必須先選考試類型
    pub fn program_names(
        &self,
        exam_type: &str,
        institution_type: Option<&str>,
        institution_name: Option<&str>,
    ) -> Result<Vec<String>> {
        if exam_type.is_empty() {
            return Err(UnimatchError::invalid_query(
                "exam type is required to list program names",
            ));
        }

        let institution_type = institution_type.unwrap_or_default();
        let institution_name = institution_name.unwrap_or_default();
        let dataset = self.store.snapshot();

        Ok(distinct(
            dataset
                .records()
                .iter()
                .filter(|r| r.exam_type == exam_type)
                .filter(|r| matches(institution_type, &r.institution_type))
                .filter(|r| matches(institution_name, &r.institution_name))
                .map(|r| r.program_name.as_str()),
        ))
    }

    /// Records admissible at `expected_score`, highest minimum score first.
    /// Records with equal minimum scores keep their dataset order.
    pub fn filter(&self, query: &ScoreQuery) -> Vec<ScoreRecord> {
        let dataset = self.store.snapshot();

        let mut results: Vec<ScoreRecord> = dataset
            .records()
            .iter()
            .filter(|r| matches(&query.exam_type, &r.exam_type))
            .filter(|r| matches(&query.institution_type, &r.institution_type))
            .filter(|r| matches(&query.institution_name, &r.institution_name))
            .filter(|r| matches(&query.program_name, &r.program_name))
            .filter(|r| r.min_score <= query.expected_score)
            .cloned()
            .collect();

        results.sort_by(|a, b| b.min_score.total_cmp(&a.min_score));

        tracing::debug!(
            "Query {:?} matched {} of {} records",
            query,
            results.len(),
            dataset.len()
        );
        results
    }
}
