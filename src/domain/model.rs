use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One admission-score row: a single program at a single institution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    pub program_code: String,
    pub institution_type: String,
    pub institution_name: String,
    pub faculty_name: String,
    pub program_name: String,
    pub exam_type: String,
    pub quota: u32,
    pub placed: u32,
    pub min_score: f64,
    pub max_score: f64,
}

/// 收藏紀錄，以 program_code 為鍵存放於遠端使用者集合
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub program_code: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub summary: Option<FavoriteSummary>,
}

/// Denormalized copy of the record so a favorites list can be shown
/// without the score dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteSummary {
    pub institution_type: String,
    pub institution_name: String,
    pub faculty_name: String,
    pub program_name: String,
    pub exam_type: String,
    pub min_score: f64,
}

impl Favorite {
    pub fn for_record(record: &ScoreRecord, timestamp: DateTime<Utc>) -> Self {
        Self {
            program_code: record.program_code.clone(),
            timestamp,
            summary: Some(FavoriteSummary {
                institution_type: record.institution_type.clone(),
                institution_name: record.institution_name.clone(),
                faculty_name: record.faculty_name.clone(),
                program_name: record.program_name.clone(),
                exam_type: record.exam_type.clone(),
                min_score: record.min_score,
            }),
        }
    }
}

/// Identity of the signed-in user. Passed explicitly to whatever needs it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Session {
    pub user_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

pub const TYT_MAX_SCORE: f64 = 500.0;
pub const AYT_MAX_SCORE: f64 = 560.0;

/// Maximum attainable score per exam track label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExamTracks(BTreeMap<String, f64>);

impl Default for ExamTracks {
    fn default() -> Self {
        let mut tracks = BTreeMap::new();
        tracks.insert("TYT".to_string(), TYT_MAX_SCORE);
        tracks.insert("AYT".to_string(), AYT_MAX_SCORE);
        Self(tracks)
    }
}

impl ExamTracks {
    pub fn new(tracks: BTreeMap<String, f64>) -> Self {
        Self(tracks)
    }

    /// 未知的考試類型取所有設定值中的最大者，避免誤排除任何紀錄
    pub fn max_score(&self, exam_type: &str) -> f64 {
        self.0
            .get(exam_type)
            .copied()
            .unwrap_or_else(|| self.highest_max())
    }

    pub fn highest_max(&self) -> f64 {
        self.0.values().copied().fold(AYT_MAX_SCORE, f64::max)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(label, max)| (label.as_str(), *max))
    }
}
