use unimatch::{ExamTracks, QueryEngine, ScoreQuery, ScoreRecord, ScoreStore, UnimatchError};

fn record(code: &str, exam_type: &str, kind: &str, name: &str, min_score: f64) -> ScoreRecord {
    ScoreRecord {
        program_code: code.to_string(),
        institution_type: kind.to_string(),
        institution_name: name.to_string(),
        faculty_name: "Fen Fakültesi".to_string(),
        program_name: "Matematik".to_string(),
        exam_type: exam_type.to_string(),
        quota: 60,
        placed: 58,
        min_score,
        max_score: min_score + 15.0,
    }
}

fn scenario_engine() -> QueryEngine {
    QueryEngine::new(ScoreStore::with_records(vec![
        record("A", "TYT", "Public", "Hacettepe Üniversitesi", 310.0),
        record("B", "TYT", "Private", "Başkent Üniversitesi", 450.0),
        record("C", "AYT", "Private", "Sabancı Üniversitesi", 500.0),
        record("D", "AYT", "Public ", "Trailing Space Üniversitesi", 420.0),
    ]))
}

fn codes(records: &[ScoreRecord]) -> Vec<&str> {
    records.iter().map(|r| r.program_code.as_str()).collect()
}

#[test]
fn test_filter_orders_by_min_score_descending() {
    let engine = scenario_engine();
    let query = ScoreQuery::new("TYT", &ExamTracks::default()).expected_score(500.0);

    assert_eq!(codes(&engine.filter(&query)), vec!["B", "A"]);
}

#[test]
fn test_filter_excludes_records_above_expected_score() {
    let engine = scenario_engine();
    let query = ScoreQuery::new("TYT", &ExamTracks::default()).expected_score(300.0);

    assert!(engine.filter(&query).is_empty());

    let query = query.expected_score(310.0);
    assert_eq!(codes(&engine.filter(&query)), vec!["A"]);
}

#[test]
fn test_distinct_exam_types() {
    assert_eq!(scenario_engine().distinct_exam_types(), vec!["AYT", "TYT"]);
}

#[test]
fn test_institution_names_match_type_exactly() {
    let names = scenario_engine().institution_names(Some("Private"));
    assert_eq!(names, vec!["Başkent Üniversitesi", "Sabancı Üniversitesi"]);

    let names = scenario_engine().institution_names(Some("Public"));
    assert_eq!(names, vec!["Hacettepe Üniversitesi"]);
}

#[test]
fn test_program_names_reject_empty_exam_type() {
    let result = scenario_engine().program_names("", Some("Private"), None);
    let err = tokio_test::assert_err!(result);
    assert!(matches!(err, UnimatchError::InvalidQuery { .. }));
}

#[test]
fn test_default_expected_score_is_track_maximum() {
    let tracks = ExamTracks::default();
    assert_eq!(ScoreQuery::new("TYT", &tracks).expected_score, 500.0);
    assert_eq!(ScoreQuery::new("AYT", &tracks).expected_score, 560.0);

    let engine = scenario_engine();
    assert_eq!(
        codes(&engine.filter(&ScoreQuery::new("AYT", &tracks))),
        vec!["C", "D"]
    );
}

#[test]
fn test_filter_properties_hold_across_scores() {
    let mut records = Vec::new();
    for i in 0..200u32 {
        let exam_type = if i % 3 == 0 { "AYT" } else { "TYT" };
        let kind = if i % 2 == 0 { "Public" } else { "Private" };
        // 重複出現的分數用來檢查同分時的穩定排序
        let min_score = f64::from((i * 37) % 100) * 3.0 + 150.0;
        records.push(record(&format!("P{:03}", i), exam_type, kind, "Uni", min_score));
    }
    let engine = QueryEngine::new(ScoreStore::with_records(records.clone()));
    let tracks = ExamTracks::default();

    for exam_type in ["TYT", "AYT"] {
        for expected in [0.0, 151.0, 275.5, 399.0, 500.0, 560.0] {
            let query = ScoreQuery::new(exam_type, &tracks)
                .institution_type("Public")
                .expected_score(expected);
            let results = engine.filter(&query);

            assert!(results.iter().all(|r| r.exam_type == exam_type));
            assert!(results.iter().all(|r| r.institution_type == "Public"));
            assert!(results.iter().all(|r| r.min_score <= expected));
            assert!(results
                .windows(2)
                .all(|pair| pair[0].min_score >= pair[1].min_score));

            for pair in results.windows(2) {
                if pair[0].min_score == pair[1].min_score {
                    assert!(pair[0].program_code < pair[1].program_code);
                }
            }

            let expected_count = records
                .iter()
                .filter(|r| {
                    r.exam_type == exam_type
                        && r.institution_type == "Public"
                        && r.min_score <= expected
                })
                .count();
            assert_eq!(results.len(), expected_count);
        }
    }
}
