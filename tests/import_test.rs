use std::sync::Arc;
use tempfile::TempDir;
use unimatch::core::Storage;
use unimatch::{
    AppConfig, CsvOptions, ExamTracks, LoadState, LocalStorage, QueryEngine, ScoreImporter,
    ScoreQuery, ScoreStore,
};

const HEADER: &str = "Program Kodu,Üniversite Türü,Üniversite Adı,Fakülte Adı,Program Adı,Puan Türü,Kontenjan,Yerleşen,En Küçük Puan,En Büyük Puan";

fn write_sheets(dir: &TempDir) {
    let tyt = format!(
        "{}\n\
         T1,Devlet,Ege Üniversitesi,Meslek Yüksekokulu,Bilgisayar Programcılığı,TYT,60,60,310.5,355.2\n\
         T2,Vakıf,Yaşar Üniversitesi,Meslek Yüksekokulu,Bilgisayar Programcılığı,TYT,30,28,\"250,75\",300\n\
         T3,Devlet,Ege Üniversitesi,Meslek Yüksekokulu,Adalet,TYT,40,40,360,401\n",
        HEADER
    );
    let ayt = format!(
        "{}\n\
         A1,Devlet,Ege Üniversitesi,Tıp Fakültesi,Tıp,AYT,200,200,505.1,540.0\n\
         T1,Devlet,Duplicate Üniversitesi,,Tekrar,AYT,1,1,1,1\n\
         A2,Vakıf,Yaşar Üniversitesi,Hukuk Fakültesi,Hukuk,AYT,50,50,410,460\n",
        HEADER
    );
    std::fs::write(dir.path().join("tyt.csv"), tyt).unwrap();
    std::fs::write(dir.path().join("ayt.csv"), ayt).unwrap();
}

fn importer(dir: &TempDir, sources: &[&str]) -> Arc<ScoreImporter<LocalStorage>> {
    Arc::new(ScoreImporter::new(
        LocalStorage::new(dir.path()),
        sources.iter().map(|s| s.to_string()).collect(),
        CsvOptions::default(),
    ))
}

#[tokio::test]
async fn test_import_populates_store_in_one_swap() {
    let dir = TempDir::new().unwrap();
    write_sheets(&dir);

    let store = ScoreStore::new();
    let engine = QueryEngine::new(store.clone());
    assert_eq!(store.load_state(), LoadState::Loading);
    assert!(engine.distinct_exam_types().is_empty());

    importer(&dir, &["tyt.csv", "ayt.csv"])
        .spawn(store.clone())
        .await
        .unwrap();

    // 重複的 T1 只保留第一份檔案的版本
    assert_eq!(store.load_state(), LoadState::Ready { records: 5 });
    assert_eq!(
        store.snapshot().get("T1").unwrap().institution_name,
        "Ege Üniversitesi"
    );

    assert_eq!(engine.distinct_exam_types(), vec!["AYT", "TYT"]);
    assert_eq!(engine.distinct_institution_types(), vec!["Devlet", "Vakıf"]);
    assert_eq!(
        engine.program_names("TYT", None, Some("Ege Üniversitesi")).unwrap(),
        vec!["Adalet", "Bilgisayar Programcılığı"]
    );

    let query = ScoreQuery::new("TYT", &ExamTracks::default()).expected_score(320.0);
    let codes: Vec<String> = engine
        .filter(&query)
        .into_iter()
        .map(|r| r.program_code)
        .collect();
    assert_eq!(codes, vec!["T1", "T2"]);
}

#[tokio::test]
async fn test_missing_source_leaves_store_empty() {
    let dir = TempDir::new().unwrap();
    write_sheets(&dir);

    let store = ScoreStore::new();
    let handle = importer(&dir, &["tyt.csv", "say.csv"]).spawn(store.clone());

    let state = store.wait_until_settled().await;
    handle.await.unwrap();

    assert!(matches!(state, LoadState::Failed { ref reason } if reason.contains("say.csv")));
    assert!(store.snapshot().is_empty());

    let engine = QueryEngine::new(store);
    assert!(engine.distinct_exam_types().is_empty());
    assert!(engine
        .filter(&ScoreQuery::new("TYT", &ExamTracks::default()))
        .is_empty());
}

#[tokio::test]
async fn test_importer_from_config() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("scores.tsv"),
        "X1\tDevlet\tOdtü\tFen\tFizik\tAYT\t30\t30\t455,5\t470\n",
    )
    .unwrap();

    let config = AppConfig::from_toml_str(&format!(
        "[dataset]\ndata_dir = '{}'\nsources = [\"scores.tsv\"]\ndelimiter = \"\\t\"\nhas_headers = false\n",
        dir.path().display()
    ))
    .unwrap();

    let storage = LocalStorage::new(dir.path());
    tokio_test::assert_ok!(storage.read_file("scores.tsv").await);

    let records = tokio_test::assert_ok!(ScoreImporter::from_config(storage, &config).import().await);

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].program_name, "Fizik");
    assert!((records[0].min_score - 455.5).abs() < 1e-9);
}
