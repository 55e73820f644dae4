use clap::Parser;
use std::sync::Arc;
use unimatch::config::{Command, FavoritesAction};
use unimatch::core::ConfigProvider;
use unimatch::utils::error::ErrorSeverity;
use unimatch::utils::{logger, validation::Validate};
use unimatch::{
    join_import, AppConfig, CliArgs, FavoritesLedger, LoadState, LocalFavoritesStore, LocalStorage,
    QueryEngine, ScoreImporter, ScoreQuery, ScoreRecord, ScoreStore, Session, UnimatchError,
};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let mut config = if std::path::Path::new(&args.config).exists() {
        match AppConfig::from_file(&args.config) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
                eprintln!("💡 Make sure the file is valid TOML format");
                std::process::exit(1);
            }
        }
    } else {
        AppConfig::default()
    };
    args.apply_overrides(&mut config);

    // 初始化日誌
    if config.uses_json_logs() {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }
    tracing::debug!("CLI args: {:?}", args);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(&args, &config).await {
        tracing::error!(
            "❌ {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }
}

async fn run(args: &CliArgs, config: &AppConfig) -> unimatch::Result<()> {
    let store = ScoreStore::new();
    let importer = Arc::new(ScoreImporter::from_config(
        LocalStorage::new(config.data_dir()),
        config,
    ));
    let import = importer.spawn(store.clone());

    // 等待背景載入完成；失敗時查詢回傳空結果
    if let LoadState::Failed { reason } = join_import(&store, import).await {
        tracing::warn!("No score data available: {}", reason);
    }

    let engine = QueryEngine::new(store.clone());

    match &args.command {
        Command::ExamTypes => print_list(args, &engine.distinct_exam_types()),
        Command::InstitutionTypes => print_list(args, &engine.distinct_institution_types()),
        Command::Institutions { institution_type } => {
            print_list(args, &engine.institution_names(institution_type.as_deref()))
        }
        Command::Programs {
            exam_type,
            institution_type,
            institution,
        } => {
            let names = engine.program_names(
                exam_type,
                institution_type.as_deref(),
                institution.as_deref(),
            )?;
            print_list(args, &names)
        }
        Command::Search {
            exam_type,
            institution_type,
            institution,
            program,
            score,
        } => {
            let mut query = ScoreQuery::new(exam_type.clone(), config.exam_tracks())
                .institution_type(institution_type.clone().unwrap_or_default())
                .institution_name(institution.clone().unwrap_or_default())
                .program_name(program.clone().unwrap_or_default());
            if let Some(score) = score {
                query = query.expected_score(*score);
            }
            print_records(args, &engine.filter(&query))
        }
        Command::Favorites { user, action } => favorites(args, config, store, user, action).await,
    }
}

async fn favorites(
    args: &CliArgs,
    config: &AppConfig,
    store: ScoreStore,
    user: &str,
    action: &FavoritesAction,
) -> unimatch::Result<()> {
    let remote = match config.favorites_path() {
        Some(path) => LocalFavoritesStore::open(path).await?,
        None => {
            tracing::warn!("No favorites store_path configured; favorites will not be kept");
            LocalFavoritesStore::in_memory()
        }
    };

    let ledger = FavoritesLedger::new(Arc::new(remote), store.clone());
    let mut updates = ledger.subscribe();
    ledger.attach(&Session::new(user)).await?;
    // 第一份快照代表遠端目前狀態
    let _ = updates.wait_for(|view| view.synced).await;

    let lookup = |program_code: &str| -> unimatch::Result<ScoreRecord> {
        store
            .snapshot()
            .get(program_code)
            .cloned()
            .ok_or_else(|| UnimatchError::invalid_query(format!("unknown program code '{}'", program_code)))
    };

    match action {
        FavoritesAction::List => {}
        FavoritesAction::Add { program_code } => {
            let record = lookup(program_code)?;
            ledger.add(&record).await?.wait().await?;
            let _ = updates.wait_for(|view| view.contains(program_code)).await;
        }
        FavoritesAction::Remove { program_code } => {
            let record = lookup(program_code)?;
            ledger.remove(&record).await?.wait().await?;
            let _ = updates.wait_for(|view| !view.contains(program_code)).await;
        }
    }

    let result = print_records(args, &ledger.current_favorites());
    ledger.clear().await;
    result
}

fn print_list(args: &CliArgs, values: &[String]) -> unimatch::Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(values)?);
    } else {
        for value in values {
            println!("{}", value);
        }
    }
    Ok(())
}

fn print_records(args: &CliArgs, records: &[ScoreRecord]) -> unimatch::Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No programs match your criteria");
        return Ok(());
    }

    for record in records {
        println!(
            "{:<10} {:>8.2} {:>8.2} {:>5}/{:<5} {} | {} | {} ({})",
            record.program_code,
            record.min_score,
            record.max_score,
            record.placed,
            record.quota,
            record.institution_name,
            record.faculty_name,
            record.program_name,
            record.exam_type
        );
    }
    println!("📊 {} programs", records.len());
    Ok(())
}
