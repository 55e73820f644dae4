use crate::core::{ConfigProvider, ExamTracks};
use crate::utils::error::{Result, UnimatchError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dataset: DatasetConfig,
    pub exam_tracks: ExamTracks,
    pub favorites: FavoritesConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub data_dir: String,
    pub sources: Vec<String>,
    pub delimiter: String,
    pub has_headers: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            sources: vec!["tyt.csv".to_string(), "ayt.csv".to_string()],
            delimiter: ",".to_string(),
            has_headers: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FavoritesConfig {
    pub store_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: "compact".to_string(),
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(UnimatchError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| UnimatchError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${UNIMATCH_DATA_DIR})，未設定者保持原樣
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<regex::Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| {
            regex::Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid")
        });

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn uses_json_logs(&self) -> bool {
        self.logging.format.eq_ignore_ascii_case("json")
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("dataset.data_dir", &self.dataset.data_dir)?;
        validation::validate_non_empty_list("dataset.sources", &self.dataset.sources)?;
        validation::validate_file_extensions("dataset.sources", &self.dataset.sources, &["csv", "tsv"])?;

        if self.dataset.delimiter.len() != 1 {
            return Err(UnimatchError::InvalidConfigValueError {
                field: "dataset.delimiter".to_string(),
                value: self.dataset.delimiter.clone(),
                reason: "Delimiter must be a single ASCII character".to_string(),
            });
        }

        for (label, max) in self.exam_tracks.iter() {
            validation::validate_non_empty_string("exam_tracks", label)?;
            validation::validate_range(&format!("exam_tracks.{}", label), max, 1.0, 1000.0)?;
        }

        if let Some(store_path) = &self.favorites.store_path {
            validation::validate_path("favorites.store_path", store_path)?;
        }

        let valid_formats = ["compact", "json"];
        if !valid_formats.contains(&self.logging.format.to_ascii_lowercase().as_str()) {
            return Err(UnimatchError::InvalidConfigValueError {
                field: "logging.format".to_string(),
                value: self.logging.format.clone(),
                reason: format!("Unsupported format. Valid formats: {}", valid_formats.join(", ")),
            });
        }

        Ok(())
    }
}

impl ConfigProvider for AppConfig {
    fn data_dir(&self) -> &str {
        &self.dataset.data_dir
    }

    fn score_sources(&self) -> &[String] {
        &self.dataset.sources
    }

    fn delimiter(&self) -> u8 {
        self.dataset.delimiter.bytes().next().unwrap_or(b',')
    }

    fn has_headers(&self) -> bool {
        self.dataset.has_headers
    }

    fn exam_tracks(&self) -> &ExamTracks {
        &self.exam_tracks
    }

    fn favorites_path(&self) -> Option<&str> {
        self.favorites.store_path.as_deref()
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = AppConfig::from_toml_str("").unwrap();

        assert_eq!(config.data_dir(), "./data");
        assert_eq!(config.score_sources(), ["tyt.csv", "ayt.csv"]);
        assert_eq!(config.delimiter(), b',');
        assert_eq!(config.exam_tracks().max_score("TYT"), 500.0);
        assert!(config.favorites_path().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[dataset]
data_dir = "/srv/scores"
sources = ["2024-tyt.tsv", "2024-ayt.tsv"]
delimiter = "\t"
has_headers = false

[exam_tracks]
TYT = 500.0
SAY = 560.0

[favorites]
store_path = "/var/lib/unimatch/favorites.json"

[logging]
format = "json"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.data_dir(), "/srv/scores");
        assert_eq!(config.delimiter(), b'\t');
        assert!(!config.has_headers());
        assert_eq!(config.exam_tracks().max_score("SAY"), 560.0);
        assert_eq!(config.favorites_path(), Some("/var/lib/unimatch/favorites.json"));
        assert!(config.uses_json_logs());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("UNIMATCH_TEST_DATA_DIR", "/tmp/unimatch-data");

        let toml_content = r#"
[dataset]
data_dir = "${UNIMATCH_TEST_DATA_DIR}"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.dataset.data_dir, "/tmp/unimatch-data");

        std::env::remove_var("UNIMATCH_TEST_DATA_DIR");
    }

    #[test]
    fn test_config_validation() {
        let bad_sources = AppConfig::from_toml_str("[dataset]\nsources = [\"tyt.xlsx\"]\n").unwrap();
        assert!(bad_sources.validate().is_err());

        let bad_track = AppConfig::from_toml_str("[exam_tracks]\nTYT = 0.0\n").unwrap();
        assert!(bad_track.validate().is_err());

        let bad_delimiter = AppConfig::from_toml_str("[dataset]\ndelimiter = \";;\"\n").unwrap();
        assert!(bad_delimiter.validate().is_err());

        let bad_format = AppConfig::from_toml_str("[logging]\nformat = \"xml\"\n").unwrap();
        assert!(bad_format.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[dataset]\ndata_dir = \"./fixtures\"\n")
            .unwrap();

        let config = AppConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.data_dir(), "./fixtures");
    }
}
