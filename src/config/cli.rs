use crate::config::AppConfig;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "unimatch")]
#[command(about = "Browse university admission score tables and manage favorite programs")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "unimatch.toml")]
    pub config: String,

    /// Override the directory holding the score sheets
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Override the favorites store file
    #[arg(long)]
    pub favorites_file: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List exam types present in the dataset
    ExamTypes,

    /// List institution types present in the dataset
    InstitutionTypes,

    /// List institution names
    Institutions {
        /// Only institutions of this type
        #[arg(long = "type")]
        institution_type: Option<String>,
    },

    /// List program names for an exam type
    Programs {
        #[arg(long)]
        exam_type: String,
        #[arg(long)]
        institution_type: Option<String>,
        #[arg(long)]
        institution: Option<String>,
    },

    /// List programs a given score can get into, highest minimum score first
    Search {
        #[arg(long)]
        exam_type: String,
        #[arg(long)]
        institution_type: Option<String>,
        #[arg(long)]
        institution: Option<String>,
        #[arg(long)]
        program: Option<String>,
        /// Expected score; defaults to the exam track maximum
        #[arg(long)]
        score: Option<f64>,
    },

    /// Manage a user's favorite programs
    Favorites {
        /// User identity whose favorites are used
        #[arg(long)]
        user: String,

        #[command(subcommand)]
        action: FavoritesAction,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum FavoritesAction {
    /// Show favorite programs
    List,
    /// Mark a program as favorite
    Add { program_code: String },
    /// Remove a program from favorites
    Remove { program_code: String },
}

impl CliArgs {
    /// Apply command-line overrides on top of the file configuration.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(data_dir) = &self.data_dir {
            tracing::debug!("🔧 data_dir overridden to: {}", data_dir);
            config.dataset.data_dir = data_dir.clone();
        }
        if let Some(path) = &self.favorites_file {
            tracing::debug!("🔧 favorites store overridden to: {}", path);
            config.favorites.store_path = Some(path.clone());
        }
    }
}
