pub mod schema;
pub mod toml_config;

pub use toml_config::AppConfig;

#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "shortname-gen")]
#[command(about = "Generate length-bounded short names for medical products")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Abbreviation dictionary (CSV/TSV), overrides the config file
    #[arg(short, long, global = true)]
    pub dictionary: Option<String>,

    /// Character budget, overrides the config file
    #[arg(long, global = true)]
    pub budget: Option<usize>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Generate a short name for one description
    Generate {
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Process a file of descriptions (one per line, or a CSV with a description column)
    Batch {
        #[arg(short, long)]
        input: String,

        /// Write results as CSV instead of printing them
        #[arg(short, long)]
        output: Option<String>,

        #[arg(long)]
        concurrency: Option<usize>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Read descriptions from stdin interactively
    Interactive,
    /// Show dictionary status
    Status,
    /// Answer JSON requests from stdin, one per line
    Serve,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 讀取配置檔並套用命令列覆蓋設定
    pub fn app_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };

        if let Some(dictionary) = &self.dictionary {
            config.dictionary.path = Some(dictionary.clone());
        }
        if let Some(budget) = self.budget {
            config.assembly.budget = budget;
        }
        if let Command::Batch {
            concurrency: Some(concurrency),
            ..
        } = &self.command
        {
            config.batch.concurrency = *concurrency;
        }

        Ok(config)
    }
}
