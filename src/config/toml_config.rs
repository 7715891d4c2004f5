use crate::config::schema::{build_schema, default_schema};
use crate::core::assembler::MAX_SHORT_NAME_LENGTH;
use crate::core::dictionary::DictionaryOptions;
use crate::domain::model::{PositionDefinition, PositionSchema};
use crate::utils::error::{Result, ShortNameError};
use crate::utils::validation::{validate_path, validate_positive_number, validate_range, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dictionary: DictionaryConfig,
    pub assembly: AssemblyConfig,
    pub batch: BatchConfig,
    /// 未設定時使用內建位置表
    pub positions: Option<Vec<PositionDefinition>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    pub path: Option<String>,
    #[serde(flatten)]
    pub options: DictionaryOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    pub budget: usize,
    pub separator: String,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            budget: MAX_SHORT_NAME_LENGTH,
            separator: " ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ShortNameError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ShortNameError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DICTIONARY_PATH})，未定義者保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// 自訂位置表或內建位置表
    pub fn schema(&self) -> Result<PositionSchema> {
        match &self.positions {
            Some(positions) => build_schema(positions.clone()),
            None => default_schema(),
        }
    }

    pub fn dictionary_path(&self) -> Option<&str> {
        self.dictionary.path.as_deref()
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(path) = &self.dictionary.path {
            validate_path("dictionary.path", path)?;
        }

        validate_range("assembly.budget", self.assembly.budget, 1, MAX_SHORT_NAME_LENGTH)?;
        validate_positive_number("batch.concurrency", self.batch.concurrency, 1)?;

        if self.assembly.separator.is_empty() {
            return Err(ShortNameError::InvalidConfigValueError {
                field: "assembly.separator".to_string(),
                value: String::new(),
                reason: "separator cannot be empty".to_string(),
            });
        }

        self.schema()?;
        Ok(())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
