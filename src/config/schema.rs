use crate::domain::model::{MatcherKind, PositionDefinition, PositionSchema};
use crate::utils::error::{Result, ShortNameError};
use crate::utils::validation::{validate_non_empty_string, Validate};
use regex::RegexBuilder;
use serde::Deserialize;
use std::collections::HashSet;

const DEFAULT_SCHEMA: &str = include_str!("default_schema.toml");

#[derive(Debug, Deserialize)]
struct SchemaFile {
    positions: Vec<PositionDefinition>,
}

/// 內建的位置表
pub fn default_schema() -> Result<PositionSchema> {
    let file: SchemaFile = toml::from_str(DEFAULT_SCHEMA).map_err(|e| ShortNameError::ConfigError {
        message: format!("built-in position schema is invalid: {}", e),
    })?;
    build_schema(file.positions)
}

/// 建立並驗證位置表
pub fn build_schema(positions: Vec<PositionDefinition>) -> Result<PositionSchema> {
    let schema = PositionSchema::from_positions(positions);
    schema.validate()?;
    Ok(schema)
}

impl Validate for PositionSchema {
    fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(ShortNameError::MissingConfigError {
                field: "positions".to_string(),
            });
        }

        let mut names = HashSet::new();
        let mut previous: Option<u32> = None;
        let mut remainder_count = 0;

        for position in self.positions() {
            let field = format!("positions.{}", position.name);
            validate_non_empty_string("positions.name", &position.name)?;

            if let Some(previous) = previous {
                if position.position_number <= previous {
                    return Err(ShortNameError::InvalidConfigValueError {
                        field: format!("{}.position_number", field),
                        value: position.position_number.to_string(),
                        reason: format!(
                            "position numbers must be unique and strictly increasing (previous was {})",
                            previous
                        ),
                    });
                }
            }
            previous = Some(position.position_number);

            if !names.insert(position.name.as_str()) {
                return Err(ShortNameError::InvalidConfigValueError {
                    field: "positions.name".to_string(),
                    value: position.name.clone(),
                    reason: "position names must be unique".to_string(),
                });
            }

            match position.matcher {
                MatcherKind::Remainder => remainder_count += 1,
                MatcherKind::Keywords => {
                    if position.keywords.is_empty() && position.hint_category.is_none() {
                        return Err(ShortNameError::InvalidConfigValueError {
                            field: format!("{}.keywords", field),
                            value: String::new(),
                            reason: "keyword positions need keywords or a hint_category".to_string(),
                        });
                    }
                }
                MatcherKind::Patterns => {
                    if position.patterns.is_empty() {
                        return Err(ShortNameError::InvalidConfigValueError {
                            field: format!("{}.patterns", field),
                            value: String::new(),
                            reason: "pattern positions need at least one pattern".to_string(),
                        });
                    }
                }
            }

            for pattern in &position.patterns {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| ShortNameError::InvalidConfigValueError {
                        field: format!("{}.patterns", field),
                        value: pattern.clone(),
                        reason: e.to_string(),
                    })?;
            }
        }

        if remainder_count > 1 {
            return Err(ShortNameError::InvalidConfigValueError {
                field: "positions.matcher".to_string(),
                value: remainder_count.to_string(),
                reason: "at most one position may use the remainder matcher".to_string(),
            });
        }

        if self.mandatory_names().next().is_none() {
            tracing::warn!("Position schema has no mandatory positions");
        }

        Ok(())
    }
}
