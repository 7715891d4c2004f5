use crate::config::schema::default_schema;
use crate::config::AppConfig;
use crate::core::assembler::{ShortNameAssembler, MAX_SHORT_NAME_LENGTH};
use crate::core::dictionary::{AbbreviationDictionary, DictionaryOptions};
use crate::core::extractor::ComponentExtractor;
use crate::core::resolver::AbbreviationResolver;
use crate::core::units::unit_table;
use crate::domain::model::{BatchItem, BatchReport, PositionSchema, ProcessingResult};
use crate::domain::ports::AbbreviationLookup;
use crate::utils::error::{Result, ShortNameError};
use crate::utils::validation::Validate;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, RwLock};

/// 詞典與依其編譯的擷取器，一起替換
pub struct EngineSnapshot {
    dictionary: Option<Arc<AbbreviationDictionary>>,
    extractor: ComponentExtractor,
}

impl EngineSnapshot {
    fn build(schema: &PositionSchema, dictionary: Option<Arc<AbbreviationDictionary>>) -> Result<Self> {
        let extractor = ComponentExtractor::new(schema, dictionary.as_deref())?;
        Ok(Self {
            dictionary,
            extractor,
        })
    }

    pub fn dictionary(&self) -> Option<&AbbreviationDictionary> {
        self.dictionary.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessorStatus {
    pub dictionary_loaded: bool,
    pub dictionary_path: Option<String>,
    pub abbreviation_count: usize,
}

/// 處理工作階段；每個請求只取一次快照並用到結束，重新載入詞典不影響進行中的請求
pub struct ShortNameProcessor {
    schema: PositionSchema,
    units: AbbreviationDictionary,
    assembler: ShortNameAssembler,
    dictionary_options: DictionaryOptions,
    state: RwLock<Arc<EngineSnapshot>>,
}

impl ShortNameProcessor {
    pub fn new(schema: PositionSchema, assembler: ShortNameAssembler) -> Result<Self> {
        schema.validate()?;
        let assembler = assembler.with_schema(&schema);
        let snapshot = EngineSnapshot::build(&schema, None)?;

        Ok(Self {
            schema,
            units: unit_table()?,
            assembler,
            dictionary_options: DictionaryOptions::default(),
            state: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// 內建位置表、35 字元上限、尚未載入詞典
    pub fn with_defaults() -> Result<Self> {
        Self::new(default_schema()?, ShortNameAssembler::new(MAX_SHORT_NAME_LENGTH))
    }

    /// 依配置建立；配置中若指定詞典則一併載入
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let assembler = ShortNameAssembler::new(config.assembly.budget)
            .with_separator(config.assembly.separator.clone());
        let processor = Self::new(config.schema()?, assembler)?
            .with_dictionary_options(config.dictionary.options.clone());

        if let Some(path) = config.dictionary_path() {
            processor.load_dictionary(path)?;
        }

        Ok(processor)
    }

    pub fn with_dictionary_options(mut self, options: DictionaryOptions) -> Self {
        self.dictionary_options = options;
        self
    }

    pub fn schema(&self) -> &PositionSchema {
        &self.schema
    }

    pub fn budget(&self) -> usize {
        self.assembler.budget()
    }

    /// 目前的快照；呼叫端在整個請求期間持有同一份
    pub fn snapshot(&self) -> Arc<EngineSnapshot> {
        match self.state.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn swap(&self, snapshot: EngineSnapshot) {
        let snapshot = Arc::new(snapshot);
        match self.state.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }

    /// 載入新詞典並整份替換；失敗時保留原本的狀態
    pub fn load_dictionary<P: AsRef<Path>>(&self, path: P) -> Result<ProcessorStatus> {
        let dictionary = AbbreviationDictionary::load_with(path, &self.dictionary_options)?;
        self.install_dictionary(dictionary)?;
        Ok(self.status())
    }

    pub fn install_dictionary(&self, dictionary: AbbreviationDictionary) -> Result<()> {
        let snapshot = EngineSnapshot::build(&self.schema, Some(Arc::new(dictionary)))?;
        self.swap(snapshot);
        Ok(())
    }

    pub fn clear_dictionary(&self) -> Result<()> {
        self.swap(EngineSnapshot::build(&self.schema, None)?);
        tracing::info!("Dictionary cleared, abbreviations fall back to original text");
        Ok(())
    }

    pub fn status(&self) -> ProcessorStatus {
        let snapshot = self.snapshot();
        match snapshot.dictionary() {
            Some(dictionary) => ProcessorStatus {
                dictionary_loaded: true,
                dictionary_path: dictionary.source_path().map(|p| p.display().to_string()),
                abbreviation_count: dictionary.size(),
            },
            None => ProcessorStatus {
                dictionary_loaded: false,
                dictionary_path: None,
                abbreviation_count: 0,
            },
        }
    }

    pub fn process_full_description(&self, description: &str) -> Result<ProcessingResult> {
        let snapshot = self.snapshot();
        self.process_with(&snapshot, description)
    }

    /// 擷取 -> 縮寫 -> 組合
    pub fn process_with(
        &self,
        snapshot: &EngineSnapshot,
        description: &str,
    ) -> Result<ProcessingResult> {
        if description.trim().is_empty() {
            return Err(ShortNameError::validation(
                "description is empty or whitespace-only",
            ));
        }

        let extraction = snapshot.extractor.extract(description);
        let mut components = extraction.components;
        let mut messages = extraction.messages;

        let dictionary = snapshot
            .dictionary()
            .map(|d| d as &dyn AbbreviationLookup);
        AbbreviationResolver::new(&self.schema, dictionary, &self.units)
            .resolve(&mut components, &mut messages);

        let assembly = self.assembler.assemble(&components);
        messages.extend(assembly.messages);

        tracing::debug!(
            "'{}' -> '{}' ({} chars, success: {})",
            description,
            assembly.short_name,
            assembly.character_count,
            assembly.success
        );

        Ok(ProcessingResult::new(
            assembly.success,
            description.to_string(),
            assembly.short_name,
            components,
            messages,
        ))
    }

    /// 逐筆處理；單筆失敗記錄在結果中，不中斷批次
    pub fn process_batch<S: AsRef<str>>(&self, descriptions: &[S]) -> BatchReport {
        let snapshot = self.snapshot();
        let results = descriptions
            .iter()
            .map(|description| {
                let description = description.as_ref();
                match self.process_with(&snapshot, description) {
                    Ok(result) => BatchItem::from_result(&result),
                    Err(e) => {
                        tracing::warn!("Batch item failed: {}", e);
                        BatchItem::failed(description, e)
                    }
                }
            })
            .collect();

        BatchReport::new(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::MessageKind;

    fn sample_dictionary() -> AbbreviationDictionary {
        AbbreviationDictionary::from_reader(
            "term,abbreviation\nSolution,Sol\nDextrose,Dex\nBottle,Btl\n".as_bytes(),
            b',',
            "sample.csv",
            &DictionaryOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_reference_description_with_dictionary() {
        let processor = ShortNameProcessor::with_defaults().unwrap();
        processor.install_dictionary(sample_dictionary()).unwrap();

        let result = processor
            .process_full_description("Solution Dextrose 5% 500 milliliters Bottle Viaflex Non-Latex")
            .unwrap();

        assert_eq!(result.short_name(), "Sol Dex 5% 500mL Btl Viaflex");
        assert_eq!(result.character_count(), 28);
        assert!(result.success());
        assert_eq!(
            result.message_texts(),
            vec![
                "no abbreviation found for 'Viaflex', using as-is",
                "no abbreviation found for 'Non-Latex', using as-is",
                "dropped optional field 'special_attribute' to fit character limit",
            ]
        );
    }

    #[test]
    fn test_empty_description_is_rejected() {
        let processor = ShortNameProcessor::with_defaults().unwrap();
        assert!(matches!(
            processor.process_full_description(""),
            Err(ShortNameError::ValidationError { .. })
        ));
        assert!(matches!(
            processor.process_full_description(" \t\n"),
            Err(ShortNameError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_no_dictionary_passes_through() {
        let processor = ShortNameProcessor::with_defaults().unwrap();
        let result = processor
            .process_full_description("Solution Dextrose 5% 500 milliliters Bottle")
            .unwrap();

        assert_eq!(result.short_name(), "Solution Dextrose 5% 500mL Bottle");
        assert!(result.success());
        let misses = result
            .messages()
            .iter()
            .filter(|m| m.kind == MessageKind::NoAbbreviation)
            .count();
        assert_eq!(misses, 3);
    }

    #[test]
    fn test_long_ingredient_keeps_strength() {
        let processor = ShortNameProcessor::with_defaults().unwrap();
        let result = processor
            .process_full_description("Tablet Acetylsalicylic Acid Extended Release Buffered 325 mg")
            .unwrap();

        assert_eq!(result.short_name(), "Tablet Acetylsalicylic Acid E 325mg");
        assert_eq!(result.character_count(), 35);
        assert!(result.success());
        assert!(result.has_message(MessageKind::Truncated));
        assert!(!result.has_message(MessageKind::CannotFitMandatory));
    }

    #[test]
    fn test_failed_load_keeps_previous_dictionary() {
        let processor = ShortNameProcessor::with_defaults().unwrap();
        processor.install_dictionary(sample_dictionary()).unwrap();

        let err = processor.load_dictionary("/nonexistent/dictionary.csv").unwrap_err();
        assert!(matches!(err, ShortNameError::DictionaryLoadError { .. }));

        let status = processor.status();
        assert!(status.dictionary_loaded);
        assert_eq!(status.abbreviation_count, 3);
    }

    #[test]
    fn test_snapshot_survives_swap() {
        let processor = ShortNameProcessor::with_defaults().unwrap();
        processor.install_dictionary(sample_dictionary()).unwrap();

        let captured = processor.snapshot();
        processor.clear_dictionary().unwrap();

        let old = processor.process_with(&captured, "Solution Dextrose 5%").unwrap();
        let new = processor.process_full_description("Solution Dextrose 5%").unwrap();
        assert_eq!(old.short_name(), "Sol Dex 5%");
        assert_eq!(new.short_name(), "Solution Dextrose 5%");
        assert!(!processor.status().dictionary_loaded);
    }

    #[test]
    fn test_batch_tolerates_failures() {
        let processor = ShortNameProcessor::with_defaults().unwrap();
        let report = processor.process_batch(&["Tablet Ibuprofen 200 mg", "", "Cream"]);

        assert_eq!(report.count, 3);
        assert!(report.results[0].success);
        assert!(report.results[1].error.is_some());
        assert!(!report.results[2].success);
        assert!(report.results[2].error.is_none());
    }
}
