use serde::{Deserialize, Serialize};
use std::fmt;

/// 正規化詞彙：去頭尾空白、合併內部空白、轉小寫
pub fn normalize_term(term: &str) -> String {
    term.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 詞典中的一筆縮寫對照
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbbreviationEntry {
    pub term: String,
    pub abbreviation: String,
    /// 對應的位置類別（如 `container`），供擷取時當作辨識提示
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherKind {
    Keywords,
    Patterns,
    Remainder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionDefinition {
    pub position_number: u32,
    pub name: String,
    #[serde(default)]
    pub mandatory: bool,
    pub matcher: MatcherKind,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
    /// 數值加單位的欄位，以單位表壓縮（`500 milliliters` -> `500mL`）
    #[serde(default)]
    pub measure: bool,
    /// 超出字數時的保留權重，數值越低越先被捨棄
    #[serde(default)]
    pub importance: u32,
    #[serde(default)]
    pub hint_category: Option<String>,
}

/// 固定的位置表，依 `position_number` 嚴格遞增排列
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionSchema {
    positions: Vec<PositionDefinition>,
}

impl PositionSchema {
    /// 不做檢查，驗證交給 `Validate`
    pub(crate) fn from_positions(positions: Vec<PositionDefinition>) -> Self {
        Self { positions }
    }

    pub fn positions(&self) -> &[PositionDefinition] {
        &self.positions
    }

    pub fn get(&self, name: &str) -> Option<&PositionDefinition> {
        self.positions.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn mandatory_names(&self) -> impl Iterator<Item = &str> {
        self.positions
            .iter()
            .filter(|p| p.mandatory)
            .map(|p| p.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Component {
    pub position_number: u32,
    pub position_name: String,
    pub original: String,
    pub value: String,
    pub mandatory: bool,
}

impl Component {
    pub fn new(definition: &PositionDefinition, original: impl Into<String>) -> Self {
        Self {
            position_number: definition.position_number,
            position_name: definition.name.clone(),
            original: original.into(),
            value: String::new(),
            mandatory: definition.mandatory,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    MissingMandatory,
    NoAbbreviation,
    DroppedOptional,
    Truncated,
    CannotFitMandatory,
}

/// 結構化的處理訊息，只在輸出邊界才轉成文字
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub kind: MessageKind,
    pub position_name: String,
    pub detail: String,
}

impl Message {
    pub fn missing_mandatory(position_name: &str) -> Self {
        Self::new(MessageKind::MissingMandatory, position_name, "")
    }

    pub fn no_abbreviation(position_name: &str, original: &str) -> Self {
        Self::new(MessageKind::NoAbbreviation, position_name, original)
    }

    pub fn dropped_optional(position_name: &str) -> Self {
        Self::new(MessageKind::DroppedOptional, position_name, "")
    }

    pub fn truncated(position_name: &str, kept: &str) -> Self {
        Self::new(MessageKind::Truncated, position_name, kept)
    }

    pub fn cannot_fit_mandatory(position_name: &str) -> Self {
        Self::new(MessageKind::CannotFitMandatory, position_name, "")
    }

    fn new(kind: MessageKind, position_name: &str, detail: &str) -> Self {
        Self {
            kind,
            position_name: position_name.to_string(),
            detail: detail.to_string(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MessageKind::MissingMandatory => {
                write!(f, "missing mandatory field: {}", self.position_name)
            }
            MessageKind::NoAbbreviation => {
                write!(f, "no abbreviation found for '{}', using as-is", self.detail)
            }
            MessageKind::DroppedOptional => write!(
                f,
                "dropped optional field '{}' to fit character limit",
                self.position_name
            ),
            MessageKind::Truncated => write!(
                f,
                "truncated field '{}' to fit character limit",
                self.position_name
            ),
            MessageKind::CannotFitMandatory => write!(
                f,
                "cannot fit mandatory field '{}' within character limit",
                self.position_name
            ),
        }
    }
}

/// 單次處理的最終結果，建立後不可變更
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessingResult {
    success: bool,
    original: String,
    short_name: String,
    character_count: usize,
    components: Vec<Component>,
    messages: Vec<Message>,
}

impl ProcessingResult {
    pub(crate) fn new(
        success: bool,
        original: String,
        short_name: String,
        components: Vec<Component>,
        messages: Vec<Message>,
    ) -> Self {
        let character_count = short_name.chars().count();
        Self {
            success,
            original,
            short_name,
            character_count,
            components,
            messages,
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn character_count(&self) -> usize {
        self.character_count
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message_texts(&self) -> Vec<String> {
        self.messages.iter().map(ToString::to_string).collect()
    }

    pub fn has_message(&self, kind: MessageKind) -> bool {
        self.messages.iter().any(|m| m.kind == kind)
    }
}

/// 批次處理中單筆描述的摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    pub original: String,
    pub short_name: String,
    pub success: bool,
    pub character_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchItem {
    pub fn from_result(result: &ProcessingResult) -> Self {
        Self {
            original: result.original().to_string(),
            short_name: result.short_name().to_string(),
            success: result.success(),
            character_count: result.character_count(),
            error: None,
        }
    }

    pub fn failed(original: &str, error: impl ToString) -> Self {
        Self {
            original: original.to_string(),
            short_name: String::new(),
            success: false,
            character_count: 0,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub count: usize,
    pub succeeded: usize,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub results: Vec<BatchItem>,
}

impl BatchReport {
    pub fn new(results: Vec<BatchItem>) -> Self {
        Self {
            count: results.len(),
            succeeded: results.iter().filter(|r| r.success).count(),
            generated_at: chrono::Utc::now(),
            results,
        }
    }
}
