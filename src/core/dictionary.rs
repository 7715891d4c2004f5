use crate::domain::model::{normalize_term, AbbreviationEntry};
use crate::domain::ports::AbbreviationLookup;
use crate::utils::error::{Result, ShortNameError};
use crate::utils::validation::validate_file_extension;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

const TERM_HEADERS: &[&str] = &[
    "term",
    "full term",
    "full name",
    "word",
    "description",
    "english",
];
const ABBREVIATION_HEADERS: &[&str] = &[
    "abbreviation",
    "abbr",
    "abbrev",
    "short form",
    "short name",
];
const CATEGORY_HEADERS: &[&str] = &["category", "type", "position"];

/// 類別與欄位名稱的比對鍵；`dosage_form`、`Dosage-Form`、`dosage form` 視為相同
pub fn normalize_label(label: &str) -> String {
    normalize_term(&label.replace(['_', '-'], " "))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// 後出現的列覆蓋先前的列
    #[default]
    Overwrite,
    Reject,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryOptions {
    pub term_column: Option<String>,
    pub abbreviation_column: Option<String>,
    pub category_column: Option<String>,
    pub duplicate_policy: DuplicatePolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    pub rows: usize,
    pub loaded: usize,
    pub skipped: usize,
    pub duplicates: usize,
}

/// 每個檔案建立一次，之後不再變動；重新載入時整份替換
#[derive(Debug, Clone)]
pub struct AbbreviationDictionary {
    entries: BTreeMap<String, AbbreviationEntry>,
    source_path: Option<PathBuf>,
    stats: LoadStats,
}

struct ColumnLayout {
    term: usize,
    abbreviation: usize,
    category: Option<usize>,
}

impl AbbreviationDictionary {
    /// 以預設欄位偵測載入詞典檔
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with(path, &DictionaryOptions::default())
    }

    pub fn load_with<P: AsRef<Path>>(path: P, options: &DictionaryOptions) -> Result<Self> {
        let path = path.as_ref();
        let label = path.display().to_string();

        if !path.exists() {
            return Err(ShortNameError::dictionary_load(&label, "file not found"));
        }

        let extension = validate_file_extension("dictionary.path", path, &["csv", "tsv", "txt"])
            .map_err(|e| ShortNameError::dictionary_load(&label, e.to_string()))?;
        let delimiter = if extension == "csv" { b',' } else { b'\t' };

        let file = File::open(path)
            .map_err(|e| ShortNameError::dictionary_load(&label, format!("cannot read file: {}", e)))?;

        let mut dictionary = Self::from_reader(file, delimiter, &label, options)?;
        dictionary.source_path = Some(path.to_path_buf());

        tracing::info!(
            "📖 Loaded {} abbreviations from {} ({} rows, {} skipped, {} duplicates)",
            dictionary.size(),
            label,
            dictionary.stats.rows,
            dictionary.stats.skipped,
            dictionary.stats.duplicates
        );

        Ok(dictionary)
    }

    /// 從任意來源讀取帶標題列的分隔表格
    pub fn from_reader<R: Read>(
        reader: R,
        delimiter: u8,
        label: &str,
        options: &DictionaryOptions,
    ) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| ShortNameError::dictionary_load(label, format!("cannot read header row: {}", e)))?
            .clone();
        let layout = resolve_columns(&headers, options)
            .map_err(|reason| ShortNameError::dictionary_load(label, reason))?;

        let mut dictionary = Self::empty();

        for (index, record) in csv_reader.records().enumerate() {
            let line = index + 2;
            let record = record.map_err(|e| {
                ShortNameError::dictionary_load(label, format!("malformed row {}: {}", line, e))
            })?;
            dictionary.stats.rows += 1;

            let term = record.get(layout.term).unwrap_or_default();
            let abbreviation = record.get(layout.abbreviation).unwrap_or_default();
            let category = layout
                .category
                .and_then(|i| record.get(i))
                .filter(|c| !c.is_empty())
                .map(str::to_string);

            if term.is_empty() || abbreviation.is_empty() {
                tracing::warn!(
                    "Skipping dictionary row {} in {}: empty term or abbreviation",
                    line,
                    label
                );
                dictionary.stats.skipped += 1;
                continue;
            }

            dictionary
                .insert(term, abbreviation, category, options.duplicate_policy)
                .map_err(|reason| {
                    ShortNameError::dictionary_load(label, format!("row {}: {}", line, reason))
                })?;
        }

        Ok(dictionary)
    }

    /// 由固定對照表建立（例如單位表），空縮寫會被拒絕
    pub fn from_entries<'a, I>(entries: I, policy: DuplicatePolicy) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut dictionary = Self::empty();
        for (term, abbreviation) in entries {
            dictionary.stats.rows += 1;
            if term.trim().is_empty() || abbreviation.trim().is_empty() {
                return Err(ShortNameError::dictionary_load(
                    "<built-in>",
                    format!("entry '{}' has an empty term or abbreviation", term),
                ));
            }
            dictionary
                .insert(term, abbreviation, None, policy)
                .map_err(|reason| ShortNameError::dictionary_load("<built-in>", reason))?;
        }
        Ok(dictionary)
    }

    fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
            source_path: None,
            stats: LoadStats::default(),
        }
    }

    fn insert(
        &mut self,
        term: &str,
        abbreviation: &str,
        category: Option<String>,
        policy: DuplicatePolicy,
    ) -> std::result::Result<(), String> {
        let key = normalize_term(term);
        let entry = AbbreviationEntry {
            term: term.trim().to_string(),
            abbreviation: abbreviation.trim().to_string(),
            category,
        };

        if let Some(previous) = self.entries.get(&key) {
            match policy {
                DuplicatePolicy::Reject => {
                    return Err(format!("duplicate term '{}'", term.trim()));
                }
                DuplicatePolicy::Overwrite => {
                    tracing::debug!(
                        "Duplicate term '{}': '{}' replaces '{}'",
                        key,
                        entry.abbreviation,
                        previous.abbreviation
                    );
                    self.stats.duplicates += 1;
                    self.stats.loaded -= 1;
                }
            }
        }

        self.entries.insert(key, entry);
        self.stats.loaded += 1;
        Ok(())
    }

    pub fn lookup(&self, term: &str) -> Option<&str> {
        self.get(term).map(|entry| entry.abbreviation.as_str())
    }

    pub fn get(&self, term: &str) -> Option<&AbbreviationEntry> {
        self.entries.get(&normalize_term(term))
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn stats(&self) -> LoadStats {
        self.stats
    }

    pub fn entries(&self) -> impl Iterator<Item = &AbbreviationEntry> {
        self.entries.values()
    }

    /// 類別符合的詞彙，供擷取器當作額外關鍵字
    pub fn terms_in_category<'a>(&'a self, category: &str) -> impl Iterator<Item = &'a str> + 'a {
        let wanted = normalize_label(category);
        self.entries
            .values()
            .filter(move |entry| {
                entry
                    .category
                    .as_deref()
                    .is_some_and(|c| normalize_label(c) == wanted)
            })
            .map(|entry| entry.term.as_str())
    }
}

impl AbbreviationLookup for AbbreviationDictionary {
    fn lookup(&self, term: &str) -> Option<&str> {
        AbbreviationDictionary::lookup(self, term)
    }

    fn size(&self) -> usize {
        AbbreviationDictionary::size(self)
    }
}

fn resolve_columns(
    headers: &csv::StringRecord,
    options: &DictionaryOptions,
) -> std::result::Result<ColumnLayout, String> {
    let normalized: Vec<String> = headers
        .iter()
        .map(|h| normalize_label(h.trim_start_matches('\u{feff}')))
        .collect();

    let term = find_column(&normalized, options.term_column.as_deref(), TERM_HEADERS, "term")?;
    let abbreviation = find_column(
        &normalized,
        options.abbreviation_column.as_deref(),
        ABBREVIATION_HEADERS,
        "abbreviation",
    )?;
    let category = find_column(
        &normalized,
        options.category_column.as_deref(),
        CATEGORY_HEADERS,
        "category",
    )?;

    match (term, abbreviation) {
        (Some(term), Some(abbreviation)) if term != abbreviation => Ok(ColumnLayout {
            term,
            abbreviation,
            category,
        }),
        _ => Err(format!(
            "no recognizable term/abbreviation columns in header [{}]",
            headers.iter().collect::<Vec<_>>().join(", ")
        )),
    }
}

/// 有設定欄位名稱時必須找到；否則依候選名稱順序自動偵測
fn find_column(
    normalized: &[String],
    configured: Option<&str>,
    candidates: &[&str],
    what: &str,
) -> std::result::Result<Option<usize>, String> {
    match configured {
        Some(name) => {
            let wanted = normalize_label(name);
            normalized
                .iter()
                .position(|h| *h == wanted)
                .map(Some)
                .ok_or_else(|| format!("{} column '{}' not found", what, name))
        }
        None => Ok(candidates
            .iter()
            .find_map(|candidate| normalized.iter().position(|h| h.as_str() == *candidate))),
    }
}
